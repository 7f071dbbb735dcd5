//! Singleflight Module
//!
//! Coalesces concurrent loads of the same key into one call. The first caller
//! for a key spawns the load as a detached task and registers a shared handle
//! to its outcome; later callers for that key await the same handle instead of
//! issuing their own load.
//!
//! The registry entry is removed by a guard owned by the load task, so it is
//! released when the loader returns `Ok`, returns `Err` or panics. Dropping a
//! waiter (including the one that started the load) never aborts the load.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::{Error, Result};

type SharedLoad<T> = Shared<BoxFuture<'static, Result<T>>>;
type Registry<K, T> = Arc<Mutex<HashMap<K, SharedLoad<T>>>>;

// == Singleflight ==
/// Registry of in-flight loads keyed by `K`.
pub struct Singleflight<K, T> {
    calls: Registry<K, T>,
}

impl<K, T> Default for Singleflight<K, T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T> Singleflight<K, T>
where
    K: Hash + Eq + Clone + std::fmt::Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `loader` unless a load for `key` is already in flight, in which
    /// case the caller waits for that load and receives its outcome.
    ///
    /// A panicking loader is reported to every waiter as `Error::InvalidState`.
    pub async fn run<F, Fut>(&self, key: K, loader: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let existing = self.calls.lock().get(&key).cloned();
        if let Some(load) = existing {
            debug!(?key, "joining in-flight load");
            return load.await;
        }

        let fut = loader();
        let load = match self.calls.lock().entry(key) {
            // Lost the race between the two lock scopes; `fut` was never polled.
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                let load = spawn_load(Arc::clone(&self.calls), vacant.key().clone(), fut);
                vacant.insert(load.clone());
                load
            }
        };

        load.await
    }

    /// Number of keys with a load currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

fn spawn_load<K, T, Fut>(calls: Registry<K, T>, key: K, fut: Fut) -> SharedLoad<T>
where
    K: Hash + Eq + std::fmt::Debug + Send + 'static,
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let _guard = InFlightGuard { calls, key };
        fut.await
    });

    async move {
        match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                error!(error = %join_err, "coalesced load did not complete");
                Err(Error::InvalidState(format!("load task failed: {}", join_err)))
            }
        }
    }
    .boxed()
    .shared()
}

/// Clears the registry entry when the load task finishes or unwinds.
struct InFlightGuard<K: Hash + Eq, T> {
    calls: Registry<K, T>,
    key: K,
}

impl<K: Hash + Eq, T> Drop for InFlightGuard<K, T> {
    fn drop(&mut self) {
        self.calls.lock().remove(&self.key);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;
    use tokio::time::{sleep, timeout};

    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        value: u32,
        delay: Duration,
    ) -> impl Future<Output = Result<u32>> + Send + 'static {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(delay).await;
            Ok(value)
        }
    }

    async fn exploding_loader() -> Result<u32> {
        panic!("loader exploded")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_load() {
        let flight = Arc::new(Singleflight::<String, u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..50 {
            let flight = flight.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run("key".to_string(), || {
                        counting_loader(&calls, 7, Duration::from_millis(100))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_is_shared_and_marker_cleared() {
        let flight = Singleflight::<&'static str, u32>::new();

        let first = flight
            .run("key", || async { Err::<u32, _>(Error::Store("connection reset".into())) })
            .await;
        assert_eq!(first, Err(Error::Store("connection reset".into())));
        assert_eq!(flight.in_flight(), 0);

        let retry = flight.run("key", || async { Ok(1) }).await;
        assert_eq!(retry, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_loader_releases_marker() {
        let flight = Singleflight::<&'static str, u32>::new();

        let result = flight.run("key", exploding_loader).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert_eq!(flight.in_flight(), 0);

        assert_eq!(flight.run("key", || async { Ok(2) }).await, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_leader_does_not_abort_load() {
        let flight = Singleflight::<&'static str, u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let leader = timeout(
            Duration::from_millis(10),
            flight.run("key", || counting_loader(&calls, 7, Duration::from_millis(100))),
        )
        .await;
        assert!(leader.is_err(), "leader should have timed out");
        assert_eq!(flight.in_flight(), 1);

        // Joins the load the cancelled leader started instead of running its own
        let follower = flight
            .run("key", || counting_loader(&calls, 99, Duration::ZERO))
            .await;
        assert_eq!(follower, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_do_not_block_each_other() {
        let flight = Arc::new(Singleflight::<&'static str, u32>::new());
        let release = Arc::new(Notify::new());

        let slow = {
            let flight = flight.clone();
            let release = release.clone();
            tokio::spawn(async move {
                flight
                    .run("slow", move || async move {
                        release.notified().await;
                        Ok(1)
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let fast = flight.run("fast", || async { Ok(2) }).await;
        assert_eq!(fast, Ok(2));
        assert_eq!(flight.in_flight(), 1);

        release.notify_one();
        assert_eq!(slow.await.unwrap(), Ok(1));
    }
}
