//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::CachedUserStore;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The first sweep runs one full `interval` after launch. The task exits once
/// `shutdown` is cancelled; a sweep already running is allowed to finish, but
/// no further tick is taken after cancellation is observed.
///
/// # Arguments
/// * `cache` - shared reference to the cached user store
/// * `interval` - time between sweeps; must be non-zero
/// * `shutdown` - cancellation signal that stops the task
///
/// # Returns
/// A JoinHandle that completes when the sweeper has stopped.
///
/// # Example
/// ```ignore
/// let shutdown = CancellationToken::new();
/// let sweeper = spawn_sweeper(cache.clone(), Duration::from_secs(60), shutdown.clone());
/// // Later, during shutdown:
/// shutdown.cancel();
/// sweeper.await?;
/// ```
pub fn spawn_sweeper(
    cache: Arc<CachedUserStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache expiry sweeper with interval of {} seconds",
            interval.as_secs_f64()
        );

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = cache.cleanup_expired().await;
                    if removed == 0 {
                        debug!("Cache sweep: no expired entries found");
                    }
                }
            }
        }

        info!("Cache expiry sweeper stopped");
    })
}
