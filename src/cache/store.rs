//! TTL Store Module
//!
//! Concurrency-safe map from user id to cached user with per-entry expiry.
//! Readers share the lock; `put`, `remove` and `sweep` take it exclusively.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::CacheEntry;
use crate::models::User;

// == TTL Store ==
/// Expiring user storage. None of the operations can fail.
#[derive(Debug)]
pub struct TtlStore {
    /// Id to entry mapping
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Lifetime given to every inserted entry
    ttl: Duration,
}

impl TtlStore {
    // == Constructor ==
    /// Creates an empty store whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    // == Put ==
    /// Stores or replaces the entry for `user.id` with a fresh expiry.
    pub async fn put(&self, user: User) {
        let entry = CacheEntry::new(user, Instant::now(), self.ttl);
        let mut entries = self.entries.write().await;
        entries.insert(entry.user.id.clone(), entry);
    }

    // == Get ==
    /// Returns the user only if present and not yet expired.
    ///
    /// Expired entries that the sweeper has not reached are reported as absent
    /// and left in place for the next sweep.
    pub async fn get(&self, id: &str) -> Option<User> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|entry| !entry.is_expired_at(Instant::now()))
            .map(|entry| entry.user.clone())
    }

    // == Remove ==
    /// Drops the entry for `id`; no-op when absent.
    pub async fn remove(&self, id: &str) {
        self.entries.write().await.remove(id);
    }

    // == Sweep ==
    /// Removes every entry whose expiry is at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
