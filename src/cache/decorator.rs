//! Cached User Store
//!
//! Read-through, write-through cache in front of any `UserStore`. Reads are
//! served from the TTL store when possible; misses are coalesced per id so only
//! one entity-store load is in flight for a given user. Page queries are
//! coalesced per `(limit, offset)` but never cached.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{CacheMetrics, Singleflight, TtlStore};
use crate::error::Result;
use crate::models::{NewUser, User};
use crate::repository::UserStore;

// == Cached User Store ==
pub struct CachedUserStore {
    repo: Arc<dyn UserStore>,
    users: Arc<TtlStore>,
    loads: Singleflight<String, User>,
    pages: Singleflight<String, Vec<User>>,
    metrics: Arc<dyn CacheMetrics>,
}

impl CachedUserStore {
    // == Constructor ==
    /// Wraps `repo` with an empty cache whose entries live for `ttl`.
    pub fn new(
        repo: Arc<dyn UserStore>,
        ttl: std::time::Duration,
        metrics: Arc<dyn CacheMetrics>,
    ) -> Self {
        Self {
            repo,
            users: Arc::new(TtlStore::new(ttl)),
            loads: Singleflight::new(),
            pages: Singleflight::new(),
            metrics,
        }
    }

    // == Cleanup Expired ==
    /// Removes every entry that has expired by now and records the evictions.
    ///
    /// Returns the number of entries removed. Safe to call at any time.
    pub async fn cleanup_expired(&self) -> usize {
        let removed = self.users.sweep(Instant::now()).await;
        if removed > 0 {
            self.metrics.record_evictions(removed as u64);
            info!(removed, "expired users evicted from cache");
        }
        removed
    }

    /// Number of entries currently held, including expired ones not yet swept.
    pub async fn cached_entries(&self) -> usize {
        self.users.len().await
    }
}

fn page_key(limit: i64, offset: i64) -> String {
    format!("list:{}:{}", limit, offset)
}

#[async_trait]
impl UserStore for CachedUserStore {
    async fn create(&self, user: NewUser) -> Result<String> {
        let id = self.repo.create(user.clone()).await?;
        self.users.put(user.with_id(id.clone())).await;
        debug!(user_id = %id, "created user cached");
        Ok(id)
    }

    /// Read-through lookup: a fresh entry is a hit, anything else is a miss
    /// that joins or starts the single load for `id`.
    ///
    /// A load is not ordered against writes. If `delete(id)` completes while a
    /// load for `id` is still in flight, the load caches the row it read and
    /// that stale user is served until its TTL runs out.
    async fn get(&self, id: &str) -> Result<User> {
        if let Some(user) = self.users.get(id).await {
            self.metrics.record_hit();
            debug!(user_id = %id, "cache hit");
            return Ok(user);
        }

        self.metrics.record_miss();
        debug!(user_id = %id, "cache miss, loading from store");

        let repo = Arc::clone(&self.repo);
        let users = Arc::clone(&self.users);
        let key = id.to_string();
        self.loads
            .run(key.clone(), move || async move {
                let user = repo.get(&key).await?;
                users.put(user.clone()).await;
                debug!(user_id = %key, "loaded from store");
                Ok(user)
            })
            .await
    }

    async fn update(&self, user: &User) -> Result<()> {
        self.repo.update(user).await?;
        self.users.put(user.clone()).await;
        debug!(user_id = %user.id, "cache refreshed after update");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete(id).await?;
        self.users.remove(id).await;
        debug!(user_id = %id, "cache entry dropped after delete");
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let repo = Arc::clone(&self.repo);
        self.pages
            .run(page_key(limit, offset), move || async move {
                repo.list(limit, offset).await
            })
            .await
    }
}
