//! Cache Entry Module
//!
//! Defines a cached user snapshot with its absolute expiry instant.

use std::time::Duration;

use tokio::time::Instant;

use crate::models::User;

// == Cache Entry ==
/// A single cached user. Entries are never mutated; a refresh replaces the
/// whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached user
    pub user: User,
    /// Instant after which the entry must not be served
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(user: User, now: Instant, ttl: Duration) -> Self {
        Self {
            user,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: the entry is expired once `now` reaches the expiry
    /// instant, so it is valid only while `now < expires_at`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
