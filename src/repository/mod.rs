//! Entity Store Module
//!
//! The `UserStore` trait is the seam between the cache and durable storage.
//! Implementations report a missing user as `Error::NotFound` and any
//! connectivity or I/O problem as `Error::Store`.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewUser, User};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// CRUD operations over users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user and returns the id the store assigned to it.
    async fn create(&self, user: NewUser) -> Result<String>;

    /// Loads a user by id.
    async fn get(&self, id: &str) -> Result<User>;

    /// Replaces name and age of an existing user.
    async fn update(&self, user: &User) -> Result<()>;

    /// Deletes a user by id.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Returns one page of users ordered by id.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
}
