//! User Cache - a user CRUD service with a read-through TTL cache
//!
//! Reads are served from an expiring in-memory cache with per-key request
//! coalescing; writes go through to the entity store first.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod tasks;
pub mod telemetry;

pub use api::AppState;
pub use cache::CachedUserStore;
pub use config::Config;
pub use error::{Error, Result};
pub use tasks::spawn_sweeper;
