//! Cache Module
//!
//! Read-through TTL cache for users: the expiring store, the load coalescer,
//! the metrics sink and the decorator that composes them over a `UserStore`.

mod decorator;
mod entry;
mod singleflight;
mod stats;
mod store;


// Re-export public types
pub use decorator::CachedUserStore;
pub use entry::CacheEntry;
pub use singleflight::Singleflight;
pub use stats::{CacheMetrics, CacheStats, FanoutMetrics, NoopMetrics, StatsSnapshot};
pub use store::TtlStore;
