//! Cache Statistics Module
//!
//! Observability hooks for hits, misses and evictions. The decorator receives
//! a sink at construction, so tests can observe or ignore the signals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// == Metrics Sink ==
/// Fire-and-forget observability hooks. Implementations must not block.
pub trait CacheMetrics: Send + Sync {
    fn record_hit(&self);
    fn record_miss(&self);
    fn record_evictions(&self, count: u64);
}

/// Sink that discards every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    fn record_hit(&self) {}
    fn record_miss(&self) {}
    fn record_evictions(&self, _count: u64) {}
}

/// Forwards every signal to each inner sink, in order.
#[derive(Clone, Default)]
pub struct FanoutMetrics {
    sinks: Vec<Arc<dyn CacheMetrics>>,
}

impl FanoutMetrics {
    pub fn new(sinks: Vec<Arc<dyn CacheMetrics>>) -> Self {
        Self { sinks }
    }
}

impl CacheMetrics for FanoutMetrics {
    fn record_hit(&self) {
        self.sinks.iter().for_each(|sink| sink.record_hit());
    }

    fn record_miss(&self) {
        self.sinks.iter().for_each(|sink| sink.record_miss());
    }

    fn record_evictions(&self, count: u64) {
        self.sinks.iter().for_each(|sink| sink.record_evictions(count));
    }
}

// == Cache Stats ==
/// Lock-free counters backing the `/stats` endpoint.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Number of reads served from the cache
    pub hits: u64,
    /// Number of reads that fell through to the entity store
    pub misses: u64,
    /// Number of entries removed by expiry sweeps
    pub evictions: u64,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }
}
