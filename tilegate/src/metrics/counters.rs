//! Lock-free request counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::MetricsSnapshot;

/// Process-wide request counters.
///
/// - `requests`: every inbound tile request, including malformed and
///   out-of-bounds ones
/// - `hits`: requests answered from the cache, positive or negative
/// - `misses`: requests answered by a successful upstream fetch
///
/// Rejected and failed requests deliberately count in neither `hits` nor
/// `misses`.
#[derive(Debug, Default)]
pub struct ProxyMetrics {
    requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProxyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an inbound tile request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache hit (positive or negative).
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache miss resolved by a successful upstream fetch.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
