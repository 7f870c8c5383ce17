//! Point-in-time counter snapshot.

use serde::Serialize;

/// A point-in-time copy of the proxy counters.
///
/// Serializes to the stats wire format:
/// `{"requests": N, "hit": N, "miss": N}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    #[serde(rename = "hit")]
    pub hits: u64,
    #[serde(rename = "miss")]
    pub misses: u64,
}
