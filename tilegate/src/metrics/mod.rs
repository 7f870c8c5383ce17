//! Request counters for observability and the stats endpoint.
//!
//! Uses lock-free atomic counters so concurrent request handlers can record
//! events without synchronization, with a point-in-time snapshot for the
//! stats endpoint:
//!
//! ```text
//! Request handlers ─────► ProxyMetrics ─────► MetricsSnapshot ─────► /stats
//!                         (atomic counters)   (point-in-time copy)
//! ```
//!
//! Counters are process-wide and reset on restart; there is no persistence.

mod counters;
mod snapshot;

pub use counters::ProxyMetrics;
pub use snapshot::MetricsSnapshot;
