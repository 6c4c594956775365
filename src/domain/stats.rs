//! Burst statistics snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time copy of the burst statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub bursts_fired: u64,
    /// Most recent burst latencies in milliseconds, oldest first.
    pub recent_latencies_ms: Vec<f64>,
    /// Mean of `recent_latencies_ms`, zero before the first burst.
    pub average_latency_ms: f64,
    pub messages_sent: u64,
    pub messages_attempted: u64,
    /// Edges that arrived while a burst was still in flight.
    pub triggers_coalesced: u64,
    pub last_burst_at: Option<DateTime<Utc>>,
}
