//! Rolling burst statistics.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::domain::{BurstResult, Stats};

/// Maximum number of burst latencies to retain.
pub const LATENCY_WINDOW: usize = 10;

/// Accumulates burst results into [`Stats`].
///
/// Keeps a sliding window of the most recent latencies and the running mean
/// over that window.
#[derive(Debug, Default)]
pub struct StatsTracker {
    bursts_fired: u64,
    recent: VecDeque<f64>,
    average_ms: f64,
    messages_sent: u64,
    messages_attempted: u64,
    triggers_coalesced: u64,
    last_burst_at: Option<DateTime<Utc>>,
}

impl StatsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            recent: VecDeque::with_capacity(LATENCY_WINDOW + 1),
            ..Self::default()
        }
    }

    /// Fold one burst into the statistics.
    pub fn record(&mut self, result: &BurstResult) {
        self.bursts_fired += 1;
        self.messages_sent += u64::from(result.sent_count);
        self.messages_attempted += u64::from(result.total_count);
        self.last_burst_at = Some(result.finished_at);

        self.recent.push_back(result.elapsed_millis());
        // Trim to window
        while self.recent.len() > LATENCY_WINDOW {
            self.recent.pop_front();
        }
        self.average_ms = self.recent.iter().sum::<f64>() / self.recent.len() as f64;
    }

    /// Count an edge that was folded into an in-flight burst.
    pub fn record_coalesced(&mut self) {
        self.triggers_coalesced += 1;
    }

    #[must_use]
    pub const fn bursts_fired(&self) -> u64 {
        self.bursts_fired
    }

    #[must_use]
    pub const fn average_latency_ms(&self) -> f64 {
        self.average_ms
    }

    /// Copy of the current statistics.
    #[must_use]
    pub fn snapshot(&self) -> Stats {
        Stats {
            bursts_fired: self.bursts_fired,
            recent_latencies_ms: self.recent.iter().copied().collect(),
            average_latency_ms: self.average_ms,
            messages_sent: self.messages_sent,
            messages_attempted: self.messages_attempted,
            triggers_coalesced: self.triggers_coalesced,
            last_burst_at: self.last_burst_at,
        }
    }
}
