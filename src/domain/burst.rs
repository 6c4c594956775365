//! Burst request and outcome types.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// What to fire when the group opens. Built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstRequest {
    /// Number of messages in the burst.
    pub count: u32,
    /// Message body sent by every action.
    pub payload: Arc<str>,
    /// Stagger step: action `i` waits `per_action_delay * i` before its first attempt.
    pub per_action_delay: Duration,
    /// Total attempts allowed per action, including the first.
    pub max_retries: u32,
}

/// Terminal outcome of one action within a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pub index: u32,
    pub succeeded: bool,
    pub attempts_used: u32,
}

/// Aggregate of one burst.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstResult {
    pub sent_count: u32,
    pub total_count: u32,
    /// Total attempts across all actions, retries included.
    pub attempts: u32,
    /// Wall-clock time from dispatch start to the last action finishing.
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

impl BurstResult {
    /// Aggregate per-action outcomes into a result.
    #[must_use]
    pub fn from_outcomes(total_count: u32, outcomes: &[ActionOutcome], elapsed: Duration) -> Self {
        let sent_count = outcomes.iter().filter(|o| o.succeeded).count() as u32;
        let attempts = outcomes.iter().map(|o| o.attempts_used).sum();
        Self {
            sent_count,
            total_count,
            attempts,
            elapsed,
            finished_at: Utc::now(),
        }
    }

    /// Elapsed time in fractional milliseconds.
    #[must_use]
    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.sent_count == self.total_count
    }
}
