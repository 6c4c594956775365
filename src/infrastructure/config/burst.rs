//! Burst configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::BurstRequest;

/// What the burst sends and how hard it retries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BurstConfig {
    /// Message body sent by every action.
    #[serde(default = "default_payload")]
    pub payload: String,
    /// Number of messages per burst.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Stagger between consecutive actions (milliseconds).
    #[serde(default)]
    pub inter_action_delay_ms: u64,
    /// Attempts per action, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts of the same action (milliseconds).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_payload() -> String {
    "🔥".to_string()
}

const fn default_count() -> u32 {
    5
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_backoff_ms() -> u64 {
    15
}

impl BurstConfig {
    /// Build the immutable request fired on every trigger.
    #[must_use]
    pub fn request(&self) -> BurstRequest {
        BurstRequest {
            count: self.count,
            payload: self.payload.as_str().into(),
            per_action_delay: Duration::from_millis(self.inter_action_delay_ms),
            max_retries: self.max_retries,
        }
    }

    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            payload: default_payload(),
            count: default_count(),
            inter_action_delay_ms: 0,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}
