//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use std::time::Duration;

use crate::application::monitor::MonitorSettings;
use crate::domain::{BurstRequest, GroupId};
use crate::infrastructure::config::connection::ReconnectionConfig;

/// The fixed two-second reconnect policy used in production.
pub fn reconnection() -> ReconnectionConfig {
    ReconnectionConfig {
        initial_delay_ms: 2000,
        max_delay_ms: 2000,
        backoff_multiplier: 1.0,
    }
}

/// Burst of `count` fire emojis with no spacing and three attempts each.
pub fn burst(count: u32) -> BurstRequest {
    BurstRequest {
        count,
        payload: "🔥".into(),
        per_action_delay: Duration::ZERO,
        max_retries: 3,
    }
}

/// Monitor settings for `target` with a `count`-message burst.
pub fn monitor_settings(target: &str, count: u32) -> MonitorSettings {
    MonitorSettings {
        target: GroupId::from(target),
        burst: burst(count),
        retry_backoff: Duration::from_millis(15),
        keepalive_interval: Duration::from_secs(45),
        reconnection: reconnection(),
    }
}

/// Minimal valid TOML for config parsing tests.
pub const MINIMAL_TOML: &str = r#"target_group = "120363025246125486@g.us""#;
