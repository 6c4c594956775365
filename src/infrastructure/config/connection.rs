//! Session connection and reconnection configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session bridge connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// WebSocket URL of the session bridge.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// Directory holding persisted session credentials.
    #[serde(default = "default_auth_dir")]
    pub auth_dir: PathBuf,
    /// Interval between keep-alive pings while connected (seconds).
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
    /// How long one-shot commands wait for the session to open (seconds).
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
    /// Upper bound on a single session request (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Browser triple announced to the session (name, client, version).
    #[serde(default = "default_browser")]
    pub browser: [String; 3],
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:8765".to_string()
}

fn default_auth_dir() -> PathBuf {
    PathBuf::from("auth")
}

const fn default_keepalive_interval_secs() -> u64 {
    45
}

const fn default_handshake_timeout_secs() -> u64 {
    60
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_browser() -> [String; 3] {
    [
        "Floodgate".to_string(),
        "Chrome".to_string(),
        "1.0.0".to_string(),
    ]
}

impl ConnectionConfig {
    #[must_use]
    pub const fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            auth_dir: default_auth_dir(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            browser: default_browser(),
        }
    }
}

/// Session reconnection configuration.
///
/// The defaults give a fixed two second delay between a dropped session and
/// the next attempt. A multiplier above 1.0 turns it into exponential backoff
/// capped at `max_delay_ms`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconnectionConfig {
    /// Delay before the first reconnection attempt (milliseconds).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt that fails to open.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

const fn default_initial_delay_ms() -> u64 {
    2000
}

const fn default_max_delay_ms() -> u64 {
    2000
}

const fn default_backoff_multiplier() -> f64 {
    1.0
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}
