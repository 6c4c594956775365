//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file, with the target group overridable
//! through the `FLOODGATE_TARGET_GROUP` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use floodgate::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::burst::BurstConfig;
use super::connection::{ConnectionConfig, ReconnectionConfig};
use super::logging::LoggingConfig;
use crate::domain::GroupId;
use crate::error::{ConfigError, Result};

/// Environment variable that overrides `target_group`.
pub const TARGET_GROUP_ENV: &str = "FLOODGATE_TARGET_GROUP";

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Identifier of the group to watch and send into.
    #[serde(default)]
    pub target_group: String,

    /// Burst payload, size and retry policy.
    #[serde(default)]
    pub burst: BurstConfig,

    /// Session bridge connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Delay policy after a dropped session.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails (e.g., a zero burst count)
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config = Self::parse_toml_without_target(content)?;
        config.validate_target()?;
        Ok(config)
    }

    /// Parse configuration without requiring `target_group`.
    ///
    /// Used by group discovery, which runs before a target is known.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or any other setting is
    /// invalid.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_without_target(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(target) = std::env::var(TARGET_GROUP_ENV) {
            if !target.trim().is_empty() {
                config.target_group = target.trim().to_string();
            }
        }

        config.validate_settings()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges. Call again after applying CLI overrides.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        self.validate_target()?;
        self.validate_settings()
    }

    #[allow(clippy::result_large_err)]
    fn validate_target(&self) -> Result<()> {
        if self.target_group.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "target_group",
            }
            .into());
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_settings(&self) -> Result<()> {
        let burst = &self.burst;
        if burst.payload.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "payload",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if burst.count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "count",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if burst.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_retries",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let connection = &self.connection;
        let url = url::Url::parse(&connection.bridge_url).map_err(|e| {
            ConfigError::InvalidValue {
                field: "bridge_url",
                reason: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidValue {
                field: "bridge_url",
                reason: format!("scheme must be ws or wss, got {}", url.scheme()),
            }
            .into());
        }
        if connection.keepalive_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "keepalive_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if connection.handshake_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "handshake_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if connection.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.reconnection.initial_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_delay_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.reconnection.max_delay_ms < self.reconnection.initial_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "max_delay_ms",
                reason: "must be >= initial_delay_ms".to_string(),
            }
            .into());
        }
        if self.reconnection.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "backoff_multiplier",
                reason: "must be >= 1.0".to_string(),
            }
            .into());
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: "must be \"pretty\" or \"json\"".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// The configured target as a typed identifier.
    #[must_use]
    pub fn target(&self) -> GroupId {
        GroupId::new(self.target_group.trim())
    }

    /// Render the effective configuration, defaults applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Other(format!("failed to render config: {e}")).into())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
