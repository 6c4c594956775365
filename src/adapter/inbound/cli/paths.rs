//! Path utilities for floodgate.
//!
//! All data lives under `~/.floodgate/`:
//! - `~/.floodgate/config.toml` - main configuration

use std::path::PathBuf;

/// Returns the floodgate home directory (`~/.floodgate/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".floodgate")
}

/// Returns the default config file path (`~/.floodgate/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default credentials directory (`~/.floodgate/auth/`).
pub fn default_auth_dir() -> PathBuf {
    home_dir().join("auth")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_floodgate_home() {
        assert!(home_dir().to_string_lossy().contains(".floodgate"));
        assert!(default_config().to_string_lossy().contains(".floodgate"));
        assert!(default_auth_dir().ends_with("auth"));
    }
}
