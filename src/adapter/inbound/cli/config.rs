//! Handler for the `config` command group and shared config loading.

use std::fs;
use std::path::Path;

use crate::adapter::inbound::cli::diagnostic::ConfigDiagnostic;
use crate::adapter::inbound::cli::output;
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::settings::Config;

/// Load a configuration that must name a target group.
///
/// Parse and validation failures are rendered against the file content
/// before the error is returned.
pub fn load(path: &Path) -> Result<Config> {
    load_with(path, Config::parse_toml)
}

/// Load a configuration that may omit the target group.
pub fn load_without_target(path: &Path) -> Result<Config> {
    load_with(path, Config::parse_toml_without_target)
}

fn load_with(path: &Path, parse: impl FnOnce(&str) -> Result<Config>) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(ConfigError::Other(format!(
            "cannot read {}: {e}",
            path.display()
        )))
    })?;

    match parse(&content) {
        Ok(config) => Ok(config),
        Err(Error::Config(err)) => {
            report(path, &content, &err);
            Err(ConfigError::Other(format!("invalid configuration in {}", path.display())).into())
        }
        Err(e) => Err(e),
    }
}

fn report(path: &Path, content: &str, err: &ConfigError) {
    if output::is_json() {
        output::error(&err.to_string());
        return;
    }
    let diagnostic = ConfigDiagnostic::new(&path.display().to_string(), content, err);
    eprintln!("{:?}", miette::Report::new(diagnostic));
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = load_without_target(path)?;

    if output::is_json() {
        output::field("config", config.to_toml()?);
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("Path", path.display());
    output::lines(&config.to_toml()?);
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    output::section("Config Validation");
    output::field("Path", path.display());

    let config = load(path)?;
    output::success("Config file is valid");
    output::field("Target", config.target());
    output::field(
        "Burst",
        format!(
            "{} x {:?}, {}ms apart, {} attempts each",
            config.burst.count,
            config.burst.payload,
            config.burst.inter_action_delay_ms,
            config.burst.max_retries
        ),
    );
    output::field("Bridge", &config.connection.bridge_url);

    if !config.connection.auth_dir.exists() {
        output::warning(&format!(
            "no credentials in {}; the first run will need pairing",
            config.connection.auth_dir.display()
        ));
    }

    output::field("Next", format!("floodgate run -c {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_accepts_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "target_group = \"1@g.us\"\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.target().as_str(), "1@g.us");
    }

    #[test]
    fn load_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "target_group = \"1@g.us\"\n[burst]\ncount = 0\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn load_without_target_accepts_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[burst]\ncount = 3\n").unwrap();

        assert!(load(&path).is_err());
        assert_eq!(load_without_target(&path).unwrap().burst.count, 3);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load(Path::new("/nonexistent/floodgate.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
