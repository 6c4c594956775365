//! Interactive setup wizard.
//!
//! Walks through the target group, the burst and the bridge address, then
//! writes a documented configuration file.

use std::fs;
use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::adapter::inbound::cli::{output, paths};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;

/// Default config template used by the setup wizard.
pub const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Answers collected by the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answers {
    pub target_group: String,
    pub payload: String,
    pub count: u32,
    pub inter_action_delay_ms: u64,
    pub bridge_url: String,
    pub auth_dir: String,
}

/// Run the interactive setup wizard.
pub fn execute(path: &Path, force: bool) -> Result<()> {
    if output::is_json() {
        return Err(ConfigError::InvalidValue {
            field: "json",
            reason: "`floodgate init` is interactive; copy config.toml.example for scripted setup"
                .to_string(),
        }
        .into());
    }

    let theme = ColorfulTheme::default();

    if path.exists() && !force {
        output::warning(&format!("{} already exists", path.display()));
        let overwrite = Confirm::with_theme(&theme)
            .with_prompt("Overwrite it?")
            .default(false)
            .interact()?;
        if !overwrite {
            output::note("Setup aborted.");
            return Ok(());
        }
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::note("Let's get you set up.");

    output::section("Target");
    output::note("Leave empty if you don't know it yet; `floodgate groups` lists them.");
    let target_group: String = Input::with_theme(&theme)
        .with_prompt("Group identifier")
        .allow_empty(true)
        .interact_text()?;

    output::section("Burst");
    let payload: String = Input::with_theme(&theme)
        .with_prompt("Message")
        .default("🔥".to_string())
        .interact_text()?;
    let count: u32 = Input::with_theme(&theme)
        .with_prompt("Messages per burst")
        .default(5)
        .validate_with(|n: &u32| if *n > 0 { Ok(()) } else { Err("must be at least 1") })
        .interact_text()?;
    let inter_action_delay_ms: u64 = Input::with_theme(&theme)
        .with_prompt("Milliseconds between messages")
        .default(0)
        .interact_text()?;

    output::section("Session");
    let bridge_url: String = Input::with_theme(&theme)
        .with_prompt("Bridge URL")
        .default("ws://127.0.0.1:8765".to_string())
        .interact_text()?;
    let auth_dir: String = Input::with_theme(&theme)
        .with_prompt("Credentials directory")
        .default(paths::default_auth_dir().display().to_string())
        .interact_text()?;

    let answers = Answers {
        target_group: target_group.trim().to_string(),
        payload,
        count,
        inter_action_delay_ms,
        bridge_url,
        auth_dir,
    };
    write_config(path, &answers)?;

    output::section("Done");
    output::success("Created configuration file");
    output::field("Path", path.display());
    if answers.target_group.is_empty() {
        output::note(&format!(
            "Next: floodgate groups -c {}, then set target_group",
            path.display()
        ));
    } else {
        output::note(&format!("Next: floodgate run -c {}", path.display()));
    }
    Ok(())
}

/// Render the answers into the template and write it to `path`.
pub fn write_config(path: &Path, answers: &Answers) -> Result<()> {
    let content = render(answers);
    Config::parse_toml_without_target(&content)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn render(answers: &Answers) -> String {
    let quoted = |value: &str| toml::Value::String(value.to_string()).to_string();
    let replacements = [
        ("target_group", quoted(&answers.target_group)),
        ("payload", quoted(&answers.payload)),
        ("count", answers.count.to_string()),
        (
            "inter_action_delay_ms",
            answers.inter_action_delay_ms.to_string(),
        ),
        ("bridge_url", quoted(&answers.bridge_url)),
        ("auth_dir", quoted(&answers.auth_dir)),
    ];

    let mut out = String::with_capacity(CONFIG_TEMPLATE.len());
    for line in CONFIG_TEMPLATE.lines() {
        let replacement = replacements.iter().find(|(key, _)| {
            line.strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        });
        match replacement {
            Some((key, value)) => out.push_str(&format!("{key} = {value}")),
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers() -> Answers {
        Answers {
            target_group: "120363@g.us".into(),
            payload: "go \"now\"".into(),
            count: 8,
            inter_action_delay_ms: 20,
            bridge_url: "ws://10.0.0.2:9000".into(),
            auth_dir: "/var/lib/floodgate/auth".into(),
        }
    }

    #[test]
    fn template_parses_without_target() {
        let config = Config::parse_toml_without_target(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.burst.count, 5);
        assert!(config.target_group.is_empty());
    }

    #[test]
    fn rendered_answers_round_trip() {
        let config = Config::parse_toml(&render(&answers())).unwrap();

        assert_eq!(config.target_group, "120363@g.us");
        assert_eq!(config.burst.payload, "go \"now\"");
        assert_eq!(config.burst.count, 8);
        assert_eq!(config.burst.inter_action_delay_ms, 20);
        assert_eq!(config.connection.bridge_url, "ws://10.0.0.2:9000");
        assert_eq!(
            config.connection.auth_dir,
            std::path::PathBuf::from("/var/lib/floodgate/auth")
        );
        assert_eq!(config.burst.max_retries, 3);
    }

    #[test]
    fn rendering_keeps_comments() {
        let rendered = render(&answers());
        assert!(rendered.contains("# Messages per burst."));
    }

    #[test]
    fn write_config_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        write_config(&path, &answers()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn invalid_answers_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let bad = Answers {
            bridge_url: "http://nope".into(),
            ..answers()
        };
        assert!(write_config(&path, &bad).is_err());
        assert!(!path.exists());
    }
}
