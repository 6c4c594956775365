//! Miette-based error diagnostics for CLI error presentation.
//!
//! Renders configuration errors with the offending TOML snippet, and fatal
//! runtime errors with the operator's next step.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::error::{ConfigError, Error};

/// Configuration error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(floodgate::config))]
pub struct ConfigDiagnostic {
    /// Human-readable error message.
    pub message: String,

    /// The configuration file.
    #[source_code]
    pub src: NamedSource<String>,

    /// Byte offset and length of the problematic region.
    #[label("here")]
    pub span: Option<SourceSpan>,

    /// Optional help text with suggestions for fixing the error.
    #[help]
    pub help: Option<String>,
}

impl ConfigDiagnostic {
    /// Build a diagnostic for `err` raised while loading `content` from `name`.
    ///
    /// TOML syntax errors point at the reported span; validation errors point
    /// at the first line mentioning the offending key, when there is one.
    #[must_use]
    pub fn new(name: &str, content: &str, err: &ConfigError) -> Self {
        let span = match err {
            ConfigError::Parse(parse) => parse
                .span()
                .map(|range| SourceSpan::from((range.start, range.end.saturating_sub(range.start)))),
            ConfigError::InvalidValue { field, .. } | ConfigError::MissingField { field } => {
                locate_key(content, field)
            }
            _ => None,
        };
        let help = match err {
            ConfigError::MissingField { field: "target_group" } => Some(
                "set target_group, or run `floodgate groups` to find the identifier".to_string(),
            ),
            ConfigError::InvalidValue { .. } => {
                Some("see config.toml.example for accepted values".to_string())
            }
            _ => None,
        };

        Self {
            message: err.to_string(),
            src: NamedSource::new(name, content.to_string()),
            span,
            help,
        }
    }
}

/// Byte span of the first `key =` assignment in `content`.
fn locate_key(content: &str, key: &str) -> Option<SourceSpan> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(key) {
            if rest.trim_start().starts_with('=') {
                let start = offset + (line.len() - trimmed.len());
                return Some((start, key.len()).into());
            }
        }
        offset += line.len();
    }
    None
}

/// Fatal runtime error with remediation help.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(floodgate::fatal))]
pub struct FatalDiagnostic {
    pub message: String,

    #[help]
    pub help: Option<String>,
}

impl From<&Error> for FatalDiagnostic {
    fn from(err: &Error) -> Self {
        Self {
            message: err.to_string(),
            help: err.remediation().map(str::to_string),
        }
    }
}
