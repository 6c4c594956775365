use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    /// The session accepted a request but reported it as failed.
    #[error("session rejected {method}: {reason}")]
    Session { method: String, reason: String },

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("session logged out: {reason}")]
    LoggedOut { reason: String },

    #[error("cannot access target group {identifier}: {reason}")]
    ResourceUnavailable { identifier: String, reason: String },

    #[error("session did not open within {secs}s")]
    HandshakeTimeout { secs: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for the failures that must stop the process instead of being
    /// recovered locally.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LoggedOut { .. } | Self::ResourceUnavailable { .. } | Self::HandshakeTimeout { .. }
        )
    }

    /// Operator-facing instructions for fixing a fatal failure.
    #[must_use]
    pub const fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::LoggedOut { .. } => Some(
                "credentials are invalid or were revoked; delete the auth directory and pair the device again",
            ),
            Self::ResourceUnavailable { .. } => Some(
                "check target_group in your config; run `floodgate groups` to list the groups this account can see",
            ),
            Self::HandshakeTimeout { .. } => Some(
                "make sure the session bridge is running and the device is paired",
            ),
            Self::Config(_) => Some("run `floodgate config validate` for details"),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}
