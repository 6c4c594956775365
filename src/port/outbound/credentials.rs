//! Credential persistence slot.
//!
//! Session credentials are opaque to the monitor. The session adapter loads
//! them before its handshake and hands rotated credentials back for storage.

use serde_json::Value;

use crate::error::Error;

/// Storage for opaque session credentials.
pub trait CredentialStore: Send + Sync {
    /// Previously persisted credentials, if any.
    fn load(&self) -> Result<Option<Value>, Error>;

    /// Persist rotated credentials.
    fn persist(&self, creds: &Value) -> Result<(), Error>;

    /// Where credentials live, for operator messages.
    fn location(&self) -> String;
}
