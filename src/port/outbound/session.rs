//! Session port for the messaging service.
//!
//! The messaging protocol, its cryptography and device pairing live behind
//! these traits. The monitor only sees lifecycle events, group updates and a
//! handful of request/response operations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{GroupId, ResourceSnapshot, ResourceUpdate};
use crate::error::Error;

/// Events pushed by a session, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A connection attempt started.
    Connecting,
    /// Handshake finished; requests may be issued.
    Open,
    /// Connection closed.
    Closed {
        /// Human-readable close reason.
        reason: String,
        /// True when the session was logged out or its credentials revoked.
        logged_out: bool,
    },
    /// One delivery of group changes. Apply in order.
    ResourceUpdates(Vec<ResourceUpdate>),
    /// The session needs pairing; the code must be scanned out of band.
    PairingCode(String),
}

impl SessionEvent {
    /// Non-terminal close with the given reason.
    pub fn dropped(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
            logged_out: false,
        }
    }
}

/// Event side of a session.
///
/// `connect` starts a connection attempt; the outcome is reported through
/// [`SessionEvent::Open`] or [`SessionEvent::Closed`] on `next_event`. The same
/// stream instance is reused across reconnects.
#[async_trait]
pub trait SessionStream: Send {
    /// Start a new connection attempt.
    async fn connect(&mut self) -> Result<(), Error>;

    /// Receive the next session event.
    ///
    /// Returns `None` when the stream can no longer produce events.
    async fn next_event(&mut self) -> Option<SessionEvent>;

    /// Request handle bound to this session.
    fn client(&self) -> Arc<dyn SessionClient>;

    /// Transport name for logging/debugging.
    fn transport_name(&self) -> &'static str;
}

/// Request side of a session. Shared across concurrent burst tasks.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Fetch the current state of one group.
    async fn fetch_resource(&self, id: &GroupId) -> Result<ResourceSnapshot, Error>;

    /// List every group the account participates in.
    async fn list_resources(&self) -> Result<Vec<ResourceSnapshot>, Error>;

    /// Send a text message into a group.
    async fn send_action(&self, id: &GroupId, payload: &str) -> Result<(), Error>;

    /// Best-effort keep-alive (a "composing" presence update).
    async fn send_ping(&self, id: &GroupId) -> Result<(), Error>;

    /// End the session gracefully.
    async fn close(&self) -> Result<(), Error>;
}
