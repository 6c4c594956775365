//! Session bridge adapter.
//!
//! Implements the session ports over a JSON WebSocket protocol spoken by a
//! companion process that holds the messaging session.

pub mod protocol;
pub mod session;

pub use session::{BridgeClient, BridgeSession};
