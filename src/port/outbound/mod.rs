//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the messaging session and the storage for its
//! credentials.

pub mod credentials;
pub mod session;
