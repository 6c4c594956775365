//! Outbound adapters (driven side).

pub mod bridge;
pub mod credentials;
