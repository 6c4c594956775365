//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`session`] - Mock [`SessionStream`](crate::port::SessionStream) and
//!   [`SessionClient`](crate::port::SessionClient) implementations.
//! - [`config`] - Canonical test configurations (reconnection, bursts, monitor).

pub mod config;
pub mod session;
