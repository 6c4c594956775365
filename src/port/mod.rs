//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Available Ports
//!
//! - [`SessionStream`], [`SessionClient`] - Messaging session integration
//! - [`CredentialStore`] - Persistence for rotated session credentials

pub mod outbound;

pub use outbound::credentials::CredentialStore;
pub use outbound::session::{SessionClient, SessionEvent, SessionStream};
