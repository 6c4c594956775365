//! Composition root for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::bridge::BridgeSession;
use crate::adapter::outbound::credentials::FileCredentialStore;
use crate::application::monitor::{Monitor, MonitorSettings};
use crate::infrastructure::config::settings::Config;
use crate::port::CredentialStore;

/// Build the credential store for the configured auth directory.
pub fn build_credential_store(config: &Config) -> Arc<dyn CredentialStore> {
    Arc::new(FileCredentialStore::new(config.connection.auth_dir.clone()))
}

/// Build a bridge session with file-backed credentials.
pub fn build_session(config: &Config) -> BridgeSession {
    let credentials = build_credential_store(config);
    info!(
        bridge = %config.connection.bridge_url,
        credentials = %credentials.location(),
        "Session configured"
    );
    BridgeSession::new(&config.connection, credentials)
}

/// Build a monitor over a fresh bridge session.
pub fn build_monitor(config: &Config) -> Monitor<BridgeSession> {
    Monitor::new(build_session(config), MonitorSettings::from_config(config))
}
