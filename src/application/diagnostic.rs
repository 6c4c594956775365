//! One-shot group listing.
//!
//! Opens a session, lists every group the account participates in and closes
//! the session again. Used to find the identifier to put in `target_group`.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::ResourceSnapshot;
use crate::error::{Error, Result};
use crate::port::{SessionEvent, SessionStream};

/// Connect, wait for the handshake and list groups.
///
/// # Errors
///
/// Any close before the session opens is fatal here: there is no reconnect.
/// Returns [`Error::HandshakeTimeout`] if the session does not open within
/// `handshake_timeout`.
pub async fn list_groups<S: SessionStream>(
    stream: &mut S,
    handshake_timeout: Duration,
) -> Result<Vec<ResourceSnapshot>> {
    info!(transport = stream.transport_name(), "Connecting");
    stream.connect().await?;

    timeout(handshake_timeout, wait_for_open(stream))
        .await
        .map_err(|_| Error::HandshakeTimeout {
            secs: handshake_timeout.as_secs(),
        })??;

    let client = stream.client();
    let groups = client.list_resources().await?;
    info!(groups = groups.len(), "Fetched groups");

    if let Err(e) = client.close().await {
        debug!(error = %e, "Session close failed");
    }
    Ok(groups)
}

async fn wait_for_open<S: SessionStream>(stream: &mut S) -> Result<()> {
    loop {
        match stream.next_event().await {
            Some(SessionEvent::Open) => return Ok(()),
            Some(SessionEvent::Closed {
                reason,
                logged_out: true,
            }) => return Err(Error::LoggedOut { reason }),
            Some(SessionEvent::Closed { reason, .. }) => return Err(Error::Connection(reason)),
            Some(SessionEvent::PairingCode(code)) => {
                warn!(code = %code, "Session needs pairing; scan the code from a linked device");
            }
            Some(SessionEvent::Connecting | SessionEvent::ResourceUpdates(_)) => {}
            None => {
                return Err(Error::Connection(
                    "session ended before the handshake completed".into(),
                ))
            }
        }
    }
}
