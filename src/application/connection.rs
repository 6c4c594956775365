//! Session lifecycle state machine.
//!
//! [`ConnectionManager`] decides what happens after each lifecycle signal from
//! the session: whether a new connection attempt may start, whether a close is
//! recoverable, and how long to wait before reconnecting. It performs no I/O;
//! the monitor loop drives the session and feeds the signals in.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::infrastructure::config::connection::ReconnectionConfig;

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No attempt has been made yet.
    Disconnected,
    /// An attempt is in progress.
    Connecting,
    /// Handshake complete; requests may be issued.
    Open,
    /// Dropped for a recoverable reason; a reconnect is scheduled.
    ClosedRetryable,
    /// Logged out. No further transitions.
    ClosedTerminal,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ClosedTerminal)
    }
}

/// What the driver must do after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Start a new attempt once the delay has elapsed.
    Reconnect { after: Duration },
    /// Stop; credentials must be re-established out of band.
    Terminate,
    /// Nothing was open or connecting; the close is a duplicate.
    Ignore,
}

/// Owns [`ConnectionState`] and the reconnection policy.
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    config: ReconnectionConfig,
    /// Delay for the next scheduled reconnect, in milliseconds.
    current_delay_ms: u64,
    /// Attempts that closed before reaching `Open`.
    consecutive_failures: u32,
    reconnects_scheduled: u64,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(config: ReconnectionConfig) -> Self {
        let initial_delay = config.initial_delay_ms;
        Self {
            state: ConnectionState::Disconnected,
            config,
            current_delay_ms: initial_delay,
            consecutive_failures: 0,
            reconnects_scheduled: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, ConnectionState::Open)
    }

    /// Number of reconnects scheduled over the manager's lifetime.
    #[must_use]
    pub const fn reconnects_scheduled(&self) -> u64 {
        self.reconnects_scheduled
    }

    /// Claim the right to start a connection attempt.
    ///
    /// Returns `false` while an attempt is already connecting or open, and
    /// after a terminal close. Callers must not connect when this is `false`.
    pub fn begin_attempt(&mut self) -> bool {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::ClosedRetryable => {
                self.state = ConnectionState::Connecting;
                debug!("Connection attempt started");
                true
            }
            ConnectionState::Connecting | ConnectionState::Open => {
                debug!(state = ?self.state, "Connection attempt already in progress, skipping");
                false
            }
            ConnectionState::ClosedTerminal => false,
        }
    }

    /// Record a completed handshake.
    ///
    /// Returns `true` when this moved the session to `Open`. An open signal
    /// without a pending attempt is ignored.
    pub fn on_open(&mut self) -> bool {
        match self.state {
            ConnectionState::Connecting => {
                self.state = ConnectionState::Open;
                self.reset_backoff();
                true
            }
            ConnectionState::Open => false,
            other => {
                warn!(state = ?other, "Ignoring open signal without a pending attempt");
                false
            }
        }
    }

    /// Record a close and decide how to recover.
    pub fn on_closed(&mut self, reason: &str, logged_out: bool) -> CloseAction {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {}
            ConnectionState::Disconnected
            | ConnectionState::ClosedRetryable
            | ConnectionState::ClosedTerminal => {
                debug!(state = ?self.state, reason, "Ignoring close outside an attempt");
                return CloseAction::Ignore;
            }
        }

        if logged_out {
            self.state = ConnectionState::ClosedTerminal;
            error!(reason, "Session logged out, not reconnecting");
            return CloseAction::Terminate;
        }

        if self.state == ConnectionState::Connecting {
            self.consecutive_failures += 1;
        }
        self.state = ConnectionState::ClosedRetryable;
        let after = self.next_delay();
        self.reconnects_scheduled += 1;
        info!(
            reason,
            delay_ms = after.as_millis() as u64,
            attempt = self.consecutive_failures + 1,
            "Connection lost, reconnecting after delay"
        );
        CloseAction::Reconnect { after }
    }

    /// Reset backoff state after a successful handshake.
    fn reset_backoff(&mut self) {
        self.consecutive_failures = 0;
        self.current_delay_ms = self.config.initial_delay_ms;
    }

    /// Return the current delay and advance it for the next call.
    fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_millis(self.current_delay_ms);

        let next_delay = (self.current_delay_ms as f64 * self.config.backoff_multiplier) as u64;
        self.current_delay_ms = next_delay.min(self.config.max_delay_ms);

        delay
    }
}
