//! The monitor loop.
//!
//! A [`Monitor`] is the single consumer of a session's events. It drives the
//! [`ConnectionManager`] through connects and reconnects, seeds and feeds the
//! [`ChangeDetector`], launches bursts on qualifying edges and folds their
//! results into the [`StatsTracker`]. Every piece of mutable state is owned
//! here, so independent monitors never share anything.
//!
//! # Overlapping triggers
//!
//! At most one burst is in flight. An edge that arrives while a burst is
//! still running is logged and counted as coalesced instead of starting a
//! second burst.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::burst::BurstEngine;
use super::connection::{CloseAction, ConnectionManager, ConnectionState};
use super::detector::{ChangeDetector, Transition};
use super::stats::StatsTracker;
use crate::domain::{BurstRequest, BurstResult, GroupId, ResourceUpdate, Stats};
use crate::error::{Error, Result};
use crate::infrastructure::config::connection::ReconnectionConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::{SessionClient, SessionEvent, SessionStream};

/// Everything a monitor needs besides its session.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub target: GroupId,
    pub burst: BurstRequest,
    pub retry_backoff: Duration,
    pub keepalive_interval: Duration,
    pub reconnection: ReconnectionConfig,
}

impl MonitorSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            target: config.target(),
            burst: config.burst.request(),
            retry_backoff: config.burst.retry_backoff(),
            keepalive_interval: config.connection.keepalive_interval(),
            reconnection: config.reconnection.clone(),
        }
    }
}

/// Final state of a monitor once its loop stops.
#[derive(Debug)]
pub struct MonitorReport {
    pub stats: Stats,
    pub state: ConnectionState,
    pub reconnects: u64,
    /// Fatal error that stopped the loop; `None` after a requested shutdown.
    pub error: Option<Error>,
}

impl MonitorReport {
    /// Split off the fatal error, if any.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the monitor.
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// Watches one group over one session and fires bursts when it opens.
pub struct Monitor<S: SessionStream> {
    stream: S,
    client: Arc<dyn SessionClient>,
    settings: MonitorSettings,
    connection: ConnectionManager,
    detector: ChangeDetector,
    stats: StatsTracker,
    engine: BurstEngine,
    /// False once the stream reported end-of-events; reset on each attempt.
    stream_live: bool,
    reconnect_at: Option<Instant>,
    /// Next keep-alive, scheduled from the moment the session opened.
    keepalive_at: Option<Instant>,
    in_flight: Option<JoinHandle<()>>,
    completions_tx: mpsc::UnboundedSender<BurstResult>,
    completions_rx: mpsc::UnboundedReceiver<BurstResult>,
}

impl<S: SessionStream> Monitor<S> {
    pub fn new(stream: S, settings: MonitorSettings) -> Self {
        let client = stream.client();
        let engine = BurstEngine::new(
            Arc::clone(&client),
            settings.target.clone(),
            settings.retry_backoff,
        );
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            stream,
            client,
            connection: ConnectionManager::new(settings.reconnection.clone()),
            detector: ChangeDetector::new(settings.target.clone()),
            stats: StatsTracker::new(),
            engine,
            settings,
            stream_live: false,
            reconnect_at: None,
            keepalive_at: None,
            in_flight: None,
            completions_tx,
            completions_rx,
        }
    }

    /// Run until `shutdown` resolves or a fatal error occurs.
    ///
    /// The report always carries the final statistics. Its `error` is
    /// [`Error::LoggedOut`] when the session's credentials are no longer valid
    /// and [`Error::ResourceUnavailable`] when the target group cannot be read
    /// after connecting. Every other failure is recovered locally.
    pub async fn run<F>(mut self, shutdown: F) -> MonitorReport
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            group = %self.settings.target,
            count = self.settings.burst.count,
            payload = %self.settings.burst.payload,
            spacing_ms = self.settings.burst.per_action_delay.as_millis() as u64,
            "Monitor starting"
        );

        let mut outcome = self.start_attempt().await;
        while outcome.is_ok() {
            let reconnect_at = self.reconnect_at;
            let keepalive_at = self.keepalive_at.filter(|_| self.connection.is_open());
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                Some(result) = self.completions_rx.recv() => self.finish_burst(result),
                event = self.stream.next_event(), if self.stream_live => {
                    outcome = self.handle_event(event).await;
                }
                () = sleep_until_deadline(reconnect_at), if reconnect_at.is_some() => {
                    self.reconnect_at = None;
                    outcome = self.start_attempt().await;
                }
                () = sleep_until_deadline(keepalive_at), if keepalive_at.is_some() => {
                    self.keepalive_at = Some(Instant::now() + self.settings.keepalive_interval);
                    self.send_keepalive();
                }
            }
        }

        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        let mut report = self.report();
        info!(
            bursts = report.stats.bursts_fired,
            sent = report.stats.messages_sent,
            avg_ms = report.stats.average_latency_ms,
            reconnects = report.reconnects,
            "Monitor stopped"
        );
        report.error = outcome.err();
        report
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    fn report(&self) -> MonitorReport {
        MonitorReport {
            stats: self.stats.snapshot(),
            state: self.connection.state(),
            reconnects: self.connection.reconnects_scheduled(),
            error: None,
        }
    }

    async fn start_attempt(&mut self) -> Result<()> {
        if !self.connection.begin_attempt() {
            return Ok(());
        }

        info!(transport = self.stream.transport_name(), "Connecting");
        self.stream_live = true;
        if let Err(e) = self.stream.connect().await {
            warn!(error = %e, "Connection attempt failed");
            return self.handle_closed(&e.to_string(), false);
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: Option<SessionEvent>) -> Result<()> {
        match event {
            None => {
                self.stream_live = false;
                self.handle_closed("session event stream ended", false)
            }
            Some(SessionEvent::Connecting) => {
                debug!("Session connecting");
                Ok(())
            }
            Some(SessionEvent::Open) => self.handle_open().await,
            Some(SessionEvent::Closed { reason, logged_out }) => {
                self.handle_closed(&reason, logged_out)
            }
            Some(SessionEvent::ResourceUpdates(updates)) => {
                self.handle_updates(&updates);
                Ok(())
            }
            Some(SessionEvent::PairingCode(code)) => {
                warn!(code = %code, "Session needs pairing; scan the code from a linked device");
                Ok(())
            }
        }
    }

    async fn handle_open(&mut self) -> Result<()> {
        if !self.connection.on_open() {
            return Ok(());
        }
        info!("Connected and ready");
        self.keepalive_at = Some(Instant::now() + self.settings.keepalive_interval);

        let target = &self.settings.target;
        let snapshot = self.client.fetch_resource(target).await.map_err(|e| {
            Error::ResourceUnavailable {
                identifier: target.to_string(),
                reason: e.to_string(),
            }
        })?;

        info!(
            group = %snapshot.id,
            name = %snapshot.display_name,
            members = snapshot.member_count,
            status = snapshot.status_label(),
            "Target group"
        );

        match self.detector.seed(snapshot.restricted) {
            Transition::Opened => {
                info!("Group is already open, firing immediately");
                self.trigger_burst();
            }
            _ => info!(
                count = self.settings.burst.count,
                "Armed; waiting for admins to open the group"
            ),
        }
        Ok(())
    }

    fn handle_closed(&mut self, reason: &str, logged_out: bool) -> Result<()> {
        self.keepalive_at = None;
        match self.connection.on_closed(reason, logged_out) {
            CloseAction::Reconnect { after } => {
                self.reconnect_at = Some(Instant::now() + after);
                Ok(())
            }
            CloseAction::Terminate => Err(Error::LoggedOut {
                reason: reason.to_string(),
            }),
            CloseAction::Ignore => Ok(()),
        }
    }

    fn handle_updates(&mut self, updates: &[ResourceUpdate]) {
        debug!(updates = updates.len(), "Received group updates");
        for _ in 0..self.detector.observe_batch(updates) {
            self.trigger_burst();
        }
    }

    fn trigger_burst(&mut self) {
        if !self.connection.is_open() {
            warn!(state = ?self.connection.state(), "Session not open, skipping burst");
            return;
        }
        if self
            .in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            warn!("Burst already in flight, coalescing trigger");
            self.stats.record_coalesced();
            return;
        }

        let engine = self.engine.clone();
        let request = self.settings.burst.clone();
        let completions = self.completions_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = engine.fire(&request).await;
            let _ = completions.send(result);
        }));
    }

    fn finish_burst(&mut self, result: BurstResult) {
        self.in_flight = None;
        self.stats.record(&result);
        info!(
            sent = result.sent_count,
            total = result.total_count,
            elapsed_ms = result.elapsed_millis(),
            "Messages sent"
        );
        info!(
            bursts = self.stats.bursts_fired(),
            avg_ms = self.stats.average_latency_ms(),
            "Burst statistics"
        );
    }

    fn send_keepalive(&self) {
        let client = Arc::clone(&self.client);
        let target = self.settings.target.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send_ping(&target).await {
                debug!(error = %e, "Keep-alive failed");
            }
        });
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
