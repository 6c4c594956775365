//! Mock session implementations for testing.
//!
//! - [`RecordingClient`] - In-memory [`SessionClient`] that records every
//!   request and can be told to fail or to add latency.
//!
//! - [`ScriptedSession`] - [`SessionStream`] with one scripted event list per
//!   connection attempt. Best for: lifecycle, reconnect and seeding logic.
//!
//! - [`ChannelSession`] - Channel-backed stream with external control handle.
//!   Best for: integration tests needing on-demand event delivery.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::domain::{GroupId, ResourceSnapshot};
use crate::error::{Error, Result};
use crate::port::{SessionClient, SessionEvent, SessionStream};

// ---------------------------------------------------------------------------
// RecordingClient
// ---------------------------------------------------------------------------

/// How `send_action` should fail.
#[derive(Debug, Clone, Copy)]
enum SendFailure {
    Never,
    Always,
    /// Fail the first `n` calls across all callers.
    First(u32),
}

/// A [`SessionClient`] that records requests instead of talking to a network.
pub struct RecordingClient {
    snapshot: Mutex<Option<ResourceSnapshot>>,
    fetch_error: Mutex<Option<String>>,
    groups: Vec<ResourceSnapshot>,
    send_failure: SendFailure,
    fail_pings: bool,
    latency: Duration,
    sent: Mutex<Vec<(GroupId, String)>>,
    send_attempts: AtomicU32,
    ping_count: AtomicU32,
    fetch_count: AtomicU32,
    close_count: AtomicU32,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(None),
            fetch_error: Mutex::new(None),
            groups: Vec::new(),
            send_failure: SendFailure::Never,
            fail_pings: false,
            latency: Duration::ZERO,
            sent: Mutex::new(Vec::new()),
            send_attempts: AtomicU32::new(0),
            ping_count: AtomicU32::new(0),
            fetch_count: AtomicU32::new(0),
            close_count: AtomicU32::new(0),
        }
    }

    /// Report the fetched group as restricted or open.
    pub fn with_snapshot(self, restricted: bool) -> Self {
        *self.snapshot.lock() = Some(snapshot("target@g.us", "Target", restricted));
        self
    }

    /// Make `fetch_resource` fail with the given reason.
    pub fn failing_fetch(self, reason: &str) -> Self {
        *self.fetch_error.lock() = Some(reason.to_string());
        self
    }

    /// Groups returned by `list_resources`.
    pub fn with_groups(mut self, groups: Vec<ResourceSnapshot>) -> Self {
        self.groups = groups;
        self
    }

    pub fn failing_always(mut self) -> Self {
        self.send_failure = SendFailure::Always;
        self
    }

    /// Fail the first `n` sends, counted across all concurrent actions.
    pub fn failing_first(mut self, n: u32) -> Self {
        self.send_failure = SendFailure::First(n);
        self
    }

    pub fn failing_pings(mut self) -> Self {
        self.fail_pings = true;
        self
    }

    /// Delay every send by `latency` (tokio time, so it respects a paused clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Change what later fetches report.
    pub fn set_restricted(&self, restricted: bool) {
        let mut guard = self.snapshot.lock();
        match guard.as_mut() {
            Some(snapshot) => snapshot.restricted = restricted,
            None => *guard = Some(snapshot("target@g.us", "Target", restricted)),
        }
    }

    /// Messages that were accepted, in completion order.
    pub fn sent(&self) -> Vec<(GroupId, String)> {
        self.sent.lock().clone()
    }

    pub fn send_attempts(&self) -> u32 {
        self.send_attempts.load(Ordering::SeqCst)
    }

    pub fn ping_count(&self) -> u32 {
        self.ping_count.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> u32 {
        self.close_count.load(Ordering::SeqCst)
    }
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionClient for RecordingClient {
    async fn fetch_resource(&self, id: &GroupId) -> Result<ResourceSnapshot> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fetch_error.lock().clone() {
            return Err(Error::Session {
                method: "group_metadata".into(),
                reason,
            });
        }

        let restricted = self.snapshot.lock().as_ref().map_or(true, |s| s.restricted);
        Ok(snapshot(id.as_str(), "Target", restricted))
    }

    async fn list_resources(&self) -> Result<Vec<ResourceSnapshot>> {
        Ok(self.groups.clone())
    }

    async fn send_action(&self, id: &GroupId, payload: &str) -> Result<()> {
        let attempt = self.send_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let fail = match self.send_failure {
            SendFailure::Never => false,
            SendFailure::Always => true,
            SendFailure::First(n) => attempt <= n,
        };
        if fail {
            return Err(Error::Connection(format!("send {attempt} rejected")));
        }

        self.sent.lock().push((id.clone(), payload.to_string()));
        Ok(())
    }

    async fn send_ping(&self, _id: &GroupId) -> Result<()> {
        self.ping_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_pings {
            return Err(Error::Timeout {
                operation: "send_presence_update".into(),
                after_ms: 10,
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build a [`ResourceSnapshot`] with a fixed member count.
pub fn snapshot(id: &str, name: &str, restricted: bool) -> ResourceSnapshot {
    ResourceSnapshot {
        id: GroupId::from(id),
        display_name: name.to_string(),
        restricted,
        member_count: 42,
    }
}

// ---------------------------------------------------------------------------
// ScriptedSession
// ---------------------------------------------------------------------------

/// A mock session with one event script per connection attempt.
///
/// Each `connect()` pops the next connect result (default `Ok(())`) and the
/// next script; on success the script's events are queued for `next_event`.
/// Once the queue is drained `next_event` blocks forever, unless
/// [`ending_after_script`](Self::ending_after_script) was set, in which case
/// it returns `None`.
pub struct ScriptedSession {
    client: Arc<RecordingClient>,
    connect_results: VecDeque<Result<()>>,
    scripts: VecDeque<Vec<SessionEvent>>,
    queued: VecDeque<SessionEvent>,
    end_when_drained: bool,
    connect_count: Arc<AtomicU32>,
    connect_times: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedSession {
    pub fn new(client: Arc<RecordingClient>) -> Self {
        Self {
            client,
            connect_results: VecDeque::new(),
            scripts: VecDeque::new(),
            queued: VecDeque::new(),
            end_when_drained: false,
            connect_count: Arc::new(AtomicU32::new(0)),
            connect_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append the events delivered after the next connection attempt.
    pub fn with_connection(mut self, events: Vec<SessionEvent>) -> Self {
        self.scripts.push_back(events);
        self
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    /// Return `None` from `next_event` once the current script is drained.
    pub fn ending_after_script(mut self) -> Self {
        self.end_when_drained = true;
        self
    }

    /// Shared counter of `connect()` calls.
    pub fn connect_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.connect_count)
    }

    /// Shared log of when each `connect()` happened.
    pub fn connect_times(&self) -> Arc<Mutex<Vec<Instant>>> {
        Arc::clone(&self.connect_times)
    }
}

#[async_trait]
impl SessionStream for ScriptedSession {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_times.lock().push(Instant::now());

        let script = self.scripts.pop_front().unwrap_or_default();
        let result = self.connect_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.queued.clear();
            self.queued.extend(script);
        }
        result
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }
        if self.end_when_drained {
            return None;
        }
        std::future::pending().await
    }

    fn client(&self) -> Arc<dyn SessionClient> {
        self.client.clone()
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// ChannelSession
// ---------------------------------------------------------------------------

/// A mock session controlled externally via a [`ChannelSessionHandle`].
pub struct ChannelSession {
    client: Arc<RecordingClient>,
    event_rx: mpsc::Receiver<Option<SessionEvent>>,
    connect_count: Arc<AtomicU32>,
}

/// Control handle for a [`ChannelSession`].
pub struct ChannelSessionHandle {
    event_tx: mpsc::Sender<Option<SessionEvent>>,
    connect_count: Arc<AtomicU32>,
}

impl ChannelSessionHandle {
    /// Deliver an event to the session's consumer.
    pub async fn send(&self, event: SessionEvent) {
        let _ = self.event_tx.send(Some(event)).await;
    }

    /// Signal end-of-stream (causes `next_event` to return `None`).
    pub async fn end(&self) {
        let _ = self.event_tx.send(None).await;
    }

    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }
}

/// Create a [`ChannelSession`] and its control [`ChannelSessionHandle`].
pub fn channel_session(
    client: Arc<RecordingClient>,
    buffer: usize,
) -> (ChannelSession, ChannelSessionHandle) {
    let (tx, rx) = mpsc::channel(buffer);
    let connects = Arc::new(AtomicU32::new(0));
    (
        ChannelSession {
            client,
            event_rx: rx,
            connect_count: connects.clone(),
        },
        ChannelSessionHandle {
            event_tx: tx,
            connect_count: connects,
        },
    )
}

#[async_trait]
impl SessionStream for ChannelSession {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        match self.event_rx.recv().await {
            Some(Some(event)) => Some(event),
            Some(None) | None => None,
        }
    }

    fn client(&self) -> Arc<dyn SessionClient> {
        self.client.clone()
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}
