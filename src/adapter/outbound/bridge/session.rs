//! WebSocket session bridge.
//!
//! The messaging protocol itself (end-to-end encryption, device pairing,
//! binary framing) is run by a companion bridge process that holds the real
//! session. This adapter talks to it over a local WebSocket:
//!
//! 1. **Connect**: open the socket and send `hello` with persisted credentials
//! 2. **Read loop**: a spawned task turns bridge frames into [`SessionEvent`]s,
//!    resolves pending requests and persists rotated credentials
//! 3. **Requests**: [`BridgeClient`] sends `request` frames and waits for the
//!    matching `response` up to the configured timeout
//!
//! Each `connect()` starts a new generation. A read loop from an earlier
//! generation never emits events, so a stale socket cannot report a close
//! for the current connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::protocol::{
    parse_group_listing, BridgeFrame, ClientFrame, GroupMetadataDto, ResponseFrame,
    METHOD_END, METHOD_GROUP_METADATA, METHOD_LIST_GROUPS, METHOD_SEND_MESSAGE,
    METHOD_SEND_PRESENCE,
};
use crate::domain::{GroupId, ResourceSnapshot, ResourceUpdate};
use crate::error::{Error, Result};
use crate::infrastructure::config::connection::ConnectionConfig;
use crate::port::{CredentialStore, SessionClient, SessionEvent, SessionStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// Event side of the bridge. Reused across reconnects.
pub struct BridgeSession {
    url: String,
    browser: Vec<String>,
    credentials: Arc<dyn CredentialStore>,
    client: Arc<BridgeClient>,
    generation: Arc<AtomicU64>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    reader: Option<JoinHandle<()>>,
}

impl BridgeSession {
    pub fn new(config: &ConnectionConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            url: config.bridge_url.clone(),
            browser: config.browser.to_vec(),
            credentials,
            client: Arc::new(BridgeClient::new(config.request_timeout())),
            generation: Arc::new(AtomicU64::new(0)),
            events_tx,
            events_rx,
            reader: None,
        }
    }

    fn load_credentials(&self) -> Option<Value> {
        match self.credentials.load() {
            Ok(creds) => creds,
            Err(e) => {
                warn!(
                    error = %e,
                    location = %self.credentials.location(),
                    "Stored credentials unreadable, starting a fresh pairing"
                );
                None
            }
        }
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[async_trait]
impl SessionStream for BridgeSession {
    async fn connect(&mut self) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.client.detach().await;
        let _ = self.events_tx.send(SessionEvent::Connecting);

        info!(url = %self.url, generation, "Connecting to session bridge");
        let (ws, response) = connect_async(self.url.as_str()).await?;
        info!(status = %response.status(), "Session bridge connected");

        let (writer, reader) = ws.split();
        self.client.attach(writer).await;

        let creds = self.load_credentials();
        debug!(has_credentials = creds.is_some(), "Sending hello");
        self.client
            .send_frame(&ClientFrame::Hello {
                browser: &self.browser,
                creds: creds.as_ref(),
            })
            .await?;

        let task = ReadLoop {
            generation,
            current: Arc::clone(&self.generation),
            events: self.events_tx.clone(),
            client: Arc::clone(&self.client),
            credentials: Arc::clone(&self.credentials),
            close_reported: false,
        };
        self.reader = Some(tokio::spawn(task.run(reader)));
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    fn client(&self) -> Arc<dyn SessionClient> {
        self.client.clone()
    }

    fn transport_name(&self) -> &'static str {
        "bridge"
    }
}

/// Per-connection reader.
struct ReadLoop {
    generation: u64,
    current: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<SessionEvent>,
    client: Arc<BridgeClient>,
    credentials: Arc<dyn CredentialStore>,
    close_reported: bool,
}

impl ReadLoop {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    fn emit(&mut self, event: SessionEvent) {
        if !self.is_current() {
            debug!(generation = self.generation, ?event, "Dropping event from stale connection");
            return;
        }
        if matches!(event, SessionEvent::Closed { .. }) {
            self.close_reported = true;
        }
        let _ = self.events.send(event);
    }

    async fn run(mut self, mut reader: WsReader) {
        let reason = loop {
            match reader.next().await {
                Some(Ok(Message::Text(text))) => {
                    trace!(bytes = text.len(), "Received bridge frame");
                    self.handle_text(&text);
                }
                Some(Ok(Message::Ping(data))) => {
                    trace!("Received WebSocket ping");
                    if let Err(e) = self.client.send_message(Message::Pong(data)).await {
                        break format!("failed to send pong: {e}");
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(frame = ?frame, "Session bridge closed the connection");
                    break frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "closed by bridge".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(error = %e, "WebSocket error");
                    break e.to_string();
                }
                None => break "bridge connection ended".to_string(),
            }
        };

        if !self.is_current() {
            return;
        }
        self.client.detach().await;
        if !self.close_reported {
            self.emit(SessionEvent::dropped(reason));
        }
    }

    fn handle_text(&mut self, text: &str) {
        let frame = match serde_json::from_str::<BridgeFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, bytes = text.len(), "Failed to parse bridge frame");
                return;
            }
        };

        match frame {
            BridgeFrame::Connection(connection) => self.emit(connection.into_event()),
            BridgeFrame::GroupsUpdate { updates } => {
                if !updates.is_empty() {
                    let updates: Vec<ResourceUpdate> = updates.into_iter().map(Into::into).collect();
                    self.emit(SessionEvent::ResourceUpdates(updates));
                }
            }
            BridgeFrame::CredsUpdate { creds } => {
                if let Err(e) = self.credentials.persist(&creds) {
                    error!(
                        error = %e,
                        location = %self.credentials.location(),
                        "Failed to persist rotated credentials"
                    );
                }
            }
            BridgeFrame::Qr { code } => self.emit(SessionEvent::PairingCode(code)),
            BridgeFrame::Response(response) => self.client.complete(response),
            BridgeFrame::Unknown => trace!("Ignoring unknown bridge frame"),
        }
    }
}

/// Request side of the bridge. Shared by the monitor and burst tasks.
pub struct BridgeClient {
    writer: tokio::sync::Mutex<Option<WsWriter>>,
    pending: Mutex<HashMap<u64, oneshot::Sender<ResponseFrame>>>,
    next_id: AtomicU64,
    request_timeout: Duration,
}

impl BridgeClient {
    fn new(request_timeout: Duration) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            request_timeout,
        }
    }

    async fn attach(&self, writer: WsWriter) {
        *self.writer.lock().await = Some(writer);
    }

    /// Drop the current socket and fail every request still waiting on it.
    async fn detach(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.close().await;
        }
        let failed = {
            let mut pending = self.pending.lock();
            let count = pending.len();
            pending.clear();
            count
        };
        if failed > 0 {
            debug!(requests = failed, "Failed pending requests on disconnect");
        }
    }

    async fn send_message(&self, message: Message) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let writer = writer
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".into()))?;
        writer.send(message).await?;
        Ok(())
    }

    async fn send_frame(&self, frame: &ClientFrame<'_>) -> Result<()> {
        let json = serde_json::to_string(frame)?;
        self.send_message(Message::Text(json)).await
    }

    fn complete(&self, response: ResponseFrame) {
        match self.pending.lock().remove(&response.id) {
            Some(waiter) => {
                let _ = waiter.send(response);
            }
            None => debug!(id = response.id, "Response for unknown or expired request"),
        }
    }

    async fn request(&self, method: &'static str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let frame = ClientFrame::Request { id, method, params };
        if let Err(e) = self.send_frame(&frame).await {
            self.pending.lock().remove(&id);
            return Err(e);
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) if response.ok => Ok(response.result.unwrap_or(Value::Null)),
            Ok(Ok(response)) => Err(Error::Session {
                method: method.to_string(),
                reason: response
                    .error
                    .unwrap_or_else(|| "unspecified error".to_string()),
            }),
            Ok(Err(_)) => Err(Error::Connection(format!(
                "connection closed before {method} completed"
            ))),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(Error::Timeout {
                    operation: method.to_string(),
                    after_ms: self.request_timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[async_trait]
impl SessionClient for BridgeClient {
    async fn fetch_resource(&self, id: &GroupId) -> Result<ResourceSnapshot> {
        let result = self
            .request(METHOD_GROUP_METADATA, json!({ "jid": id.as_str() }))
            .await?;
        let metadata: GroupMetadataDto = serde_json::from_value(result)?;
        Ok(metadata.into())
    }

    async fn list_resources(&self) -> Result<Vec<ResourceSnapshot>> {
        let result = self.request(METHOD_LIST_GROUPS, json!({})).await?;
        Ok(parse_group_listing(result)?)
    }

    async fn send_action(&self, id: &GroupId, payload: &str) -> Result<()> {
        self.request(
            METHOD_SEND_MESSAGE,
            json!({ "jid": id.as_str(), "content": { "text": payload } }),
        )
        .await?;
        Ok(())
    }

    async fn send_ping(&self, id: &GroupId) -> Result<()> {
        self.request(
            METHOD_SEND_PRESENCE,
            json!({ "presence": "composing", "jid": id.as_str() }),
        )
        .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let result = self.request(METHOD_END, json!({})).await;
        self.detach().await;
        result.map(|_| ())
    }
}
