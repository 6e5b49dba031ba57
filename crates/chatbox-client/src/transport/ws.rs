//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each connection runs in one background task that owns the socket. The
//! session talks to it through an unbounded command channel (outbound text,
//! close) and hears back through a bounded event channel, so the task is the
//! only place the socket is touched and inbound frames keep their order.

use std::time::Duration;

use chatbox_core::errors::{ChatError, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use super::{Connection, Connector, DEFAULT_EVENT_CAPACITY, FrameSink, TransportEvent};

/// Default handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Command from the sink to the connection task.
#[derive(Debug)]
enum Command {
    Text(String),
    Close,
}

/// Opens `tokio-tungstenite` connections.
///
/// [`Connector::connect`] spawns the connection task, so it must be called
/// from within a tokio runtime.
#[derive(Clone, Debug)]
pub struct WsConnector {
    connect_timeout: Duration,
    event_capacity: usize,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl WsConnector {
    /// Connector with default timeout and channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handshake timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the inbound event channel capacity. Values below 1 are clamped.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl Connector for WsConnector {
    type Sink = WsSink;

    fn connect(&self, url: &Url) -> Connection<WsSink> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(self.event_capacity);
        let task = tokio::spawn(connection_loop(
            url.clone(),
            self.connect_timeout,
            cmd_rx,
            event_tx,
        ));
        Connection {
            sink: WsSink {
                cmd_tx,
                task: Some(task),
            },
            events: event_rx,
        }
    }
}

/// Outbound half of a WebSocket connection.
///
/// Dropping the sink closes the connection gracefully.
#[derive(Debug)]
pub struct WsSink {
    cmd_tx: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl WsSink {
    /// Whether the connection task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Close and wait for the connection task to finish.
    pub async fn shutdown(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl FrameSink for WsSink {
    fn send_text(&mut self, text: &str) -> Result<()> {
        self.cmd_tx
            .send(Command::Text(text.to_owned()))
            .map_err(|_| ChatError::TransportRuntime("connection task has ended".into()))
    }

    fn close(&mut self) {
        let _ = self.cmd_tx.send(Command::Close);
    }
}

/// Connection task: handshake, then shuttle frames until either side closes.
async fn connection_loop(
    url: Url,
    connect_timeout: Duration,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<TransportEvent>,
) {
    debug!(url = %url, "opening websocket");
    let handshake = tokio::time::timeout(connect_timeout, connect_async(url.as_str())).await;
    let ws = match handshake {
        Ok(Ok((ws, _response))) => ws,
        Ok(Err(e)) => {
            let err = ChatError::TransportOpen {
                url: url.to_string(),
                reason: e.to_string(),
            };
            warn!(error = %err, "websocket handshake failed");
            let _ = events.send(TransportEvent::Error(err.to_string())).await;
            return;
        }
        Err(_) => {
            let err = ChatError::TransportOpen {
                url: url.to_string(),
                reason: format!("timed out after {}ms", connect_timeout.as_millis()),
            };
            warn!(error = %err, "websocket handshake timed out");
            let _ = events.send(TransportEvent::Error(err.to_string())).await;
            return;
        }
    };
    info!(url = %url, "websocket open");
    if events.send(TransportEvent::Opened).await.is_err() {
        return;
    }

    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            // Outbound command from the session
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Command::Text(text)) => {
                        debug!(len = text.len(), "sending frame");
                        if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                            let _ = events.send(TransportEvent::Error(e.to_string())).await;
                            break;
                        }
                    }
                    // Explicit close, or every sink handle dropped
                    Some(Command::Close) | None => {
                        debug!("closing websocket");
                        let _ = ws_tx.close().await;
                        let _ = events
                            .send(TransportEvent::Closed {
                                code: None,
                                reason: "closed by client".into(),
                            })
                            .await;
                        break;
                    }
                }
            }
            // Inbound frame from the server
            msg = ws_rx.next() => {
                let event = match msg {
                    Some(Ok(Message::Text(text))) => TransportEvent::Text(text.as_str().to_owned()),
                    Some(Ok(Message::Binary(bytes))) => TransportEvent::Binary(bytes.to_vec()),
                    Some(Ok(Message::Close(frame))) => {
                        // Flush tungstenite's queued close reply.
                        let _ = ws_tx.close().await;
                        let (code, reason) = frame
                            .map(|f| (Some(u16::from(f.code)), f.reason.as_str().to_owned()))
                            .unwrap_or_default();
                        let _ = events.send(TransportEvent::Closed { code, reason }).await;
                        break;
                    }
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = events.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                    None => {
                        let _ = events
                            .send(TransportEvent::Closed {
                                code: None,
                                reason: "connection ended".into(),
                            })
                            .await;
                        break;
                    }
                };
                if events.send(event).await.is_err() {
                    debug!("session dropped, closing websocket");
                    let _ = ws_tx.close().await;
                    break;
                }
            }
        }
    }
    debug!(url = %url, "websocket task finished");
}
