//! In-memory loopback transport.
//!
//! [`loopback`] returns a connector and the [`MemoryPeer`] that plays the
//! server: it injects [`TransportEvent`]s and inspects what the session sent.
//! Used by the session and driver tests, and usable by any front end that
//! wants to run a session without a network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chatbox_core::errors::{ChatError, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

use super::{Connection, Connector, DEFAULT_EVENT_CAPACITY, FrameSink, TransportEvent};

#[derive(Default)]
struct Shared {
    dialed: Mutex<Vec<Url>>,
    frames: Mutex<Vec<String>>,
    closed: AtomicBool,
    broken: AtomicBool,
}

/// Create a connected connector/peer pair.
pub fn loopback() -> (MemoryConnector, MemoryPeer) {
    let (event_tx, event_rx) = mpsc::channel(DEFAULT_EVENT_CAPACITY);
    let shared = Arc::new(Shared::default());
    (
        MemoryConnector {
            events: Mutex::new(Some(event_rx)),
            shared: Arc::clone(&shared),
        },
        MemoryPeer {
            events: event_tx,
            shared,
        },
    )
}

/// Connector half of a loopback pair. Only the first connection receives
/// the peer's events; later ones see an already-ended stream.
pub struct MemoryConnector {
    events: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    shared: Arc<Shared>,
}

impl Connector for MemoryConnector {
    type Sink = MemorySink;

    fn connect(&self, url: &Url) -> Connection<MemorySink> {
        self.shared.dialed.lock().push(url.clone());
        let events = self.events.lock().take().unwrap_or_else(|| {
            let (_tx, rx) = mpsc::channel(1);
            rx
        });
        Connection {
            sink: MemorySink {
                shared: Arc::clone(&self.shared),
            },
            events,
        }
    }
}

/// Outbound half of a loopback connection.
pub struct MemorySink {
    shared: Arc<Shared>,
}

impl FrameSink for MemorySink {
    fn send_text(&mut self, text: &str) -> Result<()> {
        if self.shared.broken.load(Ordering::Relaxed) || self.shared.closed.load(Ordering::Relaxed)
        {
            return Err(ChatError::TransportRuntime("loopback connection is gone".into()));
        }
        self.shared.frames.lock().push(text.to_owned());
        Ok(())
    }

    fn close(&mut self) {
        self.shared.closed.store(true, Ordering::Relaxed);
    }
}

/// Server side of a loopback pair.
#[derive(Clone)]
pub struct MemoryPeer {
    events: mpsc::Sender<TransportEvent>,
    shared: Arc<Shared>,
}

impl MemoryPeer {
    /// Deliver an event to the session.
    pub async fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event).await;
    }

    /// Deliver an event without waiting. Returns `false` if it was not queued.
    pub fn try_emit(&self, event: TransportEvent) -> bool {
        self.events.try_send(event).is_ok()
    }

    /// Deliver a text frame.
    pub fn try_emit_text(&self, text: impl Into<String>) -> bool {
        self.try_emit(TransportEvent::Text(text.into()))
    }

    /// URLs the connector was asked to dial.
    #[must_use]
    pub fn dialed(&self) -> Vec<Url> {
        self.shared.dialed.lock().clone()
    }

    /// Frames the session sent, in order.
    #[must_use]
    pub fn sent_frames(&self) -> Vec<String> {
        self.shared.frames.lock().clone()
    }

    /// Whether the session released the connection.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Relaxed)
    }

    /// Make every further send fail as if the socket died.
    pub fn break_connection(&self) {
        self.shared.broken.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("ws://loopback/ws").unwrap()
    }

    #[tokio::test]
    async fn peer_events_reach_connection() {
        let (connector, peer) = loopback();
        let Connection { mut events, .. } = connector.connect(&url());
        peer.emit(TransportEvent::Opened).await;
        assert!(peer.try_emit_text("frame"));
        assert_eq!(events.recv().await, Some(TransportEvent::Opened));
        assert_eq!(events.recv().await, Some(TransportEvent::Text("frame".into())));
        assert_eq!(peer.dialed(), [url()]);
    }

    #[tokio::test]
    async fn second_connection_has_ended_stream() {
        let (connector, _peer) = loopback();
        let _first = connector.connect(&url());
        let Connection { mut events, .. } = connector.connect(&url());
        assert_eq!(events.recv().await, None);
    }

    #[test]
    fn sink_records_until_closed() {
        let (connector, peer) = loopback();
        let Connection { mut sink, .. } = connector.connect(&url());
        sink.send_text("one").unwrap();
        sink.close();
        assert!(sink.send_text("two").is_err());
        assert_eq!(peer.sent_frames(), ["one"]);
        assert!(peer.is_closed());
    }

    #[test]
    fn broken_connection_fails_sends() {
        let (connector, peer) = loopback();
        let Connection { mut sink, .. } = connector.connect(&url());
        peer.break_connection();
        assert!(sink.send_text("x").is_err());
        assert!(peer.sent_frames().is_empty());
    }
}
