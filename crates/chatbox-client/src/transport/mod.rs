//! Transport seam between the session and the wire.
//!
//! A [`Connector`] starts a connection and immediately returns a
//! [`Connection`]: a [`FrameSink`] for outbound frames and a channel of
//! [`TransportEvent`]s that reports the handshake result, inbound frames,
//! and closure in the order they happened. This mirrors the browser
//! `WebSocket` object: construction never blocks, everything after it is an
//! event.

pub mod memory;
pub mod ws;

use chatbox_core::errors::Result;
use tokio::sync::mpsc;
use url::Url;

pub use memory::{MemoryConnector, MemoryPeer, MemorySink, loopback};
pub use ws::{WsConnector, WsSink};

/// Default capacity of the inbound event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something that happened on the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake succeeded.
    Opened,
    /// Inbound text frame.
    Text(String),
    /// Inbound binary frame.
    Binary(Vec<u8>),
    /// Transport-level failure (handshake or runtime).
    Error(String),
    /// Connection closed by either side.
    Closed {
        /// Close code, if the peer sent one.
        code: Option<u16>,
        /// Close reason (may be empty).
        reason: String,
    },
}

/// Receiving half of a connection's event stream.
pub type TransportEvents = mpsc::Receiver<TransportEvent>;

/// Outbound half of a connection.
pub trait FrameSink {
    /// Queue one text frame. Fails only when the connection is gone.
    fn send_text(&mut self, text: &str) -> Result<()>;

    /// Release the connection. Idempotent.
    fn close(&mut self);
}

/// A started connection.
pub struct Connection<S> {
    /// Outbound half.
    pub sink: S,
    /// Inbound events, in arrival order.
    pub events: TransportEvents,
}

/// Opens connections.
pub trait Connector {
    /// Sink type handed to the session.
    type Sink: FrameSink;

    /// Begin connecting to `url` and return without waiting for the handshake.
    fn connect(&self, url: &Url) -> Connection<Self::Sink>;
}
