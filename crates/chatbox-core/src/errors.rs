//! Error taxonomy for the chatbox client.
//!
//! Every failure the connection layer can hit is a [`ChatError`] variant.
//! None of them are fatal to the host: the session converts each one into a
//! transcript notice (or a no-op) and keeps the front end alive.

use thiserror::Error;

use crate::state::ConnectionState;

/// Errors raised by identifier resolution, target composition, the
/// transport, and the message protocol.
#[derive(Debug, Error)]
pub enum ChatError {
    /// None of the recognized credential keys were present.
    #[error("no session credential found (looked for: {})", keys.join(", "))]
    MissingCredential {
        /// Keys that were looked up, in lookup order.
        keys: Vec<String>,
    },

    /// The connection target template or rendered URL is unusable.
    #[error("invalid connection target '{template}': {reason}")]
    InvalidTarget {
        /// Template as configured.
        template: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The transport handshake failed.
    #[error("failed to open connection to {url}: {reason}")]
    TransportOpen {
        /// Target that was dialed.
        url: String,
        /// Why the handshake failed.
        reason: String,
    },

    /// The transport failed after it was established.
    #[error("connection failed: {0}")]
    TransportRuntime(String),

    /// An inbound frame did not decode as a chat event.
    #[error("malformed frame: {reason}")]
    ProtocolDecode {
        /// Decoder diagnostic.
        reason: String,
    },

    /// A send was attempted while the connection was not open.
    #[error("cannot send while {state}")]
    SendRejected {
        /// State the session was in when the send was attempted.
        state: ConnectionState,
    },
}

impl ChatError {
    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL",
            Self::InvalidTarget { .. } => "INVALID_TARGET",
            Self::TransportOpen { .. } => "TRANSPORT_OPEN",
            Self::TransportRuntime(_) => "TRANSPORT_RUNTIME",
            Self::ProtocolDecode { .. } => "PROTOCOL_DECODE",
            Self::SendRejected { .. } => "SEND_REJECTED",
        }
    }

    /// Whether the error ends the session (no further sends are possible).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::ProtocolDecode { .. } | Self::SendRejected { .. })
    }
}

/// Result type for chatbox operations.
pub type Result<T> = std::result::Result<T, ChatError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
