//! Connection lifecycle states.
//!
//! ```text
//!   Connecting ──► Open ──► Closed
//!        │           │
//!        ├───────────┴────► Errored
//!        └────────────────► Closed
//! ```
//!
//! `Closed` and `Errored` are terminal. Nothing re-enters `Connecting`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one session's transport connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Handshake initiated, not yet answered.
    Connecting,
    /// Handshake succeeded; sending is enabled.
    Open,
    /// Transport closed by either side.
    Closed,
    /// Transport reported an error.
    Errored,
}

impl ConnectionState {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open | Self::Closed | Self::Errored)
                | (Self::Open, Self::Closed | Self::Errored)
        )
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Only an open connection accepts outbound frames.
    #[must_use]
    pub fn accepts_sends(self) -> bool {
        self == Self::Open
    }

    /// Lowercase name used in logs and notices.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
