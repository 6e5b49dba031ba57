//! Transcript entries and the rendering boundary.
//!
//! The session never owns presentation. It appends [`TranscriptEntry`]s to
//! whatever [`Renderer`] it was given: a terminal writer, a DOM list, or the
//! in-memory [`Transcript`] used by tests. Appends arrive in event order and
//! are never reordered or removed.

use std::fmt;

use chatbox_core::events::{AuthorRole, ChatEvent};

/// One rendered line of the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Author as received (or `"system"` for local notices).
    pub author: String,
    /// Message text.
    pub content: String,
    /// Style derived from `author`.
    pub role: AuthorRole,
}

impl From<ChatEvent> for TranscriptEntry {
    fn from(event: ChatEvent) -> Self {
        let role = event.role();
        Self {
            author: event.author,
            content: event.content,
            role,
        }
    }
}

impl From<Notice> for TranscriptEntry {
    fn from(notice: Notice) -> Self {
        ChatEvent::system(notice.to_string()).into()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notice
// ─────────────────────────────────────────────────────────────────────────────

/// Locally synthesized system notices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Handshake initiated.
    Connecting,
    /// Handshake succeeded.
    Connected,
    /// Transport reported an error.
    ConnectionError,
    /// Transport closed.
    Disconnected,
    /// A send was attempted while not connected.
    Unavailable,
    /// An inbound frame could not be decoded and was skipped.
    DroppedFrame,
    /// The session could not start; carries the reason.
    StartFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting…"),
            Self::Connected => f.write_str("connected"),
            Self::ConnectionError => f.write_str("connection error"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Unavailable => f.write_str("connection unavailable"),
            Self::DroppedFrame => f.write_str("dropped malformed message"),
            Self::StartFailed(reason) => write!(f, "not connecting: {reason}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, append-only sink for transcript entries.
pub trait Renderer {
    /// Append one entry after every previously appended entry.
    fn append(&mut self, entry: TranscriptEntry);
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn append(&mut self, entry: TranscriptEntry) {
        (**self).append(entry);
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn append(&mut self, entry: TranscriptEntry) {
        (**self).append(entry);
    }
}

/// In-memory transcript.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that are not system notices.
    pub fn messages(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter().filter(|e| e.role != AuthorRole::System)
    }

    /// Whether a system notice with exactly this text was appended.
    #[must_use]
    pub fn has_notice(&self, notice: &Notice) -> bool {
        let text = notice.to_string();
        self.entries
            .iter()
            .any(|e| e.role == AuthorRole::System && e.content == text)
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }
}

impl Renderer for Transcript {
    fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
