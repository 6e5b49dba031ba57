//! Inbound chat events and author classification.
//!
//! The server sends one JSON object per text frame:
//!
//! ```json
//! { "author": "alice", "content": "hi" }
//! ```
//!
//! `content` is the canonical body field; `body` is accepted as a deprecated
//! alias. Older servers spell the author key `auther`, which is accepted too.
//! When both spellings are present the canonical one wins. Extra fields are
//! ignored. Outbound frames carry raw text and never go through this module.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{LOCAL_AUTHOR, SYSTEM_AUTHOR};
use crate::errors::{ChatError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// AuthorRole
// ─────────────────────────────────────────────────────────────────────────────

/// How an entry is styled, derived from its author.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    /// Echo of the local user's own message (`"you"`).
    Local,
    /// Notice from the client or server (`"system"`).
    System,
    /// Anybody else.
    Remote,
}

impl AuthorRole {
    /// Classify an author value. Comparison is exact and case-sensitive.
    #[must_use]
    pub fn classify(author: &str) -> Self {
        match author {
            LOCAL_AUTHOR => Self::Local,
            SYSTEM_AUTHOR => Self::System,
            _ => Self::Remote,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChatEvent
// ─────────────────────────────────────────────────────────────────────────────

/// One chat message decoded from an inbound frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEvent")]
pub struct ChatEvent {
    /// Who wrote the message.
    pub author: String,
    /// Message text.
    pub content: String,
}

impl ChatEvent {
    /// Create an event.
    #[must_use]
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }

    /// Create a locally synthesized system notice.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(SYSTEM_AUTHOR, content)
    }

    /// Style classification of this event's author.
    #[must_use]
    pub fn role(&self) -> AuthorRole {
        AuthorRole::classify(&self.author)
    }

    /// Decode one inbound text frame.
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(|e| ChatError::ProtocolDecode {
            reason: e.to_string(),
        })
    }
}

/// Wire shape with every accepted spelling.
#[derive(Deserialize)]
struct WireEvent {
    author: Option<String>,
    auther: Option<String>,
    content: Option<String>,
    body: Option<String>,
}

impl TryFrom<WireEvent> for ChatEvent {
    type Error = String;

    fn try_from(wire: WireEvent) -> std::result::Result<Self, Self::Error> {
        let author = match (wire.author, wire.auther) {
            (Some(author), _) => author,
            (None, Some(legacy)) => {
                debug!("frame uses legacy 'auther' key");
                legacy
            }
            (None, None) => return Err("missing field `author`".to_owned()),
        };
        let content = match (wire.content, wire.body) {
            (Some(content), _) => content,
            (None, Some(body)) => {
                debug!("frame uses deprecated 'body' key");
                body
            }
            (None, None) => return Err("missing field `content`".to_owned()),
        };
        Ok(Self { author, content })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
