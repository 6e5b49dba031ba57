//! Client-held credentials and session identifier resolution.
//!
//! The client never issues or stores credentials; it only reads a key/value
//! store that something else populated (a browser cookie jar, a file, a CLI
//! flag). [`CredentialStore`] is the accessor, injected wherever an
//! identifier must be resolved so tests can substitute their own.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::{ChatError, Result};
use crate::ids::SessionId;

/// Read access to client-held key/value credentials.
pub trait CredentialStore: Send + Sync {
    /// Value stored under `key`, exactly as stored.
    fn get(&self, key: &str) -> Option<String>;
}

/// Resolve the session identifier from the first recognized key present.
///
/// Keys are tried in order. The stored value is returned unmodified.
pub fn resolve_session_id(store: &dyn CredentialStore, keys: &[String]) -> Result<SessionId> {
    for key in keys {
        if let Some(value) = store.get(key) {
            debug!(key = %key, "resolved session identifier");
            return Ok(SessionId::from_string(value));
        }
    }
    Err(ChatError::MissingCredential {
        keys: keys.to_vec(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryCredentials
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory credential map.
#[derive(Clone, Debug, Default)]
pub struct MemoryCredentials {
    entries: HashMap<String, String>,
}

impl MemoryCredentials {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.entries.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryCredentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl CredentialStore for MemoryCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CookieJar
// ─────────────────────────────────────────────────────────────────────────────

/// Credentials parsed from a `Cookie`-style string (`a=1; uid=abc`).
///
/// Pairs are separated by `;` (plus the optional space that follows it) and
/// split at the first `=`, so values may contain `=`. Keys match exactly:
/// `uidx=1` does not satisfy a lookup for `uid`. When a key repeats the
/// first occurrence wins. Pairs without `=` are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse a cookie string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split(';')
            .map(|pair| pair.trim_start_matches([' ', '\t', '\r', '\n']))
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_owned(), v.trim_end_matches(['\r', '\n']).to_owned()))
            .collect();
        Self { pairs }
    }

    /// Number of parsed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl CredentialStore for CookieJar {
    fn get(&self, key: &str) -> Option<String> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
