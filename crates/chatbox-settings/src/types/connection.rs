//! Connection target and credential lookup settings.

use chatbox_core::constants::DEFAULT_CREDENTIAL_KEYS;
use serde::{Deserialize, Serialize};

/// Where to connect and how to identify.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// Target URL template. `{room}` and `{id}` are substituted; a template
    /// without `{id}` connects anonymously.
    pub url: String,
    /// Room substituted for `{room}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Credential keys tried in order when resolving the session identifier.
    pub credential_keys: Vec<String>,
    /// Handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000/ws/{id}".to_string(),
            room: None,
            credential_keys: DEFAULT_CREDENTIAL_KEYS
                .iter()
                .map(|k| (*k).to_owned())
                .collect(),
            connect_timeout_ms: 10_000,
        }
    }
}
