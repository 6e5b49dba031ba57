//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a settings file only needs the fields it changes.

mod connection;

pub use connection::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the chatbox client.
///
/// # JSON Format
///
/// ```json
/// {
///   "connection": { "url": "wss://chat.example/ws/{room}/{id}", "room": "lobby" },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatboxSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Where and how to connect.
    pub connection: ConnectionSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for ChatboxSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: chatbox_core::constants::NAME.to_string(),
            connection: ConnectionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ChatboxSettings {
    /// Reject values that would make the client unusable.
    pub fn validate(&self) -> Result<()> {
        if self.connection.url.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "connection.url must not be empty".into(),
            ));
        }
        if self.connection.credential_keys.is_empty() {
            return Err(SettingsError::InvalidValue(
                "connection.credentialKeys must list at least one key".into(),
            ));
        }
        if self.connection.credential_keys.iter().any(String::is_empty) {
            return Err(SettingsError::InvalidValue(
                "connection.credentialKeys must not contain empty keys".into(),
            ));
        }
        if self.connection.connect_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "connection.connectTimeoutMs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ChatboxSettings::default()).unwrap();
        assert!(json["connection"]["credentialKeys"].is_array());
        assert!(json["connection"]["connectTimeoutMs"].is_u64());
        assert_eq!(json["logging"]["level"], "warn");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: ChatboxSettings =
            serde_json::from_str(r#"{"connection": {"room": "lobby"}}"#).unwrap();
        assert_eq!(settings.connection.room.as_deref(), Some("lobby"));
        assert_eq!(settings.connection.url, ConnectionSettings::default().url);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn validate_rejects_empty_url() {
        let mut settings = ChatboxSettings::default();
        settings.connection.url = "  ".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_key() {
        let mut settings = ChatboxSettings::default();
        settings.connection.credential_keys = vec!["uid".into(), String::new()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_key_list() {
        let mut settings = ChatboxSettings::default();
        settings.connection.credential_keys.clear();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("at least one key"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut settings = ChatboxSettings::default();
        settings.connection.connect_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }
}
