//! # chatbox-settings
//!
//! Configuration management with layered sources for the chatbox client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ChatboxSettings::default()`]
//! 2. **User file**: `~/.chatbox/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CHATBOX_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = ChatboxSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = ChatboxSettings::default();
        assert_eq!(settings.name, "chatbox");
        assert_eq!(settings.connection.url, "ws://127.0.0.1:8000/ws/{id}");
        assert!(settings.connection.room.is_none());
        assert_eq!(settings.connection.credential_keys, ["uid", "token"]);
        assert_eq!(settings.connection.connect_timeout_ms, 10_000);
        assert_eq!(settings.logging.level, "warn");
        assert!(settings.validate().is_ok());
    }
}
