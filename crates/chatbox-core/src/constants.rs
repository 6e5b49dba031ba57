//! Package-level constants.

/// Current version of the chatbox client (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "chatbox";

/// Author value the server uses for frames echoing the local user.
pub const LOCAL_AUTHOR: &str = "you";

/// Author value reserved for locally synthesized notices.
pub const SYSTEM_AUTHOR: &str = "system";

/// Credential keys looked up, in order, when none are configured.
pub const DEFAULT_CREDENTIAL_KEYS: &[&str] = &["uid", "token"];
