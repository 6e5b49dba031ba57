//! # chatbox-core
//!
//! Foundation types shared by every chatbox crate:
//!
//! - **Branded IDs**: [`SessionId`] and [`RoomId`] newtypes so an identifier
//!   and a room cannot be swapped when composing a connection target
//! - **Wire types**: [`ChatEvent`] decoded from inbound frames and the
//!   three-way [`AuthorRole`] classification
//! - **Credentials**: the [`CredentialStore`] accessor and session identifier
//!   resolution
//! - **Lifecycle**: the four-state [`ConnectionState`] machine
//! - **Errors**: [`ChatError`] via `thiserror`
//! - **Logging**: `tracing` subscriber setup and test capture helpers

#![deny(unsafe_code)]

pub mod constants;
pub mod credentials;
pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;
pub mod state;

pub use credentials::{CookieJar, CredentialStore, MemoryCredentials, resolve_session_id};
pub use errors::{ChatError, Result};
pub use events::{AuthorRole, ChatEvent};
pub use ids::{RoomId, SessionId};
pub use state::ConnectionState;
