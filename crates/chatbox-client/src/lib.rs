//! # chatbox-client
//!
//! Connection lifecycle and message protocol for the chatbox client.
//!
//! - [`target`]: connection URL templates with `{room}` / `{id}` placeholders
//! - [`session`]: [`ChatSession`], the four-state connection machine that
//!   turns transport events into transcript entries and user submissions
//!   into outbound frames
//! - [`transcript`]: the rendering boundary ([`Renderer`]) and entries
//! - [`input`]: the input control a submission is read from and cleared on
//! - [`transport`]: the transport seam, a `tokio-tungstenite` implementation,
//!   and an in-memory loopback
//! - [`driver`]: single-task event loop that owns a session until it ends

#![deny(unsafe_code)]

pub mod driver;
pub mod input;
pub mod session;
pub mod target;
pub mod transcript;
pub mod transport;

pub use input::InputControl;
pub use session::{ChatSession, SessionConfig};
pub use target::{IdentityMode, TargetTemplate};
pub use transcript::{Notice, Renderer, Transcript, TranscriptEntry};
pub use transport::{Connection, Connector, FrameSink, TransportEvent, TransportEvents};
