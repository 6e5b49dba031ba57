//! Single-task event loop for a session.
//!
//! The session is not shared between tasks. [`run`] owns it for the
//! duration of the connection and multiplexes transport events and
//! submitted lines with `tokio::select!`, so every state change happens on
//! one task in the order the events were received.

use chatbox_core::state::ConnectionState;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::session::ChatSession;
use crate::transcript::Renderer;
use crate::transport::{FrameSink, TransportEvent, TransportEvents};

/// Drive `session` until it reaches a terminal state.
///
/// Transport events win over queued input when both are ready. A closed
/// event stream counts as the connection closing; a closed input channel
/// closes the session.
pub async fn run<S, R>(
    session: &mut ChatSession<S, R>,
    events: &mut TransportEvents,
    inputs: &mut mpsc::Receiver<String>,
) -> ConnectionState
where
    S: FrameSink,
    R: Renderer,
{
    while !session.state().is_terminal() {
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Some(event) => session.handle(event),
                None => {
                    debug!("transport event stream ended");
                    session.handle(TransportEvent::Closed {
                        code: None,
                        reason: "event stream ended".into(),
                    });
                }
            },
            line = inputs.recv() => match line {
                Some(mut line) => {
                    // Rejections are already in the transcript.
                    let _ = session.submit(&mut line);
                }
                None => {
                    debug!("input closed");
                    session.close();
                }
            },
        }
    }
    info!(state = %session.state(), "session ended");
    session.state()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
