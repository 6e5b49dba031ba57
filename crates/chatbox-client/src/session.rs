//! Chat session: one connection's lifecycle from identifier resolution to
//! teardown.
//!
//! [`ChatSession::start`] resolves the session identifier, renders the
//! connection target, and asks the [`Connector`] to dial. From then on the
//! owner feeds every [`TransportEvent`] to [`ChatSession::handle`] and every
//! submit action to [`ChatSession::submit`]. All state changes go through
//! [`ConnectionState::can_transition_to`], so events that arrive after the
//! session ended are ignored instead of producing duplicate notices.
//!
//! No error here tears the front end down. Startup failures, transport
//! failures, malformed frames, and rejected sends all become transcript
//! notices; the `Result`s returned are informational.

use chatbox_core::credentials::{CredentialStore, resolve_session_id};
use chatbox_core::errors::{ChatError, Result};
use chatbox_core::events::ChatEvent;
use chatbox_core::ids::{RoomId, SessionId};
use chatbox_core::state::ConnectionState;
use tracing::{debug, info, warn};
use url::Url;

use crate::input::InputControl;
use crate::target::{IdentityMode, TargetTemplate};
use crate::transcript::{Notice, Renderer, TranscriptEntry};
use crate::transport::{Connection, Connector, FrameSink, TransportEvent, TransportEvents};

// ─────────────────────────────────────────────────────────────────────────────
// SessionConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to compute a connection target.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Target template.
    pub target: TargetTemplate,
    /// Room substituted for `{room}`.
    pub room: Option<RoomId>,
    /// Credential keys tried in order.
    pub credential_keys: Vec<String>,
}

impl SessionConfig {
    /// Config with the default credential keys and no room.
    #[must_use]
    pub fn new(target: TargetTemplate) -> Self {
        Self {
            target,
            room: None,
            credential_keys: chatbox_core::constants::DEFAULT_CREDENTIAL_KEYS
                .iter()
                .map(|k| (*k).to_owned())
                .collect(),
        }
    }

    /// Set the room.
    #[must_use]
    pub fn with_room(mut self, room: impl Into<RoomId>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Replace the credential keys.
    #[must_use]
    pub fn with_credential_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.credential_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve the identifier (unless anonymous) and render the target.
    pub fn resolve(&self, credentials: &dyn CredentialStore) -> Result<(Url, Option<SessionId>)> {
        let session_id = match self.target.identity() {
            IdentityMode::Required => Some(resolve_session_id(credentials, &self.credential_keys)?),
            IdentityMode::Anonymous => None,
        };
        let url = self.target.render(self.room.as_ref(), session_id.as_ref())?;
        Ok((url, session_id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChatSession
// ─────────────────────────────────────────────────────────────────────────────

/// One connection and the transcript it feeds.
pub struct ChatSession<S, R> {
    url: Url,
    session_id: Option<SessionId>,
    state: ConnectionState,
    sink: S,
    renderer: R,
}

impl<S: FrameSink, R: Renderer> ChatSession<S, R> {
    /// Resolve the target and start connecting.
    ///
    /// On success the session is `Connecting` and the returned event stream
    /// must be fed to [`handle`](Self::handle). If the identifier or target
    /// cannot be resolved, nothing is dialed: a notice is appended to
    /// `renderer` and the error is returned.
    pub fn start<C>(
        config: &SessionConfig,
        credentials: &dyn CredentialStore,
        connector: &C,
        mut renderer: R,
    ) -> Result<(Self, TransportEvents)>
    where
        C: Connector<Sink = S>,
    {
        let (url, session_id) = match config.resolve(credentials) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(code = err.code(), error = %err, "session not started");
                renderer.append(Notice::StartFailed(err.to_string()).into());
                return Err(err);
            }
        };

        info!(url = %url, anonymous = session_id.is_none(), "connecting");
        let Connection { sink, events } = connector.connect(&url);
        let mut session = Self {
            url,
            session_id,
            state: ConnectionState::Connecting,
            sink,
            renderer,
        };
        session.notify(Notice::Connecting);
        Ok((session, events))
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// URL that was dialed.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolved identifier, `None` for anonymous sessions.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// The rendering boundary.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Apply one transport event.
    pub fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                if self.transition(ConnectionState::Open) {
                    self.notify(Notice::Connected);
                }
            }
            TransportEvent::Text(frame) if self.accepts_frames() => self.receive(&frame),
            TransportEvent::Binary(bytes) if self.accepts_frames() => {
                match String::from_utf8(bytes) {
                    Ok(frame) => self.receive(&frame),
                    Err(e) => self.drop_frame(&ChatError::ProtocolDecode {
                        reason: format!("binary frame is not UTF-8: {e}"),
                    }),
                }
            }
            TransportEvent::Text(_) | TransportEvent::Binary(_) => {
                debug!(state = %self.state, "ignoring frame after session ended");
            }
            TransportEvent::Error(reason) => {
                warn!(reason = %reason, "transport error");
                self.fail();
            }
            TransportEvent::Closed { code, reason } => {
                info!(?code, reason = %reason, "transport closed");
                if self.transition(ConnectionState::Closed) {
                    self.notify(Notice::Disconnected);
                }
            }
        }
    }

    /// Send the input's text as one frame and clear the input.
    ///
    /// Only an `Open` session sends. Otherwise nothing is transmitted, the
    /// input keeps its text, and a notice is appended.
    pub fn submit<I: InputControl + ?Sized>(&mut self, input: &mut I) -> Result<()> {
        if !self.state.accepts_sends() {
            warn!(state = %self.state, "send rejected");
            self.notify(Notice::Unavailable);
            return Err(ChatError::SendRejected { state: self.state });
        }
        match self.sink.send_text(input.text()) {
            Ok(()) => {
                debug!(len = input.text().len(), "frame sent");
                input.clear();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "send failed");
                self.fail();
                Err(err)
            }
        }
    }

    /// Release the transport. A session that has not ended moves to `Closed`.
    pub fn close(&mut self) {
        self.sink.close();
        if self.transition(ConnectionState::Closed) {
            self.notify(Notice::Disconnected);
        }
    }

    /// Give back the sink and renderer.
    pub fn into_parts(self) -> (S, R) {
        (self.sink, self.renderer)
    }

    fn accepts_frames(&self) -> bool {
        !self.state.is_terminal()
    }

    fn receive(&mut self, frame: &str) {
        match ChatEvent::decode(frame) {
            Ok(event) => {
                debug!(author = %event.author, "frame received");
                self.renderer.append(event.into());
            }
            Err(err) => self.drop_frame(&err),
        }
    }

    fn drop_frame(&mut self, err: &ChatError) {
        warn!(error = %err, "dropping inbound frame");
        self.notify(Notice::DroppedFrame);
    }

    fn fail(&mut self) {
        if self.transition(ConnectionState::Errored) {
            self.sink.close();
            self.notify(Notice::ConnectionError);
        }
    }

    fn transition(&mut self, next: ConnectionState) -> bool {
        if !self.state.can_transition_to(next) {
            debug!(from = %self.state, to = %next, "ignoring transition");
            return false;
        }
        info!(from = %self.state, to = %next, "connection state changed");
        self.state = next;
        true
    }

    fn notify(&mut self, notice: Notice) {
        self.renderer.append(TranscriptEntry::from(notice));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;
    use crate::transport::{MemoryPeer, MemorySink, loopback};
    use assert_matches::assert_matches;
    use chatbox_core::credentials::MemoryCredentials;
    use chatbox_core::events::AuthorRole;
    use chatbox_core::logging::capture_logs;
    use proptest::prelude::*;

    type TestSession = ChatSession<MemorySink, Transcript>;

    fn config(template: &str) -> SessionConfig {
        SessionConfig::new(TargetTemplate::parse(template).unwrap())
    }

    fn start_with(
        template: &str,
        credentials: &MemoryCredentials,
    ) -> (TestSession, TransportEvents, MemoryPeer) {
        let (connector, peer) = loopback();
        let (session, events) =
            ChatSession::start(&config(template), credentials, &connector, Transcript::new())
                .unwrap();
        (session, events, peer)
    }

    fn open_session() -> (TestSession, MemoryPeer) {
        let credentials = MemoryCredentials::new().with("uid", "u-1");
        let (mut session, _events, peer) = start_with("ws://host/ws/{id}", &credentials);
        session.handle(TransportEvent::Opened);
        (session, peer)
    }

    fn frame(author: &str, content: &str) -> TransportEvent {
        TransportEvent::Text(
            serde_json::json!({ "author": author, "content": content }).to_string(),
        )
    }

    fn closed() -> TransportEvent {
        TransportEvent::Closed {
            code: Some(1000),
            reason: String::new(),
        }
    }

    // ── start ───────────────────────────────────────────────────────

    #[test]
    fn token_scenario_connects_and_opens() {
        let credentials = MemoryCredentials::new().with("token", "abc123");
        let (mut session, _events, peer) = start_with("ws://host/ws/{id}", &credentials);

        assert_eq!(session.url().as_str(), "ws://host/ws/abc123");
        assert_eq!(peer.dialed()[0].as_str(), "ws://host/ws/abc123");
        assert_eq!(session.session_id().map(SessionId::as_str), Some("abc123"));
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert!(session.renderer().has_notice(&Notice::Connecting));

        session.handle(TransportEvent::Opened);
        assert_eq!(session.state(), ConnectionState::Open);
        assert!(session.renderer().has_notice(&Notice::Connected));
    }

    #[test]
    fn room_template_uses_room() {
        let (connector, peer) = loopback();
        let config = config("ws://host/ws/{room}/{id}").with_room("lobby");
        let credentials = MemoryCredentials::new().with("uid", "u-9");
        let (session, _events) =
            ChatSession::start(&config, &credentials, &connector, Transcript::new()).unwrap();
        assert_eq!(session.url().as_str(), "ws://host/ws/lobby/u-9");
        assert_eq!(peer.dialed().len(), 1);
    }

    #[test]
    fn missing_credential_never_dials() {
        let (connector, peer) = loopback();
        let mut transcript = Transcript::new();
        let credentials = MemoryCredentials::new().with("theme", "dark");

        let result: Result<(ChatSession<MemorySink, &mut Transcript>, _)> = ChatSession::start(
            &config("ws://host/ws/{id}"),
            &credentials,
            &connector,
            &mut transcript,
        );

        assert_matches!(result.map(|_| ()), Err(ChatError::MissingCredential { .. }));
        assert!(peer.dialed().is_empty());
        assert_eq!(transcript.len(), 1);
        let entry = transcript.last().unwrap();
        assert_eq!(entry.role, AuthorRole::System);
        assert!(entry.content.contains("no session credential found"));
    }

    #[test]
    fn invalid_target_never_dials() {
        let (connector, peer) = loopback();
        let mut transcript = Transcript::new();
        let config = config("ws://host/ws/{room}/{id}");
        let credentials = MemoryCredentials::new().with("uid", "x");

        let result: Result<(ChatSession<MemorySink, &mut Transcript>, _)> =
            ChatSession::start(&config, &credentials, &connector, &mut transcript);

        assert_matches!(result.map(|_| ()), Err(ChatError::InvalidTarget { .. }));
        assert!(peer.dialed().is_empty());
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn anonymous_template_skips_credentials() {
        let (session, _events, peer) = start_with("ws://host/ws", &MemoryCredentials::new());
        assert_eq!(session.url().as_str(), "ws://host/ws");
        assert!(session.session_id().is_none());
        assert_eq!(peer.dialed().len(), 1);
    }

    // ── inbound ─────────────────────────────────────────────────────

    #[test]
    fn remote_frame_becomes_remote_entry() {
        let (mut session, _peer) = open_session();
        let before = session.renderer().len();
        session.handle(frame("alice", "hi"));

        let transcript = session.renderer();
        assert_eq!(transcript.len(), before + 1);
        let entry = transcript.last().unwrap();
        assert_eq!(entry.author, "alice");
        assert_eq!(entry.content, "hi");
        assert_eq!(entry.role, AuthorRole::Remote);
    }

    #[test]
    fn roles_follow_author() {
        let (mut session, _peer) = open_session();
        session.handle(frame("you", "mine"));
        session.handle(frame("system", "server notice"));
        session.handle(frame("server", "theirs"));

        let roles: Vec<_> = session.renderer().entries()[2..].iter().map(|e| e.role).collect();
        assert_eq!(roles, [AuthorRole::Local, AuthorRole::System, AuthorRole::Remote]);
    }

    #[test]
    fn malformed_frame_does_not_disturb_neighbours() {
        let (mut session, _peer) = open_session();
        let (logs, _guard) = capture_logs();

        session.handle(frame("a", "1"));
        session.handle(TransportEvent::Text("{not json".into()));
        session.handle(TransportEvent::Text(r#"{"author":"x"}"#.into()));
        session.handle(frame("b", "2"));

        let messages: Vec<_> = session
            .renderer()
            .messages()
            .map(|e| e.content.as_str())
            .collect();
        assert_eq!(messages, ["1", "2"]);
        assert_eq!(session.state(), ConnectionState::Open);
        assert!(session.renderer().has_notice(&Notice::DroppedFrame));
        assert!(logs.has_event(tracing::Level::WARN, "dropping inbound frame"));
    }

    #[test]
    fn utf8_binary_frame_is_decoded() {
        let (mut session, _peer) = open_session();
        session.handle(TransportEvent::Binary(
            br#"{"author":"bin","content":"ok"}"#.to_vec(),
        ));
        assert_eq!(session.renderer().last().unwrap().author, "bin");
    }

    #[test]
    fn non_utf8_binary_frame_is_dropped() {
        let (mut session, _peer) = open_session();
        session.handle(TransportEvent::Binary(vec![0xff, 0xfe]));
        assert_eq!(
            session.renderer().last(),
            Some(&TranscriptEntry::from(Notice::DroppedFrame))
        );
        assert_eq!(session.state(), ConnectionState::Open);
    }

    #[test]
    fn frames_after_close_are_ignored() {
        let (mut session, _peer) = open_session();
        session.handle(closed());
        let len = session.renderer().len();
        session.handle(frame("late", "ignored"));
        assert_eq!(session.renderer().len(), len);
    }

    // ── lifecycle ───────────────────────────────────────────────────

    #[test]
    fn close_after_open_scenario() {
        let (mut session, peer) = open_session();
        session.handle(closed());

        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(session.renderer().has_notice(&Notice::Disconnected));

        let mut input = String::from("anyone?");
        let err = session.submit(&mut input).unwrap_err();
        assert_matches!(err, ChatError::SendRejected { state: ConnectionState::Closed });
        assert_eq!(input, "anyone?");
        assert!(peer.sent_frames().is_empty());
    }

    #[test]
    fn error_then_close_yields_single_terminal_notice() {
        let (mut session, peer) = open_session();
        session.handle(TransportEvent::Error("reset by peer".into()));
        session.handle(closed());

        assert_eq!(session.state(), ConnectionState::Errored);
        assert!(session.renderer().has_notice(&Notice::ConnectionError));
        assert!(!session.renderer().has_notice(&Notice::Disconnected));
        assert!(peer.is_closed());
    }

    #[test]
    fn handshake_failure_goes_straight_to_errored() {
        let credentials = MemoryCredentials::new().with("uid", "u");
        let (mut session, _events, _peer) = start_with("ws://host/ws/{id}", &credentials);
        session.handle(TransportEvent::Error("refused".into()));
        assert_eq!(session.state(), ConnectionState::Errored);
        assert!(!session.renderer().has_notice(&Notice::Connected));
    }

    #[test]
    fn open_never_reenters_connecting_or_reopens() {
        let (mut session, _peer) = open_session();
        session.handle(closed());
        session.handle(TransportEvent::Opened);
        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(!session.state().can_transition_to(ConnectionState::Connecting));
    }

    #[test]
    fn local_close_releases_transport() {
        let (mut session, peer) = open_session();
        session.close();
        assert!(peer.is_closed());
        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(session.renderer().has_notice(&Notice::Disconnected));

        let len = session.renderer().len();
        session.close();
        assert_eq!(session.renderer().len(), len);
    }

    // ── outbound ────────────────────────────────────────────────────

    #[test]
    fn send_while_open_transmits_raw_text_and_clears() {
        let (mut session, peer) = open_session();
        let mut input = String::from("  {\"not\": \"wrapped\"} ");
        session.submit(&mut input).unwrap();
        assert_eq!(peer.sent_frames(), ["  {\"not\": \"wrapped\"} "]);
        assert!(input.is_empty());
    }

    #[test]
    fn send_while_connecting_is_rejected() {
        let credentials = MemoryCredentials::new().with("uid", "u");
        let (mut session, _events, peer) = start_with("ws://host/ws/{id}", &credentials);

        let mut input = String::from("too early");
        let err = session.submit(&mut input).unwrap_err();
        assert_matches!(err, ChatError::SendRejected { state: ConnectionState::Connecting });
        assert_eq!(input, "too early");
        assert!(peer.sent_frames().is_empty());
        assert!(session.renderer().has_notice(&Notice::Unavailable));
    }

    #[test]
    fn send_while_errored_is_rejected() {
        let (mut session, peer) = open_session();
        session.handle(TransportEvent::Error("boom".into()));
        let mut input = String::from("x");
        assert!(session.submit(&mut input).is_err());
        assert_eq!(input, "x");
        assert!(peer.sent_frames().is_empty());
    }

    #[test]
    fn dead_sink_moves_to_errored_and_keeps_input() {
        let (mut session, peer) = open_session();
        peer.break_connection();
        let mut input = String::from("lost");
        assert_matches!(session.submit(&mut input), Err(ChatError::TransportRuntime(_)));
        assert_eq!(input, "lost");
        assert_eq!(session.state(), ConnectionState::Errored);
        assert!(session.renderer().has_notice(&Notice::ConnectionError));
    }

    #[test]
    fn empty_input_is_still_sent() {
        let (mut session, peer) = open_session();
        let mut input = String::new();
        session.submit(&mut input).unwrap();
        assert_eq!(peer.sent_frames(), [""]);
    }

    // ── properties ──────────────────────────────────────────────────

    proptest! {
        #[test]
        fn transcript_preserves_arrival_order(
            messages in proptest::collection::vec(("[a-z]{1,6}", ".*"), 0..24)
        ) {
            let (mut session, _peer) = open_session();
            for (author, content) in &messages {
                session.handle(frame(author, content));
            }
            let rendered: Vec<(String, String)> = session.renderer().entries()[2..]
                .iter()
                .map(|e| (e.author.clone(), e.content.clone()))
                .collect();
            prop_assert_eq!(rendered, messages);
        }
    }
}
