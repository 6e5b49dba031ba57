//! Connection target templates.
//!
//! A template is a `ws://` or `wss://` URL with up to one `{room}` and up to
//! one `{id}` placeholder:
//!
//! | Template | Rendered |
//! |---|---|
//! | `ws://host/ws/{id}` | `ws://host/ws/abc123` |
//! | `ws://host/ws/{room}/{id}` | `ws://host/ws/lobby/abc123` |
//! | `ws://host/ws` | `ws://host/ws` (anonymous) |
//!
//! Whether the template contains `{id}` decides the [`IdentityMode`]: an
//! anonymous template never consults credentials. Substituted values are
//! percent-encoded so an identifier cannot add path segments, and a value of
//! exactly `.` or `..` is rejected so it cannot remove one.

use chatbox_core::errors::{ChatError, Result};
use chatbox_core::ids::{RoomId, SessionId};
use url::Url;

const ROOM_PLACEHOLDER: &str = "{room}";
const ID_PLACEHOLDER: &str = "{id}";

/// Whether a connection carries a session identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityMode {
    /// The target has an `{id}` segment; credentials must resolve.
    Required,
    /// The target has no identifier segment.
    Anonymous,
}

/// Parsed, validated connection target template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetTemplate {
    raw: String,
    identity: IdentityMode,
    has_room: bool,
}

impl TargetTemplate {
    /// Parse and validate a template string.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ChatError::InvalidTarget {
            template: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let rooms = raw.matches(ROOM_PLACEHOLDER).count();
        let ids = raw.matches(ID_PLACEHOLDER).count();
        if rooms > 1 {
            return Err(invalid("at most one {room} placeholder is allowed"));
        }
        if ids > 1 {
            return Err(invalid("at most one {id} placeholder is allowed"));
        }

        let probe = raw
            .replace(ROOM_PLACEHOLDER, "room")
            .replace(ID_PLACEHOLDER, "id");
        let _ = validate_url(raw, &probe)?;

        Ok(Self {
            raw: raw.to_owned(),
            identity: if ids == 1 {
                IdentityMode::Required
            } else {
                IdentityMode::Anonymous
            },
            has_room: rooms == 1,
        })
    }

    /// Build the canonical `base[/{room}][/{id}]` template.
    pub fn from_base(base: &str, with_room: bool, identity: IdentityMode) -> Result<Self> {
        let mut raw = base.trim_end_matches('/').to_owned();
        if with_room {
            raw.push('/');
            raw.push_str(ROOM_PLACEHOLDER);
        }
        if identity == IdentityMode::Required {
            raw.push('/');
            raw.push_str(ID_PLACEHOLDER);
        }
        Self::parse(&raw)
    }

    /// Template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether rendering needs a session identifier.
    #[must_use]
    pub fn identity(&self) -> IdentityMode {
        self.identity
    }

    /// Whether rendering needs a room.
    #[must_use]
    pub fn expects_room(&self) -> bool {
        self.has_room
    }

    /// Substitute the room and identifier and return the final URL.
    ///
    /// The room must be given exactly when the template has `{room}`. The
    /// identifier is required for [`IdentityMode::Required`] and ignored for
    /// anonymous templates.
    pub fn render(&self, room: Option<&RoomId>, id: Option<&SessionId>) -> Result<Url> {
        let invalid = |reason: &str| ChatError::InvalidTarget {
            template: self.raw.clone(),
            reason: reason.to_owned(),
        };

        // `.` and `..` survive percent-encoding (even as `%2E`) and would be
        // resolved away by the URL parser.
        let segment = |what: &str, value: &str| -> Result<String> {
            if matches!(value, "." | "..") {
                return Err(invalid(&format!("{what} '{value}' is a dot path segment")));
            }
            Ok(urlencoding::encode(value).into_owned())
        };

        let mut rendered = self.raw.clone();
        match (self.has_room, room) {
            (true, Some(room)) => {
                rendered = rendered.replace(ROOM_PLACEHOLDER, &segment("room", room)?);
            }
            (true, None) => return Err(invalid("template has {room} but no room is configured")),
            (false, Some(_)) => {
                return Err(invalid("a room is configured but the template has no {room}"));
            }
            (false, None) => {}
        }
        if self.identity == IdentityMode::Required {
            let id = id.ok_or_else(|| invalid("template has {id} but no identifier was resolved"))?;
            rendered = rendered.replace(ID_PLACEHOLDER, &segment("identifier", id)?);
        }

        validate_url(&self.raw, &rendered)
    }
}

fn validate_url(template: &str, candidate: &str) -> Result<Url> {
    let invalid = |reason: String| ChatError::InvalidTarget {
        template: template.to_owned(),
        reason,
    };
    let url = Url::parse(candidate).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(invalid(format!(
            "scheme must be ws or wss, got '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(url)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // ── parse ───────────────────────────────────────────────────────

    #[test]
    fn id_template_requires_identity() {
        let t = TargetTemplate::parse("ws://host/ws/{id}").unwrap();
        assert_eq!(t.identity(), IdentityMode::Required);
        assert!(!t.expects_room());
    }

    #[test]
    fn bare_template_is_anonymous() {
        let t = TargetTemplate::parse("ws://host/ws").unwrap();
        assert_eq!(t.identity(), IdentityMode::Anonymous);
    }

    #[test]
    fn room_and_id_template() {
        let t = TargetTemplate::parse("wss://chat.example/ws/{room}/{id}").unwrap();
        assert!(t.expects_room());
        assert_eq!(t.identity(), IdentityMode::Required);
    }

    #[test]
    fn rejects_http_scheme() {
        let err = TargetTemplate::parse("http://host/ws/{id}").unwrap_err();
        assert_matches!(err, ChatError::InvalidTarget { reason, .. } if reason.contains("ws or wss"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(TargetTemplate::parse("not a url").is_err());
    }

    #[test]
    fn rejects_duplicate_placeholders() {
        assert!(TargetTemplate::parse("ws://h/{id}/{id}").is_err());
        assert!(TargetTemplate::parse("ws://h/{room}/{room}/{id}").is_err());
    }

    // ── from_base ───────────────────────────────────────────────────

    #[test]
    fn from_base_composes_segments() {
        let t = TargetTemplate::from_base("ws://host/ws/", true, IdentityMode::Required).unwrap();
        assert_eq!(t.as_str(), "ws://host/ws/{room}/{id}");

        let t = TargetTemplate::from_base("ws://host/ws", false, IdentityMode::Anonymous).unwrap();
        assert_eq!(t.as_str(), "ws://host/ws");
    }

    // ── render ──────────────────────────────────────────────────────

    #[test]
    fn renders_identifier_scenario() {
        let t = TargetTemplate::parse("ws://host/ws/{id}").unwrap();
        let url = t.render(None, Some(&SessionId::from("abc123"))).unwrap();
        assert_eq!(url.as_str(), "ws://host/ws/abc123");
    }

    #[test]
    fn renders_room_then_identifier() {
        let t = TargetTemplate::parse("ws://127.0.0.1:8000/ws/{room}/{id}").unwrap();
        let url = t
            .render(Some(&RoomId::from("9b1d")), Some(&SessionId::from("5f1c")))
            .unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws/9b1d/5f1c");
    }

    #[test]
    fn anonymous_ignores_identifier() {
        let t = TargetTemplate::parse("ws://host/ws").unwrap();
        let url = t.render(None, Some(&SessionId::from("unused"))).unwrap();
        assert_eq!(url.as_str(), "ws://host/ws");
        assert_eq!(t.render(None, None).unwrap().as_str(), "ws://host/ws");
    }

    #[test]
    fn identifier_is_percent_encoded() {
        let t = TargetTemplate::parse("ws://host/ws/{id}").unwrap();
        let url = t.render(None, Some(&SessionId::from("a/b c"))).unwrap();
        assert_eq!(url.as_str(), "ws://host/ws/a%2Fb%20c");
    }

    #[test]
    fn dot_segments_are_rejected() {
        let t = TargetTemplate::parse("ws://host/ws/{room}/{id}").unwrap();
        let err = t
            .render(Some(&RoomId::from(".")), Some(&SessionId::from("abc")))
            .unwrap_err();
        assert_matches!(err, ChatError::InvalidTarget { ref reason, .. } if reason.contains("room"));

        let t = TargetTemplate::parse("ws://host/ws/{id}").unwrap();
        assert_matches!(
            t.render(None, Some(&SessionId::from(".."))),
            Err(ChatError::InvalidTarget { .. })
        );
    }

    #[test]
    fn dots_inside_a_segment_are_kept() {
        let t = TargetTemplate::parse("ws://host/ws/{id}").unwrap();
        let url = t.render(None, Some(&SessionId::from("a..b"))).unwrap();
        assert_eq!(url.as_str(), "ws://host/ws/a..b");
        let url = t.render(None, Some(&SessionId::from("..."))).unwrap();
        assert_eq!(url.path(), "/ws/...");
    }

    #[test]
    fn missing_room_is_error() {
        let t = TargetTemplate::parse("ws://host/ws/{room}/{id}").unwrap();
        assert!(t.render(None, Some(&SessionId::from("x"))).is_err());
    }

    #[test]
    fn unexpected_room_is_error() {
        let t = TargetTemplate::parse("ws://host/ws/{id}").unwrap();
        let err = t
            .render(Some(&RoomId::from("lobby")), Some(&SessionId::from("x")))
            .unwrap_err();
        assert_matches!(err, ChatError::InvalidTarget { .. });
    }

    #[test]
    fn missing_identifier_is_error() {
        let t = TargetTemplate::parse("ws://host/ws/{id}").unwrap();
        assert!(t.render(None, None).is_err());
    }
}
