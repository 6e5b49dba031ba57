//! Line-oriented transcript renderer for the terminal.

use std::io::Write;

use chatbox_client::{Renderer, TranscriptEntry};
use chatbox_core::AuthorRole;
use tracing::warn;

/// Writes one line per transcript entry.
///
/// ```text
/// * connected
///   alice: hi
/// > you: hello
/// ```
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn append(&mut self, entry: TranscriptEntry) {
        let line = format_entry(&entry);
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!(error = %e, "failed to write transcript entry");
        }
    }
}

/// Format an entry for display. Control characters other than newline and
/// tab are replaced so remote text cannot drive the terminal.
pub fn format_entry(entry: &TranscriptEntry) -> String {
    let author = sanitize(&entry.author);
    let content = sanitize(&entry.content);
    match entry.role {
        AuthorRole::Local => format!("> {author}: {content}"),
        AuthorRole::Remote => format!("  {author}: {content}"),
        AuthorRole::System => format!("* {content}"),
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                char::REPLACEMENT_CHARACTER
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbox_client::Notice;
    use chatbox_core::ChatEvent;

    #[test]
    fn roles_get_distinct_prefixes() {
        let local = TranscriptEntry::from(ChatEvent::new("you", "hello"));
        let remote = TranscriptEntry::from(ChatEvent::new("alice", "hi"));
        let system = TranscriptEntry::from(Notice::Connected);

        assert_eq!(format_entry(&local), "> you: hello");
        assert_eq!(format_entry(&remote), "  alice: hi");
        assert_eq!(format_entry(&system), "* connected");
    }

    #[test]
    fn escape_sequences_are_neutralized() {
        let entry = TranscriptEntry::from(ChatEvent::new("mallory", "\u{1b}[2Jgone"));
        assert_eq!(format_entry(&entry), "  mallory: \u{fffd}[2Jgone");
    }

    #[test]
    fn writes_one_line_per_entry() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.append(Notice::Connecting.into());
        renderer.append(ChatEvent::new("bob", "yo").into());

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(out, "* connecting…\n  bob: yo\n");
    }
}
