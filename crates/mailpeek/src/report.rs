//! Console report of fetched messages.

use mailpeek_mime::{ExtractionError, Message};
use std::fmt;
use std::io::{self, Write};
use tracing::error;

/// Width of the line printed after each message.
pub const SEPARATOR_WIDTH: usize = 80;

/// Printable fields of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Message ID.
    pub id: String,
    /// `Subject` header.
    pub subject: String,
    /// `From` header.
    pub from: String,
    /// `Date` header.
    pub date: String,
    /// Extracted plaintext body.
    pub content: String,
}

impl TryFrom<&Message> for Summary {
    type Error = ExtractionError;

    fn try_from(message: &Message) -> Result<Self, Self::Error> {
        let content = message.body_text()?;
        Ok(Self {
            id: message.id.clone(),
            subject: message.subject().to_string(),
            from: message.from().to_string(),
            date: message.date().to_string(),
            content,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "From: {}", self.from)?;
        writeln!(f, "Date: {}", self.date)?;
        writeln!(f, "Content:")?;
        writeln!(f, "{}", self.content)?;
        writeln!(f, "{}", "-".repeat(SEPARATOR_WIDTH))
    }
}

/// Counts of a finished report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    /// Messages written.
    pub printed: usize,
    /// Messages skipped after an extraction error.
    pub skipped: usize,
}

/// Writes one block per message to `out`.
#[derive(Debug)]
pub struct Report<W> {
    out: W,
}

impl<W: Write> Report<W> {
    /// Creates a report writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes every message in order. A message that cannot be summarized is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing to the output fails.
    pub fn print_all(&mut self, messages: &[Message]) -> io::Result<ReportStats> {
        let mut stats = ReportStats::default();

        for message in messages {
            match Summary::try_from(message) {
                Ok(summary) => {
                    write!(self.out, "{summary}")?;
                    stats.printed += 1;
                }
                Err(e) => {
                    error!(id = %message.id, kind = e.kind(), "Failed to process message: {e}");
                    stats.skipped += 1;
                }
            }
        }

        self.out.flush()?;
        Ok(stats)
    }

    /// Returns the underlying writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use mailpeek_mime::{Headers, MessagePart, NO_READABLE_CONTENT};

    fn message(id: &str, payload: MessagePart) -> Message {
        let mut headers = Headers::new();
        headers.add("From", "alice@example.com");
        headers.add("Subject", "Quarterly numbers");
        headers.add("Date", "Tue, 2 Jan 2024 09:30:00 +0000");
        Message::new(id, payload).with_headers(headers)
    }

    fn render(messages: &[Message]) -> (String, ReportStats) {
        let mut report = Report::new(Vec::new());
        let stats = report.print_all(messages).unwrap();
        (String::from_utf8(report.into_inner()).unwrap(), stats)
    }

    #[test]
    fn test_block_layout() {
        let (out, stats) = render(&[message("m1", MessagePart::leaf("text/plain", "aGVsbG8="))]);

        let expected = format!(
            "ID: m1\nSubject: Quarterly numbers\nFrom: alice@example.com\n\
             Date: Tue, 2 Jan 2024 09:30:00 +0000\nContent:\nhello\n{}\n",
            "-".repeat(80)
        );
        assert_eq!(out, expected);
        assert_eq!(stats, ReportStats { printed: 1, skipped: 0 });
    }

    #[test]
    fn test_missing_headers_print_empty() {
        let bare = Message::new("m2", MessagePart::empty("multipart/mixed"));
        let (out, _) = render(&[bare]);

        assert!(out.starts_with("ID: m2\nSubject: \nFrom: \nDate: \nContent:\n"));
        assert!(out.contains(NO_READABLE_CONTENT));
    }

    #[test]
    fn test_failures_are_skipped() {
        let no_payload = Message {
            id: "broken".into(),
            ..Message::default()
        };
        let no_id = Message::new("", MessagePart::leaf("text/plain", "aGVsbG8="));
        let good = message("ok", MessagePart::leaf("text/plain", "aGVsbG8="));

        let (out, stats) = render(&[no_payload, good, no_id]);

        assert_eq!(stats, ReportStats { printed: 1, skipped: 2 });
        assert_eq!(out.matches("ID: ").count(), 1);
        assert!(out.starts_with("ID: ok\n"));
    }

    #[test]
    fn test_summary_errors() {
        let no_payload = Message {
            id: "x".into(),
            ..Message::default()
        };
        assert_eq!(
            Summary::try_from(&no_payload),
            Err(ExtractionError::MissingPayload { id: "x".into() })
        );
        let no_id = Message::new("", MessagePart::empty("text/plain"));
        assert_eq!(Summary::try_from(&no_id), Err(ExtractionError::MissingId));
    }

    #[test]
    fn test_separator_width() {
        let (out, _) = render(&[message("m1", MessagePart::leaf("text/plain", "QQ"))]);
        let last = out.lines().last().unwrap();
        assert_eq!(last.len(), SEPARATOR_WIDTH);
        assert!(last.chars().all(|c| c == '-'));
    }
}
