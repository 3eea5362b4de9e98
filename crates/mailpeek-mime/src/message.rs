//! Fetched message structure.

use std::collections::BTreeSet;

use crate::error::{ExtractionError, Result};
use crate::extract::extract;
use crate::header::Headers;
use crate::part::MessagePart;

/// One email as returned by the Gmail `messages.get` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "wire::WireMessage"))]
pub struct Message {
    /// Immutable message ID.
    pub id: String,
    /// ID of the thread the message belongs to.
    pub thread_id: String,
    /// Label IDs applied to the message.
    pub label_ids: BTreeSet<String>,
    /// Short preview of the message text.
    pub snippet: String,
    /// Root of the MIME part tree.
    pub payload: Option<MessagePart>,
    /// Estimated size in bytes.
    pub size_estimate: Option<u64>,
    /// ID of the last history record that modified this message.
    pub history_id: Option<String>,
    /// Internal timestamp in epoch milliseconds, as sent.
    pub internal_date: Option<String>,
    /// Top-level headers, in order.
    pub headers: Headers,
}

impl Message {
    /// Creates a message with the given ID and payload.
    #[must_use]
    pub fn new(id: impl Into<String>, payload: MessagePart) -> Self {
        Self {
            id: id.into(),
            payload: Some(payload),
            ..Self::default()
        }
    }

    /// Sets the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the thread ID.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    /// Returns the first header named exactly `name`, or `""`.
    #[must_use]
    pub fn header(&self, name: &str) -> &str {
        self.headers.get(name)
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.header("Subject")
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> &str {
        self.header("From")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> &str {
        self.header("Date")
    }

    /// Returns the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the message has no ID or no payload.
    pub fn require_payload(&self) -> Result<&MessagePart> {
        if self.id.is_empty() {
            return Err(ExtractionError::MissingId);
        }
        self.payload
            .as_ref()
            .ok_or_else(|| ExtractionError::MissingPayload {
                id: self.id.clone(),
            })
    }

    /// Extracts the readable body.
    ///
    /// # Errors
    ///
    /// Returns an error if the message has no ID or no payload.
    pub fn body_text(&self) -> Result<String> {
        self.require_payload().map(extract)
    }
}

#[cfg(feature = "serde")]
mod wire {
    use super::Message;
    use crate::header::Headers;
    use crate::part::MessagePart;
    use crate::part::wire::WirePart;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WireMessage {
        #[serde(default)]
        id: String,
        #[serde(default)]
        thread_id: String,
        #[serde(default)]
        label_ids: Vec<String>,
        #[serde(default)]
        snippet: String,
        #[serde(default)]
        payload: Option<WirePart>,
        #[serde(default)]
        size_estimate: Option<u64>,
        #[serde(default)]
        history_id: Option<String>,
        #[serde(default)]
        internal_date: Option<String>,
    }

    impl From<WireMessage> for Message {
        fn from(msg: WireMessage) -> Self {
            let (headers, payload): (Headers, Option<MessagePart>) = match msg.payload {
                Some(mut part) => {
                    let headers = std::mem::take(&mut part.headers);
                    (headers.into(), Some(MessagePart::from(part)))
                }
                None => (Headers::new(), None),
            };

            Self {
                id: msg.id,
                thread_id: msg.thread_id,
                label_ids: msg.label_ids.into_iter().collect(),
                snippet: msg.snippet,
                payload,
                size_estimate: msg.size_estimate,
                history_id: msg.history_id,
                internal_date: msg.internal_date,
                headers,
            }
        }
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
    use crate::extract::NO_READABLE_CONTENT;

    #[test]
    fn test_header_accessors() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("Subject", "Test");
        let message = Message::new("m1", MessagePart::empty("text/plain")).with_headers(headers);

        assert_eq!(message.from(), "sender@example.com");
        assert_eq!(message.subject(), "Test");
        assert_eq!(message.date(), "");
        assert_eq!(message.header("X-Missing"), "");
    }

    #[test]
    fn test_body_text() {
        let message = Message::new("m1", MessagePart::leaf("text/plain", "aGVsbG8="));
        assert_eq!(message.body_text().unwrap(), "hello");

        let message = Message::new("m2", MessagePart::empty("text/plain"));
        assert_eq!(message.body_text().unwrap(), NO_READABLE_CONTENT);
    }

    #[test]
    fn test_missing_payload() {
        let message = Message {
            id: "m1".into(),
            ..Message::default()
        };
        assert_eq!(
            message.body_text().unwrap_err(),
            ExtractionError::MissingPayload { id: "m1".into() }
        );
    }

    #[test]
    fn test_missing_id() {
        let message = Message::new("", MessagePart::empty("text/plain"));
        assert_eq!(message.require_payload().unwrap_err(), ExtractionError::MissingId);
        assert_eq!(ExtractionError::MissingId.kind(), "missing_id");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_full_message() {
        let json = r#"{
            "id": "18c1f",
            "threadId": "18c1e",
            "labelIds": ["UNREAD", "INBOX", "UNREAD"],
            "snippet": "Hello there",
            "sizeEstimate": 4521,
            "historyId": "991",
            "internalDate": "1700000000000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "Alice <alice@example.com>"},
                    {"name": "Subject", "value": "Greetings"},
                    {"name": "Date", "value": "Tue, 14 Nov 2023 22:13:20 +0000"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"mimeType": "text/plain", "body": {"size": 5, "data": "aGVsbG8"}},
                    {"mimeType": "text/html", "body": {"size": 12, "data": "PGI-aGk8L2I-"}}
                ]
            }
        }"#;

        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, "18c1f");
        assert_eq!(message.thread_id, "18c1e");
        assert_eq!(message.label_ids.len(), 2);
        assert!(message.label_ids.contains("INBOX"));
        assert_eq!(message.size_estimate, Some(4521));
        assert_eq!(message.history_id.as_deref(), Some("991"));
        assert_eq!(message.internal_date.as_deref(), Some("1700000000000"));
        assert_eq!(message.from(), "Alice <alice@example.com>");
        assert_eq!(message.subject(), "Greetings");
        assert_eq!(message.body_text().unwrap(), "hello");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_without_payload() {
        let message: Message = serde_json::from_str(r#"{"id": "x", "threadId": "y"}"#).unwrap();
        assert!(message.payload.is_none());
        assert!(message.headers.is_empty());
    }
}
