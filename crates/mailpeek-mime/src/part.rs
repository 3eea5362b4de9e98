//! MIME part tree.

/// One node of a message payload tree.
///
/// Built from the Gmail `payload` JSON. Absent `body.data` or `parts` fields
/// are treated as empty, so every input maps onto one of the variants.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "wire::WirePart"))]
pub enum MessagePart {
    /// Content leaf with non-empty base64url body data.
    Leaf {
        /// Declared MIME type, e.g. `text/plain`.
        mime_type: String,
        /// Base64url-encoded body.
        data: String,
    },
    /// Multipart container with at least one child.
    Container {
        /// Declared MIME type, e.g. `multipart/alternative`.
        mime_type: String,
        /// Child parts in document order.
        children: Vec<MessagePart>,
        /// Inline body data found on a container. Only malformed input sets this.
        data: Option<String>,
    },
    /// Part with neither body data nor children, such as an attachment stub.
    Empty {
        /// Declared MIME type.
        mime_type: String,
    },
}

impl MessagePart {
    /// Builds a part from optional fields, picking the matching variant.
    ///
    /// Empty data strings count as absent.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: Option<String>, children: Vec<Self>) -> Self {
        let mime_type = mime_type.into();
        let data = data.filter(|d| !d.is_empty());

        match (data, children.is_empty()) {
            (Some(data), true) => Self::Leaf { mime_type, data },
            (data, false) => Self::Container {
                mime_type,
                children,
                data,
            },
            (None, true) => Self::Empty { mime_type },
        }
    }

    /// Creates a content leaf. Empty data yields [`MessagePart::Empty`].
    #[must_use]
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(mime_type, Some(data.into()), Vec::new())
    }

    /// Creates a container. No children yields [`MessagePart::Empty`].
    #[must_use]
    pub fn container(mime_type: impl Into<String>, children: Vec<Self>) -> Self {
        Self::new(mime_type, None, children)
    }

    /// Creates a part with no content.
    #[must_use]
    pub fn empty(mime_type: impl Into<String>) -> Self {
        Self::Empty {
            mime_type: mime_type.into(),
        }
    }

    /// Declared MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Leaf { mime_type, .. }
            | Self::Container { mime_type, .. }
            | Self::Empty { mime_type } => mime_type,
        }
    }

    /// Inline body data, if any.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Leaf { data, .. } => Some(data.as_str()),
            Self::Container { data, .. } => data.as_deref(),
            Self::Empty { .. } => None,
        }
    }

    /// Child parts; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Container { children, .. } => children,
            Self::Leaf { .. } | Self::Empty { .. } => &[],
        }
    }
}

#[cfg(feature = "serde")]
pub(crate) mod wire {
    use super::MessagePart;
    use crate::header::Header;
    use serde::Deserialize;

    /// `MessagePartBody` as sent by Gmail.
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WireBody {
        #[serde(default)]
        pub data: Option<String>,
    }

    /// `MessagePart` as sent by Gmail. `headers` only matter on the root.
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WirePart {
        #[serde(default)]
        pub mime_type: String,
        #[serde(default)]
        pub headers: Vec<Header>,
        #[serde(default)]
        pub body: Option<WireBody>,
        #[serde(default)]
        pub parts: Option<Vec<WirePart>>,
    }

    impl From<WirePart> for MessagePart {
        fn from(part: WirePart) -> Self {
            let children = part
                .parts
                .unwrap_or_default()
                .into_iter()
                .map(Self::from)
                .collect();
            Self::new(part.mime_type, part.body.and_then(|b| b.data), children)
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

    #[test]
    fn test_new_picks_leaf() {
        let part = MessagePart::new("text/plain", Some("aGk=".into()), Vec::new());
        assert_eq!(
            part,
            MessagePart::Leaf {
                mime_type: "text/plain".into(),
                data: "aGk=".into()
            }
        );
    }

    #[test]
    fn test_new_empty_data_is_absent() {
        let part = MessagePart::new("text/plain", Some(String::new()), Vec::new());
        assert_eq!(part, MessagePart::empty("text/plain"));
    }

    #[test]
    fn test_new_keeps_stray_container_data() {
        let child = MessagePart::leaf("text/plain", "aGk=");
        let part = MessagePart::new("multipart/mixed", Some("eA==".into()), vec![child.clone()]);
        assert_eq!(part.data(), Some("eA=="));
        assert_eq!(part.children(), &[child]);
    }

    #[test]
    fn test_accessors() {
        let part = MessagePart::container(
            "multipart/alternative",
            vec![MessagePart::leaf("text/plain", "aGk="), MessagePart::empty("text/html")],
        );
        assert_eq!(part.mime_type(), "multipart/alternative");
        assert_eq!(part.data(), None);
        assert_eq!(part.children().len(), 2);
        assert_eq!(part.children()[1].children().len(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_nested_payload() {
        let json = r#"{
            "partId": "",
            "mimeType": "multipart/alternative",
            "filename": "",
            "body": {"size": 0},
            "parts": [
                {"partId": "0", "mimeType": "text/plain", "body": {"size": 5, "data": "aGVsbG8="}},
                {"partId": "1", "mimeType": "application/pdf", "filename": "a.pdf",
                 "body": {"size": 9000, "attachmentId": "ANGjdJ"}}
            ]
        }"#;

        let part: MessagePart = serde_json::from_str(json).unwrap();
        assert_eq!(
            part,
            MessagePart::container(
                "multipart/alternative",
                vec![
                    MessagePart::leaf("text/plain", "aGVsbG8="),
                    MessagePart::empty("application/pdf"),
                ]
            )
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_missing_fields() {
        let part: MessagePart = serde_json::from_str("{}").unwrap();
        assert_eq!(part, MessagePart::empty(""));
    }
}
