//! Plaintext extraction from a payload tree.

use crate::encoding::decode_base64url;
use crate::part::MessagePart;

/// Returned by [`extract`] when the payload has neither body data nor children.
pub const NO_READABLE_CONTENT: &str = "No readable content";

/// The only MIME type whose body is collected.
pub const TEXT_PLAIN: &str = "text/plain";

/// Produces the readable body of a message payload.
///
/// Inline data on the payload itself wins over its children, whatever the
/// declared type. Otherwise the children are walked with
/// [`extract_from_parts`].
#[must_use]
pub fn extract(payload: &MessagePart) -> String {
    match payload {
        MessagePart::Leaf { data, .. }
        | MessagePart::Container {
            data: Some(data), ..
        } => decode_base64url(data),
        MessagePart::Container { children, .. } => extract_from_parts(children),
        MessagePart::Empty { .. } => NO_READABLE_CONTENT.to_string(),
    }
}

/// Concatenates the decoded body of every `text/plain` part, depth first.
///
/// Every matching leaf is appended in encounter order with no separator,
/// so a `multipart/alternative` with several plain variants yields all of
/// them. Children of non-text parts are still walked.
#[must_use]
pub fn extract_from_parts(parts: &[MessagePart]) -> String {
    let mut text = String::new();
    for part in parts {
        append_part(part, &mut text);
    }
    text
}

fn append_part(part: &MessagePart, out: &mut String) {
    if part.mime_type() == TEXT_PLAIN
        && let Some(data) = part.data()
    {
        out.push_str(&decode_base64url(data));
    }

    for child in part.children() {
        append_part(child, out);
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
    use crate::encoding::encode_base64url;

    fn plain(text: &str) -> MessagePart {
        MessagePart::leaf(TEXT_PLAIN, encode_base64url(text.as_bytes()))
    }

    #[test]
    fn test_payload_data_wins_over_children() {
        let payload = MessagePart::new(
            "multipart/mixed",
            Some("aGVsbG8=".into()),
            vec![plain("ignored")],
        );
        assert_eq!(extract(&payload), "hello");
    }

    #[test]
    fn test_payload_leaf_of_any_type_is_decoded() {
        let payload = MessagePart::leaf("text/html", "PGI-aGk8L2I-");
        assert_eq!(extract(&payload), "<b>hi</b>");
    }

    #[test]
    fn test_payload_without_content_is_sentinel() {
        assert_eq!(extract(&MessagePart::empty("text/plain")), NO_READABLE_CONTENT);
    }

    #[test]
    fn test_payload_children_are_concatenated() {
        let children = vec![plain("A"), MessagePart::leaf("text/html", "PGI-"), plain("B")];
        let payload = MessagePart::container("multipart/mixed", children.clone());
        assert_eq!(extract(&payload), extract_from_parts(&children));
        assert_eq!(extract(&payload), "AB");
    }

    #[test]
    fn test_container_with_no_text_yields_empty_not_sentinel() {
        let payload = MessagePart::container(
            "multipart/mixed",
            vec![MessagePart::empty("application/pdf")],
        );
        assert_eq!(extract(&payload), "");
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(extract_from_parts(&[]), "");
    }

    #[test]
    fn test_single_plain_leaf() {
        let parts = [MessagePart::leaf(TEXT_PLAIN, "aGVsbG8=")];
        assert_eq!(extract_from_parts(&parts), "hello");
    }

    #[test]
    fn test_plain_part_without_data_uses_child() {
        let parts = [MessagePart::container(
            TEXT_PLAIN,
            vec![MessagePart::leaf(TEXT_PLAIN, "d29ybGQ=")],
        )];
        assert_eq!(extract_from_parts(&parts), "world");
    }

    #[test]
    fn test_sibling_plain_leaves_accumulate() {
        assert_eq!(extract_from_parts(&[plain("A"), plain("B")]), "AB");
    }

    #[test]
    fn test_html_is_skipped_but_children_walked() {
        let parts = [
            MessagePart::leaf("text/html", "PGI-aGk8L2I-"),
            MessagePart::container("multipart/related", vec![plain("deep")]),
        ];
        assert_eq!(extract_from_parts(&parts), "deep");
    }

    #[test]
    fn test_malformed_plain_part_with_data_and_children() {
        let parts = [MessagePart::new(
            TEXT_PLAIN,
            Some(encode_base64url(b"own ")),
            vec![plain("child")],
        )];
        assert_eq!(extract_from_parts(&parts), "own child");
    }

    #[test]
    fn test_alternative_duplicates_are_preserved() {
        // multipart/mixed > [multipart/alternative > [plain, html], plain]
        let alternative = MessagePart::container(
            "multipart/alternative",
            vec![plain("Hi"), MessagePart::leaf("text/html", "PGI-")],
        );
        let parts = [alternative, plain(" PS")];
        assert_eq!(extract_from_parts(&parts), "Hi PS");
    }

    #[test]
    fn test_mime_type_match_is_exact() {
        let parts = [MessagePart::leaf("Text/Plain", "aGVsbG8=")];
        assert_eq!(extract_from_parts(&parts), "");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let parts = [MessagePart::leaf(TEXT_PLAIN, encode_base64url(&[b'o', b'k', 0xC3]))];
        assert_eq!(extract_from_parts(&parts), "ok\u{FFFD}");
    }
}
