//! Gmail batch endpoint encoding.
//!
//! A batch request is a `multipart/mixed` body with one `application/http`
//! part per sub-request, each tagged `Content-ID: <item{i}>`. The response
//! carries one part per sub-request tagged `<response-item{i}>`, in whatever
//! order the server chooses. Both directions are plain functions so they can
//! be tested without a server.

use crate::error::{Error, ItemError, Result};
use crate::model::GmailApiError;
use mailpeek_mime::Message;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::HashMap;
use tracing::warn;

/// Maximum sub-requests per batch accepted by Gmail.
pub const MAX_BATCH_SIZE: usize = 100;

const BOUNDARY_LEN: usize = 24;

/// Outcome of one sub-request, keyed by its position in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Position of the ID in the requested list.
    pub index: usize,
    /// Requested message ID.
    pub id: String,
    /// Fetched message or the reason it is missing.
    pub result: std::result::Result<Message, ItemError>,
}

/// Generates a random multipart boundary.
#[must_use]
pub fn new_boundary() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_LEN)
        .map(char::from)
        .collect();
    format!("batch_{suffix}")
}

/// Builds the `multipart/mixed` body fetching each message in full format.
#[must_use]
pub fn build_request_body<S: AsRef<str>>(ids: &[S], boundary: &str) -> String {
    let mut body = String::new();
    for (i, id) in ids.iter().enumerate() {
        body.push_str(&format!("--{boundary}\r\n"));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str(&format!("Content-ID: <item{i}>\r\n\r\n"));
        body.push_str(&format!(
            "GET /gmail/v1/users/me/messages/{}?format=full\r\n\r\n",
            id.as_ref()
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

/// Parses a batch response into one [`BatchItem`] per requested ID, ordered
/// by request index.
///
/// IDs without a matching response part get [`ItemError::Missing`]. Both
/// `\r\n` and `\n` line endings are accepted.
///
/// # Errors
///
/// Returns [`Error::InvalidBatch`] if the content type has no boundary or the
/// body is not a complete multipart document.
pub fn parse_response<S: AsRef<str>>(
    content_type: &str,
    body: &str,
    ids: &[S],
) -> Result<Vec<BatchItem>> {
    let boundary = boundary_param(content_type)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| {
            Error::InvalidBatch(format!("no boundary in content type {content_type:?}"))
        })?;
    let delimiter = format!("--{boundary}");

    let mut segments = body.split(delimiter.as_str());
    // Preamble before the first delimiter
    segments.next();

    let mut results = HashMap::new();
    let mut closed = false;
    for segment in segments {
        if segment.starts_with("--") {
            closed = true;
            break;
        }

        let part = segment.replace("\r\n", "\n");
        match parse_part(&part) {
            Some((index, result)) if index < ids.len() => {
                results.entry(index).or_insert(result);
            }
            Some((index, _)) => warn!(index, "Batch part refers to an unknown request"),
            None => warn!("Skipping batch part without a Content-ID"),
        }
    }

    if !closed {
        return Err(Error::InvalidBatch("missing closing boundary".into()));
    }

    Ok(ids
        .iter()
        .enumerate()
        .map(|(index, id)| BatchItem {
            index,
            id: id.as_ref().to_owned(),
            result: results.remove(&index).unwrap_or(Err(ItemError::Missing)),
        })
        .collect())
}

fn boundary_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Parses `<response-item3>` (or `<item3>`) into `3`.
fn content_index(value: &str) -> Option<usize> {
    let id = value.trim().trim_start_matches('<').trim_end_matches('>');
    let id = id.strip_prefix("response-").unwrap_or(id);
    id.strip_prefix("item")?.parse().ok()
}

/// Splits one part into its index and outcome. Line endings are `\n`.
fn parse_part(part: &str) -> Option<(usize, std::result::Result<Message, ItemError>)> {
    let part = part.trim_start_matches('\n');
    let (mime_headers, http) = part.split_once("\n\n")?;

    let index = mime_headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-id")
            .then(|| content_index(value))
            .flatten()
    })?;

    let (head, json) = http.split_once("\n\n").unwrap_or((http, ""));
    let json = json.trim();
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok());

    let result = match status {
        Some(code) if (200..300).contains(&code) => {
            serde_json::from_str::<Message>(json).map_err(|e| ItemError::Decode(e.to_string()))
        }
        Some(code) => Err(api_error(code, json)),
        None => Err(ItemError::Decode("sub-response has no status line".into())),
    };
    Some((index, result))
}

fn api_error(status: u16, json: &str) -> ItemError {
    serde_json::from_str::<GmailApiError>(json).map_or_else(
        |_| ItemError::Api {
            code: status,
            message: json.to_owned(),
        },
        |e| ItemError::Api {
            code: e.error.code,
            message: e.error.message,
        },
    )
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

    const CONTENT_TYPE: &str = "multipart/mixed; boundary=batch_XYZ";

    fn part(index: usize, status: &str, json: &str) -> String {
        format!(
            "--batch_XYZ\r\nContent-Type: application/http\r\nContent-ID: <response-item{index}>\r\n\r\n\
             HTTP/1.1 {status}\r\nContent-Type: application/json; charset=UTF-8\r\nVary: Origin\r\n\r\n\
             {json}\r\n"
        )
    }

    fn message_json(id: &str) -> String {
        format!(
            r#"{{"id":"{id}","threadId":"t-{id}","payload":{{"mimeType":"text/plain","headers":[{{"name":"Subject","value":"About {id}"}}],"body":{{"size":5,"data":"aGVsbG8"}}}}}}"#
        )
    }

    #[test]
    fn test_build_request_body() {
        let body = build_request_body(&["m1", "m2"], "batch_B");

        assert!(body.starts_with("--batch_B\r\n"));
        assert!(body.ends_with("--batch_B--\r\n"));
        assert!(body.contains("Content-ID: <item0>\r\n\r\nGET /gmail/v1/users/me/messages/m1?format=full"));
        assert!(body.contains("Content-ID: <item1>\r\n\r\nGET /gmail/v1/users/me/messages/m2?format=full"));
        assert_eq!(body.matches("Content-Type: application/http").count(), 2);
    }

    #[test]
    fn test_new_boundary() {
        let boundary = new_boundary();
        assert!(boundary.starts_with("batch_"));
        assert_eq!(boundary.len(), "batch_".len() + BOUNDARY_LEN);
        assert_ne!(boundary, new_boundary());
    }

    #[test]
    fn test_parse_reorders_by_index() {
        let body = format!(
            "{}{}{}--batch_XYZ--\r\n",
            part(2, "200 OK", &message_json("c")),
            part(0, "200 OK", &message_json("a")),
            part(1, "200 OK", &message_json("b")),
        );
        let items = parse_response(CONTENT_TYPE, &body, &["a", "b", "c"]).unwrap();

        let indexes: Vec<_> = items.iter().map(|i| i.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        for item in &items {
            let message = item.result.as_ref().unwrap();
            assert_eq!(message.id, item.id);
            assert_eq!(message.subject(), format!("About {}", item.id));
            assert_eq!(message.body_text().unwrap(), "hello");
        }
    }

    #[test]
    fn test_parse_separates_api_and_decode_errors() {
        let body = format!(
            "{}{}{}--batch_XYZ--",
            part(0, "200 OK", &message_json("ok")),
            part(
                1,
                "404 Not Found",
                r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#
            ),
            part(2, "200 OK", "not json"),
        );
        let items = parse_response(CONTENT_TYPE, &body, &["ok", "gone", "bad"]).unwrap();

        assert!(items[0].result.is_ok());
        assert_eq!(
            items[1].result,
            Err(ItemError::Api {
                code: 404,
                message: "Requested entity was not found.".into()
            })
        );
        assert!(matches!(items[2].result, Err(ItemError::Decode(_))));
    }

    #[test]
    fn test_parse_unstructured_error_body() {
        let body = format!("{}--batch_XYZ--", part(0, "503 Service Unavailable", "busy"));
        let items = parse_response(CONTENT_TYPE, &body, &["x"]).unwrap();
        assert_eq!(
            items[0].result,
            Err(ItemError::Api {
                code: 503,
                message: "busy".into()
            })
        );
    }

    #[test]
    fn test_parse_marks_missing_parts() {
        let body = format!("{}--batch_XYZ--", part(1, "200 OK", &message_json("b")));
        let items = parse_response(CONTENT_TYPE, &body, &["a", "b"]).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[0].result, Err(ItemError::Missing));
        assert!(items[1].result.is_ok());
    }

    #[test]
    fn test_parse_bare_newlines() {
        let body = format!(
            "{}{}--batch_XYZ--\n",
            part(1, "200 OK", &message_json("b")),
            part(0, "200 OK", &message_json("a")),
        )
        .replace("\r\n", "\n");
        let items = parse_response(CONTENT_TYPE, &body, &["a", "b"]).unwrap();

        assert_eq!(items[0].result.as_ref().unwrap().id, "a");
        assert_eq!(items[1].result.as_ref().unwrap().id, "b");
    }

    #[test]
    fn test_parse_ignores_unknown_index() {
        let body = format!("{}--batch_XYZ--", part(7, "200 OK", &message_json("z")));
        let items = parse_response(CONTENT_TYPE, &body, &["a"]).unwrap();
        assert_eq!(items[0].result, Err(ItemError::Missing));
    }

    #[test]
    fn test_quoted_boundary() {
        let body = format!("{}--batch_XYZ--", part(0, "200 OK", &message_json("a")));
        let items =
            parse_response("multipart/mixed; charset=UTF-8; boundary=\"batch_XYZ\"", &body, &["a"])
                .unwrap();
        assert!(items[0].result.is_ok());
    }

    #[test]
    fn test_missing_boundary() {
        let err = parse_response("application/json", "{}", &["a"]).unwrap_err();
        assert!(matches!(err, Error::InvalidBatch(_)));
    }

    #[test]
    fn test_truncated_body() {
        let body = part(0, "200 OK", &message_json("a"));
        let err = parse_response(CONTENT_TYPE, &body, &["a"]).unwrap_err();
        assert!(matches!(err, Error::InvalidBatch(_)));
    }

    #[test]
    fn test_content_index() {
        assert_eq!(content_index(" <response-item12>"), Some(12));
        assert_eq!(content_index("<item0>"), Some(0));
        assert_eq!(content_index("<other>"), None);
    }
}
