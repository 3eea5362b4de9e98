//! Gmail API response bodies other than the message itself.

use serde::Deserialize;

/// Response of `users.messages.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    /// Matching message references. Absent when nothing matched.
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    /// Token for the next page.
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Estimated total number of results.
    #[serde(default)]
    pub result_size_estimate: Option<u32>,
}

/// Message ID and thread ID, as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message ID.
    pub id: String,
    /// Thread ID.
    #[serde(default)]
    pub thread_id: String,
}

/// Error body returned by Google APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct GmailApiError {
    /// Error details.
    pub error: GmailApiErrorDetail,
}

/// Details of a [`GmailApiError`].
#[derive(Debug, Clone, Deserialize)]
pub struct GmailApiErrorDetail {
    /// HTTP status code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
    /// Canonical status, e.g. `NOT_FOUND`.
    #[serde(default)]
    pub status: Option<String>,
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
    fn test_list_response() {
        let json = r#"{
            "messages": [
                {"id": "18c1", "threadId": "18c0"},
                {"id": "18c2", "threadId": "18c2"}
            ],
            "nextPageToken": "0987",
            "resultSizeEstimate": 201
        }"#;
        let page: ListMessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.messages[0].id, "18c1");
        assert_eq!(page.messages[0].thread_id, "18c0");
        assert_eq!(page.next_page_token.as_deref(), Some("0987"));
        assert_eq!(page.result_size_estimate, Some(201));
    }

    #[test]
    fn test_empty_list_response() {
        let page: ListMessagesResponse =
            serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(page.messages.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_api_error() {
        let json = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        let err: GmailApiError = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.code, 404);
        assert_eq!(err.error.status.as_deref(), Some("NOT_FOUND"));
    }
}
