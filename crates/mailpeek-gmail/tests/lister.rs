//! Integration tests for the message lister.
//!
//! These tests run the client against a local mock of the Gmail list and
//! batch endpoints.

#![allow(clippy::unwrap_used)]

use mailpeek_gmail::{Error, GmailClient};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "batch_resp";

fn client(server: &MockServer) -> GmailClient {
    GmailClient::new(reqwest::Client::new(), "tok")
        .with_api_base(format!("{}/gmail/v1", server.uri()))
        .with_batch_url(format!("{}/batch/gmail/v1", server.uri()))
}

fn message_json(id: &str, text_b64: &str) -> String {
    serde_json::json!({
        "id": id,
        "threadId": id,
        "labelIds": ["INBOX", "UNREAD"],
        "snippet": "snippet",
        "payload": {
            "mimeType": "multipart/alternative",
            "headers": [
                {"name": "From", "value": "alice@example.com"},
                {"name": "Subject", "value": format!("Subject {id}")},
                {"name": "Date", "value": "Mon, 1 Jan 2024 10:00:00 +0000"}
            ],
            "body": {"size": 0},
            "parts": [
                {"partId": "0", "mimeType": "text/plain", "body": {"size": 5, "data": text_b64}},
                {"partId": "1", "mimeType": "text/html", "body": {"size": 12, "data": "PGI-aGk8L2I-"}}
            ]
        }
    })
    .to_string()
}

fn batch_part(index: usize, status: &str, json: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Type: application/http\r\nContent-ID: <response-item{index}>\r\n\r\n\
         HTTP/1.1 {status}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{json}\r\n"
    )
}

fn batch_response(parts: &[String]) -> ResponseTemplate {
    let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
    ResponseTemplate::new(200)
        .set_body_raw(body, &format!("multipart/mixed; boundary={BOUNDARY}"))
}

#[tokio::test]
async fn test_list_messages_in_search_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("q", "is:unread"))
        .and(query_param("maxResults", "100"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [
                {"id": "m1", "threadId": "m1"},
                {"id": "m2", "threadId": "m2"},
                {"id": "m3", "threadId": "m3"}
            ],
            "resultSizeEstimate": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Parts out of order, one failed sub-request
    Mock::given(method("POST"))
        .and(path("/batch/gmail/v1"))
        .and(header("authorization", "Bearer tok"))
        .and(body_string_contains("GET /gmail/v1/users/me/messages/m1?format=full"))
        .and(body_string_contains("GET /gmail/v1/users/me/messages/m3?format=full"))
        .respond_with(batch_response(&[
            batch_part(2, "200 OK", &message_json("m3", "dGhyZWU")),
            batch_part(
                1,
                "404 Not Found",
                r#"{"error":{"code":404,"message":"Not Found"}}"#,
            ),
            batch_part(0, "200 OK", &message_json("m1", "b25l")),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let messages = client(&server).list_messages("is:unread").await.unwrap();

    let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m3"]);
    assert_eq!(messages[0].subject(), "Subject m1");
    assert_eq!(messages[0].from(), "alice@example.com");
    assert_eq!(messages[0].body_text().unwrap(), "one");
    assert_eq!(messages[1].body_text().unwrap(), "three");
    assert!(messages[1].label_ids.contains("UNREAD"));
}

#[tokio::test]
async fn test_empty_search_skips_batch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"resultSizeEstimate": 0})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let messages = client(&server).list_messages("from:nobody").await.unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_search_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("pageToken", "p2"))
        .and(query_param("maxResults", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [{"id": "c"}, {"id": "d"}, {"id": "e"}],
            "nextPageToken": "p3"
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("maxResults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [{"id": "a"}, {"id": "b"}],
            "nextPageToken": "p2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = client(&server).search_ids("label:work", 5).await.unwrap();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_list_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"code": 401, "message": "Invalid Credentials", "status": "UNAUTHENTICATED"}
        })))
        .mount(&server)
        .await;

    let err = client(&server).list_messages("").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid Credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_batch_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"messages": [{"id": "m1"}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/batch/gmail/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not multipart"))
        .mount(&server)
        .await;

    let err = client(&server).list_messages("").await.unwrap_err();
    assert!(matches!(err, Error::InvalidBatch(_)));
}

#[tokio::test]
async fn test_get_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/m9"))
        .and(query_param("format", "full"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(message_json("m9", "bmluZQ"), "application/json"),
        )
        .mount(&server)
        .await;

    let message = client(&server).get_message("m9").await.unwrap();
    assert_eq!(message.id, "m9");
    assert_eq!(message.body_text().unwrap(), "nine");
}

#[tokio::test]
async fn test_long_search_is_split_into_batches() {
    let server = MockServer::start().await;
    let ids: Vec<String> = (0..150).map(|i| format!("m{i}")).collect();

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("maxResults", "150"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": ids.iter().map(|id| serde_json::json!({"id": id})).collect::<Vec<_>>()
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Each chunk numbers its parts from zero
    let first: Vec<String> = (0..100)
        .map(|i| batch_part(i, "200 OK", &message_json(&format!("m{i}"), "b25l")))
        .collect();
    let second: Vec<String> = (0..50)
        .map(|i| {
            if i == 10 {
                batch_part(i, "404 Not Found", r#"{"error":{"code":404,"message":"Not Found"}}"#)
            } else {
                batch_part(i, "200 OK", &message_json(&format!("m{}", i + 100), "b25l"))
            }
        })
        .rev()
        .collect();

    Mock::given(method("POST"))
        .and(path("/batch/gmail/v1"))
        .and(body_string_contains("GET /gmail/v1/users/me/messages/m0?format=full"))
        .and(body_string_contains("GET /gmail/v1/users/me/messages/m99?format=full"))
        .respond_with(batch_response(&first))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/batch/gmail/v1"))
        .and(body_string_contains("GET /gmail/v1/users/me/messages/m100?format=full"))
        .and(body_string_contains("GET /gmail/v1/users/me/messages/m149?format=full"))
        .respond_with(batch_response(&second))
        .expect(1)
        .mount(&server)
        .await;

    let messages = client(&server)
        .with_max_messages(150)
        .list_messages("")
        .await
        .unwrap();

    let expected: Vec<&str> = ids
        .iter()
        .map(String::as_str)
        .filter(|id| *id != "m110")
        .collect();
    let got: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(got, expected);
    assert_eq!(messages[100].subject(), "Subject m100");
    assert_eq!(messages[110].id, "m111");
}
