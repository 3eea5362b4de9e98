//! Authenticated Gmail REST client.

use crate::batch::{self, BatchItem, MAX_BATCH_SIZE};
use crate::error::{Error, Result};
use crate::model::{GmailApiError, ListMessagesResponse};
use mailpeek_mime::Message;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Gmail REST API v1 base URL.
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail batch endpoint.
pub const DEFAULT_BATCH_URL: &str = "https://www.googleapis.com/batch/gmail/v1";

/// Number of message IDs collected by a search unless configured otherwise.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// Largest `maxResults` Gmail accepts for `messages.list`.
const MAX_PAGE_SIZE: usize = 500;

/// Gmail client for the authenticated user (`users/me`).
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    access_token: String,
    api_base: String,
    batch_url: String,
    max_messages: usize,
}

impl GmailClient {
    /// Creates a client that authenticates with a bearer `access_token`.
    #[must_use]
    pub fn new(http: Client, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            batch_url: DEFAULT_BATCH_URL.to_string(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    /// Overrides the REST API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the batch endpoint URL.
    #[must_use]
    pub fn with_batch_url(mut self, batch_url: impl Into<String>) -> Self {
        self.batch_url = batch_url.into();
        self
    }

    /// Sets how many message IDs [`list_messages`](Self::list_messages) collects.
    #[must_use]
    pub const fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages;
        self
    }

    /// Searches with a Gmail query and fetches every match in full.
    ///
    /// Messages come back in search order. Sub-requests that fail are logged
    /// and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the search or a batch request fails as a whole.
    pub async fn list_messages(&self, query: &str) -> Result<Vec<Message>> {
        let ids = self.search_ids(query, self.max_messages).await?;
        if ids.is_empty() {
            info!(query, "No messages found");
            return Ok(Vec::new());
        }

        let items = self.fetch_batch(&ids).await?;
        let mut messages = Vec::with_capacity(items.len());
        for item in items {
            match item.result {
                Ok(message) => messages.push(message),
                Err(e) => warn!(id = %item.id, kind = e.kind(), error = %e, "Skipping message"),
            }
        }

        info!(requested = ids.len(), fetched = messages.len(), "Fetched messages");
        Ok(messages)
    }

    /// Collects up to `max` message IDs matching `query`, following page tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if a list request fails.
    pub async fn search_ids(&self, query: &str, max: usize) -> Result<Vec<String>> {
        let url = format!("{}/users/me/messages", self.api_base);
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < max {
            let page_size = (max - ids.len()).min(MAX_PAGE_SIZE);
            let mut params = vec![("q", query.to_string()), ("maxResults", page_size.to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await?;
            let page: ListMessagesResponse = read_json(response).await?;
            debug!(
                count = page.messages.len(),
                estimate = page.result_size_estimate,
                "Fetched message list page"
            );

            ids.extend(page.messages.into_iter().map(|m| m.id));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        ids.truncate(max);
        Ok(ids)
    }

    /// Fetches one message in full format.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a message.
    pub async fn get_message(&self, id: &str) -> Result<Message> {
        let response = self
            .http
            .get(format!("{}/users/me/messages/{id}", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()
            .await?;
        read_json(response).await
    }

    /// Fetches messages through the batch endpoint, at most
    /// [`MAX_BATCH_SIZE`] per request.
    ///
    /// Returns one item per ID with `index` equal to its position in `ids`.
    ///
    /// # Errors
    ///
    /// Returns an error if a batch request fails or its envelope cannot be parsed.
    pub async fn fetch_batch<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<BatchItem>> {
        let mut items = Vec::with_capacity(ids.len());

        for (chunk_no, chunk) in ids.chunks(MAX_BATCH_SIZE).enumerate() {
            let offset = chunk_no * MAX_BATCH_SIZE;
            let boundary = batch::new_boundary();
            debug!(offset, size = chunk.len(), "Sending batch request");

            let response = self
                .http
                .post(&self.batch_url)
                .bearer_auth(&self.access_token)
                .header(CONTENT_TYPE, format!("multipart/mixed; boundary={boundary}"))
                .body(batch::build_request_body(chunk, &boundary))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| Error::InvalidBatch("missing content type".into()))?
                .to_string();
            let body = response.text().await?;

            items.extend(
                batch::parse_response(&content_type, &body, chunk)?
                    .into_iter()
                    .map(|mut item| {
                        item.index += offset;
                        item
                    }),
            );
        }

        Ok(items)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn api_error(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return Error::Http(e),
    };

    let message = serde_json::from_str::<GmailApiError>(&body)
        .map_or(body, |e| e.error.message);
    Error::Api { status, message }
}
