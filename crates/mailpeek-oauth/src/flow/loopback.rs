//! Loopback redirect receiver for installed applications.
//!
//! Google redirects the browser to `http://127.0.0.1:<port>/?code=...&state=...`
//! after consent. The receiver accepts connections on that port until one of
//! them carries a `code` or an `error`, answers it with a short page and hands
//! the code back.

use crate::error::{Error, Result};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;
use url::Url;

/// Most bytes read from a browser request head.
const MAX_REQUEST_HEAD: u64 = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body><p>Authorization complete. You can close this window.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><p>Authorization failed. Check the terminal for details.</p></body></html>";

/// Query parameters of the redirect request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    /// Authorization code.
    pub code: Option<String>,
    /// Echoed `state` value.
    pub state: Option<String>,
    /// Error code, e.g. `access_denied`.
    pub error: Option<String>,
    /// Optional error description.
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// True when the request is an authorization response rather than noise
    /// such as a favicon fetch.
    #[must_use]
    pub const fn is_authorization_response(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }

    /// Validates `state` and returns the authorization code.
    ///
    /// # Errors
    ///
    /// Returns an error if the user denied access, the server reported an
    /// error, the state does not match, or no code is present.
    pub fn into_code(self, expected_state: &str) -> Result<String> {
        if let Some(error) = self.error {
            return Err(if error == "access_denied" {
                Error::AccessDenied
            } else {
                Error::oauth_error(error, self.error_description.unwrap_or_default())
            });
        }

        if self.state.as_deref() != Some(expected_state) {
            return Err(Error::StateMismatch);
        }

        self.code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::InvalidResponse("redirect carried no code".into()))
    }
}

/// Parses an HTTP request line such as `GET /?code=x&state=y HTTP/1.1`.
///
/// # Errors
///
/// Returns an error if the line is not a `GET` request with a path target.
pub fn parse_redirect_request(request_line: &str) -> Result<RedirectParams> {
    let mut fields = request_line.split_whitespace();
    let (Some("GET"), Some(target)) = (fields.next(), fields.next()) else {
        return Err(Error::InvalidResponse(format!(
            "unexpected redirect request: {}",
            request_line.trim_end()
        )));
    };

    if !target.starts_with('/') {
        return Err(Error::InvalidResponse(format!(
            "unexpected redirect target: {target}"
        )));
    }

    let url = Url::parse(&format!("http://127.0.0.1{target}"))?;
    let mut params = RedirectParams::default();
    for (key, value) in url.query_pairs() {
        let slot = match key.as_ref() {
            "code" => &mut params.code,
            "state" => &mut params.state,
            "error" => &mut params.error,
            "error_description" => &mut params.error_description,
            _ => continue,
        };
        *slot = Some(value.into_owned());
    }
    Ok(params)
}

/// One-shot HTTP listener on the loopback interface.
#[derive(Debug)]
pub struct LoopbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackReceiver {
    /// Binds an ephemeral port on `127.0.0.1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        debug!("Listening for OAuth redirect on {addr}");
        Ok(Self { listener, addr })
    }

    /// Redirect URI to register in the authorization request.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://{}:{}", self.addr.ip(), self.addr.port())
    }

    /// Waits for the authorization redirect and returns the code.
    ///
    /// Requests that carry neither `code` nor `error` get a 404 and are
    /// ignored, as are connections that fail before a request is read.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails, or as described in
    /// [`RedirectParams::into_code`].
    pub async fn receive(self, expected_state: &str) -> Result<String> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            let request_line = match read_request_line(&mut stream).await {
                Ok(line) => line,
                Err(e) => {
                    debug!("Dropping connection from {peer}: {e}");
                    continue;
                }
            };
            debug!("Redirect request from {peer}: {}", request_line.trim_end());

            let params = match parse_redirect_request(&request_line) {
                Ok(params) if params.is_authorization_response() => params,
                Ok(_) | Err(_) => {
                    if let Err(e) = respond(&mut stream, "404 Not Found", "").await {
                        debug!("Failed to answer {peer}: {e}");
                    }
                    continue;
                }
            };

            let outcome = params.into_code(expected_state);
            let (status, page) = if outcome.is_ok() {
                ("200 OK", SUCCESS_PAGE)
            } else {
                ("400 Bad Request", FAILURE_PAGE)
            };
            if let Err(e) = respond(&mut stream, status, page).await {
                debug!("Failed to answer {peer}: {e}");
            }
            return outcome;
        }
    }
}

/// Reads the request head and returns its first line. The remaining header
/// lines are drained so the connection closes cleanly.
async fn read_request_line(stream: &mut TcpStream) -> Result<String> {
    let mut reader = BufReader::new(stream.take(MAX_REQUEST_HEAD));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
            break;
        }
    }
    Ok(request_line)
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
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

    async fn send(addr: &str, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_parse_code_and_state() {
        let params =
            parse_redirect_request("GET /?state=xyz&code=4%2F0Adeu&scope=a+b HTTP/1.1\r\n").unwrap();
        assert_eq!(params.code.as_deref(), Some("4/0Adeu"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.is_authorization_response());
        assert_eq!(params.into_code("xyz").unwrap(), "4/0Adeu");
    }

    #[test]
    fn test_parse_access_denied() {
        let params = parse_redirect_request("GET /?error=access_denied&state=s HTTP/1.1").unwrap();
        assert!(matches!(params.into_code("s"), Err(Error::AccessDenied)));
    }

    #[test]
    fn test_state_mismatch() {
        let params = parse_redirect_request("GET /?code=c&state=evil HTTP/1.1").unwrap();
        assert!(matches!(params.into_code("good"), Err(Error::StateMismatch)));
    }

    #[test]
    fn test_favicon_is_not_a_response() {
        let params = parse_redirect_request("GET /favicon.ico HTTP/1.1").unwrap();
        assert!(!params.is_authorization_response());
    }

    #[test]
    fn test_rejects_non_get() {
        assert!(parse_redirect_request("POST / HTTP/1.1").is_err());
        assert!(parse_redirect_request("").is_err());
    }

    #[tokio::test]
    async fn test_receive_skips_noise_then_returns_code() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let uri = receiver.redirect_uri();
        assert!(uri.starts_with("http://127.0.0.1:"));
        let addr = uri.trim_start_matches("http://").to_string();

        let handle = tokio::spawn(async move { receiver.receive("st").await });

        let favicon = send(&addr, "GET /favicon.ico HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(favicon.starts_with("HTTP/1.1 404"));

        let ok = send(&addr, "GET /?code=abc&state=st HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(ok.starts_with("HTTP/1.1 200 OK"));
        assert!(ok.contains("Authorization complete"));

        assert_eq!(handle.await.unwrap().unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_receive_survives_reset_connection() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let addr = receiver.redirect_uri().trim_start_matches("http://").to_string();
        let handle = tokio::spawn(async move { receiver.receive("st").await });

        // Half a request, then an RST instead of a FIN
        let mut dropped = TcpStream::connect(&addr).await.unwrap();
        dropped.write_all(b"GET /favi").await.unwrap();
        #[allow(deprecated)]
        dropped.set_linger(Some(std::time::Duration::ZERO)).unwrap();
        drop(dropped);

        let ok = send(&addr, "GET /?code=abc&state=st HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(ok.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(handle.await.unwrap().unwrap(), "abc");
    }
}
