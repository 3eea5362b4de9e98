//! Message header handling.

use std::fmt;

/// A single `name: value` header as reported by the Gmail API.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Header {
    /// Header name, as sent (case preserved).
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Header value.
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: String,
}

impl Header {
    /// Creates a header.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered header sequence. Duplicates are kept in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<Header>,
}

impl Headers {
    /// Creates an empty header sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push(Header::new(name, value));
    }

    /// Returns the value of the first header whose name matches exactly.
    ///
    /// The match is case-sensitive. Returns an empty string when no header
    /// matches.
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map_or("", |h| h.value.as_str())
    }

    /// Gets all values for a header, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.name == name)
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true when there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl From<Vec<Header>> for Headers {
    fn from(headers: Vec<Header>) -> Self {
        Self { headers }
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self {
            headers: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.headers {
            writeln!(f, "{}: {}", header.name, header.value)?;
        }
        Ok(())
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
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
        assert_eq!(headers.len(), 0);
    }

    #[test]
    fn test_get_first_match_wins() {
        let mut headers = Headers::new();
        headers.add("Received", "first hop");
        headers.add("Received", "second hop");
        assert_eq!(headers.get("Received"), "first hop");
        assert_eq!(headers.get_all("Received"), vec!["first hop", "second hop"]);
    }

    #[test]
    fn test_get_missing_is_empty() {
        let mut headers = Headers::new();
        headers.add("Subject", "Hi");
        assert_eq!(headers.get("From"), "");
    }

    #[test]
    fn test_get_is_case_sensitive() {
        let mut headers = Headers::new();
        headers.add("Subject", "Hi");
        assert_eq!(headers.get("subject"), "");
        assert_eq!(headers.get("Subject"), "Hi");
    }

    #[test]
    fn test_headers_display() {
        let headers: Headers = vec![Header::new("From", "a@example.com"), Header::new("To", "b@example.com")]
            .into_iter()
            .collect();
        assert_eq!(headers.to_string(), "From: a@example.com\nTo: b@example.com\n");
    }
}
