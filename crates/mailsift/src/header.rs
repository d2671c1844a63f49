//! MIME header handling.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Collection of email headers.
///
/// Names are case-insensitive. Repeated headers keep every value in the
/// order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        let value = value.into();
        self.headers.entry(name).or_default().push(value);
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets the first value for a header, or `""` when it is absent.
    #[must_use]
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if no header is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Parses a header block from the start of `data`.
    ///
    /// Returns the headers and the offset at which the body begins (just
    /// past the blank line ending the block, or `data.len()` when there is
    /// no blank line). Folded lines are joined with a single space.
    ///
    /// ```text
    /// Header-Name: value
    ///  continuation
    ///
    /// body...
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMessage`] for a line that is neither a
    /// `Name: value` pair nor a continuation of one.
    pub fn parse_block(data: &[u8]) -> Result<(Self, usize)> {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;
        let mut pos = 0;

        while pos < data.len() {
            let (line, next) = match data[pos..].iter().position(|&b| b == b'\n') {
                Some(idx) => (&data[pos..pos + idx], pos + idx + 1),
                None => (&data[pos..], data.len()),
            };
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            pos = next;

            if line.is_empty() {
                break;
            }

            let line = String::from_utf8_lossy(line);

            // Continuation line (starts with space or tab)
            if line.starts_with(' ') || line.starts_with('\t') {
                let Some((_, value)) = current.as_mut() else {
                    return Err(Error::MalformedMessage(format!(
                        "continuation line without a header: {line:?}"
                    )));
                };
                let folded = line.trim();
                if !folded.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(folded);
                }
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::MalformedMessage(format!(
                    "malformed header line: {line:?}"
                )));
            };
            let name = name.trim_end();
            if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c.is_control()) {
                return Err(Error::MalformedMessage(format!(
                    "invalid header name: {name:?}"
                )));
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }
            current = Some((name.to_string(), value.trim().to_string()));
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        Ok((headers, pos))
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
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
        assert_eq!(headers.get_or_empty("content-id"), "");
    }

    #[test]
    fn test_headers_repeated_values() {
        let mut headers = Headers::new();
        headers.add("Received", "from a");
        headers.add("received", "from b");
        assert_eq!(headers.get_all("RECEIVED"), vec!["from a", "from b"]);
        assert_eq!(headers.get("Received"), Some("from a"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_parse_block() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Body"
        );

        let (headers, offset) = Headers::parse_block(text.as_bytes()).unwrap();
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("To"), Some("recipient@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(&text.as_bytes()[offset..], b"Body");
    }

    #[test]
    fn test_parse_block_bare_lf() {
        let text = b"Subject: hi\n\nline one\n";
        let (headers, offset) = Headers::parse_block(text).unwrap();
        assert_eq!(headers.get("subject"), Some("hi"));
        assert_eq!(&text[offset..], b"line one\n");
    }

    #[test]
    fn test_parse_block_without_body() {
        let text = b"Subject: only headers";
        let (headers, offset) = Headers::parse_block(text).unwrap();
        assert_eq!(headers.get("subject"), Some("only headers"));
        assert_eq!(offset, text.len());
    }

    #[test]
    fn test_parse_block_empty_header_section() {
        let text = b"\r\npart body";
        let (headers, offset) = Headers::parse_block(text).unwrap();
        assert!(headers.is_empty());
        assert_eq!(&text[offset..], b"part body");
    }

    #[test]
    fn test_parse_block_rejects_garbage_line() {
        let err = Headers::parse_block(b"Subject: ok\r\nnot a header\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedMessage(_)));
    }

    #[test]
    fn test_parse_block_rejects_leading_continuation() {
        let err = Headers::parse_block(b" folded: first\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedMessage(_)));
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");

        let mut count = 0;
        for (name, value) in headers.iter() {
            assert!(!name.is_empty());
            assert!(!value.is_empty());
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
