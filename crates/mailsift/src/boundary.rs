//! Multipart boundary tokenizer (RFC 2046 §5.1).
//!
//! Splits a multipart body into its sibling parts. The preamble before the
//! first delimiter and the epilogue after the close delimiter are ignored.

use crate::encoding::TransferEncoding;
use crate::error::{Error, Result};
use crate::header::Headers;

/// One sibling part of a multipart body.
#[derive(Debug, Clone)]
pub struct Part<'a> {
    /// Part headers.
    pub headers: Headers,
    /// Raw (still transfer-encoded) part body.
    pub body: &'a [u8],
}

impl Part<'_> {
    /// Gets the transfer encoding declared by the part.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoding is not supported.
    pub fn transfer_encoding(&self) -> Result<TransferEncoding> {
        TransferEncoding::parse(self.headers.get_or_empty("content-transfer-encoding"))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoding is unsupported or decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        self.transfer_encoding()?.decode(self.body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Preamble,
    Parts,
    Done,
}

/// A delimiter line found in the body.
struct Delimiter {
    /// Offset of the first `-` of the delimiter.
    start: usize,
    /// Offset just past the delimiter line.
    next: usize,
    /// Whether this is the `--boundary--` close delimiter.
    close: bool,
}

/// Pull-style reader over the parts of one multipart body.
#[derive(Debug)]
pub struct MultipartReader<'a> {
    data: &'a [u8],
    delimiter: Vec<u8>,
    pos: usize,
    state: State,
}

impl<'a> MultipartReader<'a> {
    /// Creates a reader for `data` delimited by `boundary`.
    #[must_use]
    pub fn new(data: &'a [u8], boundary: &str) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(boundary.as_bytes());
        Self {
            data,
            delimiter,
            pos: 0,
            state: State::Preamble,
        }
    }

    /// Returns the next part, or `None` once the close delimiter is reached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tokenizer`] if the body has no opening delimiter,
    /// ends before its close delimiter, or a part's header block is
    /// malformed.
    pub fn next_part(&mut self) -> Result<Option<Part<'a>>> {
        if self.state == State::Preamble {
            let first = self.find_delimiter(0).ok_or_else(|| {
                Error::Tokenizer("no opening boundary delimiter found".to_string())
            })?;
            self.pos = first.next;
            self.state = if first.close { State::Done } else { State::Parts };
        }

        if self.state == State::Done {
            return Ok(None);
        }

        let start = self.pos;
        let delimiter = self.find_delimiter(start).ok_or_else(|| {
            Error::Tokenizer("body ends before the closing boundary delimiter".to_string())
        })?;

        // The line break preceding a delimiter belongs to the delimiter
        let mut end = delimiter.start;
        if end > start && self.data[end - 1] == b'\n' {
            end -= 1;
            if end > start && self.data[end - 1] == b'\r' {
                end -= 1;
            }
        }
        let content = &self.data[start..end];

        self.pos = delimiter.next;
        if delimiter.close {
            self.state = State::Done;
        }

        let (headers, offset) = Headers::parse_block(content)
            .map_err(|e| Error::Tokenizer(format!("bad part header: {e}")))?;

        Ok(Some(Part {
            headers,
            body: &content[offset..],
        }))
    }

    /// Finds the first delimiter line at or after the line starting at `from`.
    fn find_delimiter(&self, from: usize) -> Option<Delimiter> {
        let mut line_start = from;
        loop {
            if let Some(found) = self.delimiter_at(line_start) {
                return Some(found);
            }
            let newline = self.data[line_start..].iter().position(|&b| b == b'\n')?;
            line_start += newline + 1;
        }
    }

    /// Checks whether a delimiter line starts at `start`.
    fn delimiter_at(&self, start: usize) -> Option<Delimiter> {
        let line = self.data.get(start..)?;
        let rest = line.strip_prefix(self.delimiter.as_slice())?;

        let (close, rest) = match rest.strip_prefix(b"--") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        // Transport padding
        let padding = rest
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        let rest = &rest[padding..];

        let line_break = match rest {
            [] => 0,
            [b'\n', ..] => 1,
            [b'\r', b'\n', ..] => 2,
            _ => return None,
        };

        Some(Delimiter {
            start,
            next: self.data.len() - rest.len() + line_break,
            close,
        })
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

    fn collect(data: &[u8], boundary: &str) -> Result<Vec<(Headers, Vec<u8>)>> {
        let mut reader = MultipartReader::new(data, boundary);
        let mut parts = Vec::new();
        while let Some(part) = reader.next_part()? {
            parts.push((part.headers, part.body.to_vec()));
        }
        Ok(parts)
    }

    #[test]
    fn test_simple_multipart() {
        let body = concat!(
            "This is the preamble.\r\n",
            "--abc\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "first\r\n",
            "--abc\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>second</p>\r\n",
            "--abc--\r\n",
            "epilogue\r\n"
        );

        let parts = collect(body.as_bytes(), "abc").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0.get("content-type"), Some("text/plain"));
        assert_eq!(parts[0].1, b"first");
        assert_eq!(parts[1].0.get("content-type"), Some("text/html"));
        assert_eq!(parts[1].1, b"<p>second</p>");
    }

    #[test]
    fn test_body_keeps_inner_line_breaks() {
        let body = b"--b\n\nline1\nline2\n\n--b--";
        let parts = collect(body, "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].0.is_empty());
        assert_eq!(parts[0].1, b"line1\nline2\n");
    }

    #[test]
    fn test_transport_padding_and_lookalike_lines() {
        let body = concat!(
            "--abc  \r\n",
            "\r\n",
            "--abcdef is not a delimiter\r\n",
            "--abc--\t\r\n"
        );
        let parts = collect(body.as_bytes(), "abc").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].1, b"--abcdef is not a delimiter");
    }

    #[test]
    fn test_empty_multipart() {
        let parts = collect(b"--abc--\r\n", "abc").unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn test_done_stays_done() {
        let mut reader = MultipartReader::new(b"--x\r\n\r\nA\r\n--x--", "x");
        assert!(reader.next_part().unwrap().is_some());
        assert!(reader.next_part().unwrap().is_none());
        assert!(reader.next_part().unwrap().is_none());
    }

    #[test]
    fn test_missing_opening_delimiter() {
        let err = collect(b"no parts here\r\n", "abc").unwrap_err();
        assert!(matches!(err, Error::Tokenizer(_)));
    }

    #[test]
    fn test_missing_close_delimiter() {
        let err = collect(b"--abc\r\n\r\ntruncated", "abc").unwrap_err();
        assert!(matches!(err, Error::Tokenizer(_)));
    }

    #[test]
    fn test_malformed_part_header() {
        let err = collect(b"--abc\r\nnot a header\r\n\r\nx\r\n--abc--", "abc").unwrap_err();
        assert!(matches!(err, Error::Tokenizer(_)));
    }
}
