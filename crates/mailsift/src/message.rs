//! Decoded message and the top-level assembler.

use crate::attachment::{Attachment, EmbeddedFile};
use crate::config::ParseOptions;
use crate::content_type::{ContentType, MediaKind, MultipartKind};
use crate::encoding::TransferEncoding;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::multipart::{Bodies, Container, parse_container, parse_mixed, text_from};
use std::io::Read;
use tracing::debug;

/// A decoded email message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Email {
    /// Top-level headers.
    pub headers: Headers,
    /// The top-level `Content-Type` header as written (empty if absent).
    pub content_type: String,
    /// Decoded body of a message that is neither text nor a known
    /// multipart container.
    pub content: Option<Vec<u8>>,
    /// Concatenation of every `text/plain` body, in document order.
    pub text_body: String,
    /// Concatenation of every `text/html` body, in document order.
    pub html_body: String,
    /// Attachments, in document order.
    pub attachments: Vec<Attachment>,
    /// Inline files, in document order.
    pub embedded_files: Vec<EmbeddedFile>,
}

impl Email {
    /// Decodes a raw message with default options.
    ///
    /// # Errors
    ///
    /// Returns the first error met anywhere in the message.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, &ParseOptions::default())
    }

    /// Reads a message to the end and decodes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading fails, otherwise as [`Email::parse`].
    pub fn parse_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(&data)
    }

    /// Decodes a raw message.
    ///
    /// # Errors
    ///
    /// Returns the first error met anywhere in the message.
    pub fn parse_with(data: &[u8], options: &ParseOptions) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::MalformedMessage("empty message".to_string()));
        }

        let (headers, offset) = Headers::parse_block(data)?;
        let body = &data[offset..];

        let raw_content_type = headers.get_or_empty("content-type").to_string();
        let content_type = ContentType::parse(&raw_content_type)?;

        debug!(content_type = %content_type.mime_type, "decoding message");

        let mut email = Self {
            headers,
            content_type: raw_content_type,
            ..Self::default()
        };

        match content_type.kind() {
            MediaKind::Multipart(MultipartKind::Mixed, boundary) => {
                let content = parse_mixed(body, boundary, 0, options)?;
                email.text_body = content.text;
                email.html_body = content.html;
                email.attachments = content.attachments;
                email.embedded_files = content.embedded_files;
            }
            MediaKind::Multipart(MultipartKind::Alternative, boundary) => {
                email.assign(parse_container(body, boundary, Container::Alternative, 0, options)?);
            }
            MediaKind::Multipart(MultipartKind::Related, boundary) => {
                email.assign(parse_container(body, boundary, Container::Related, 0, options)?);
            }
            // Single-part text is taken as written
            MediaKind::TextPlain => email.text_body = text_from(body),
            MediaKind::TextHtml => email.html_body = text_from(body),
            MediaKind::Other => {
                let encoding = email.headers.get_or_empty("content-transfer-encoding");
                email.content = Some(TransferEncoding::parse(encoding)?.decode(body)?);
            }
        }

        Ok(email)
    }

    fn assign(&mut self, bodies: Bodies) {
        self.text_body = bodies.text;
        self.html_body = bodies.html;
        self.embedded_files = bodies.embedded_files;
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
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
    fn test_message_single_part() {
        let raw = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test\r\n",
            "Date: Fri, 16 Oct 2026 09:00:00 +0000\r\n",
            "Message-ID: <abc@example.com>\r\n",
            "\r\n",
            "Hello, World!\n"
        );
        let email = Email::parse(raw.as_bytes()).unwrap();

        assert_eq!(email.from(), Some("sender@example.com"));
        assert_eq!(email.to(), Some("recipient@example.com"));
        assert_eq!(email.subject(), Some("Test"));
        assert_eq!(email.date(), Some("Fri, 16 Oct 2026 09:00:00 +0000"));
        assert_eq!(email.message_id(), Some("<abc@example.com>"));
        assert_eq!(email.content_type, "");
        assert_eq!(email.text_body, "Hello, World!");
        assert_eq!(email.content, None);
    }

    #[test]
    fn test_message_html_single_part() {
        let raw = "Content-Type: text/html; charset=utf-8\r\n\r\n<p>hi</p>\n";
        let email = Email::parse(raw.as_bytes()).unwrap();
        assert_eq!(email.html_body, "<p>hi</p>");
        assert_eq!(email.text_body, "");
    }

    #[test]
    fn test_message_text_ignores_transfer_encoding() {
        let raw = concat!(
            "Content-Type: text/plain\r\n",
            "Content-Transfer-Encoding: x-uuencode\r\n",
            "\r\n",
            "hello\n"
        );
        let email = Email::parse(raw.as_bytes()).unwrap();
        assert_eq!(email.text_body, "hello");

        let raw = concat!(
            "Content-Type: text/html\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "<p>a=3Db</p>\n"
        );
        let email = Email::parse(raw.as_bytes()).unwrap();
        assert_eq!(email.html_body, "<p>a=3Db</p>");
    }

    #[test]
    fn test_message_opaque_content_unknown_encoding_fails() {
        let raw = "Content-Type: image/png\r\nContent-Transfer-Encoding: x-uuencode\r\n\r\nabc";
        let err = Email::parse(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(_)));
    }

    #[test]
    fn test_message_opaque_content() {
        let raw = concat!(
            "Content-Type: application/pdf\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "JVBERi0=\r\n"
        );
        let email = Email::parse(raw.as_bytes()).unwrap();
        assert_eq!(email.content.as_deref(), Some(&b"%PDF-"[..]));
        assert_eq!(email.text_body, "");
        assert_eq!(email.html_body, "");
    }

    #[test]
    fn test_multipart_without_boundary_is_opaque() {
        let raw = "Content-Type: multipart/mixed\r\n\r\nraw body";
        let email = Email::parse(raw.as_bytes()).unwrap();
        assert_eq!(email.content.as_deref(), Some(&b"raw body"[..]));
        assert!(email.attachments.is_empty());
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let err = Email::parse(b"").unwrap_err();
        assert!(matches!(err, Error::MalformedMessage(_)));
    }

    #[test]
    fn test_malformed_top_level_content_type() {
        let err = Email::parse(b"Content-Type: text\r\n\r\nbody").unwrap_err();
        assert!(matches!(err, Error::MalformedContentType(_)));
    }

    #[test]
    fn test_parse_reader() {
        let raw: &[u8] = b"Subject: via reader\r\n\r\nbody\n";
        let email = Email::parse_reader(raw).unwrap();
        assert_eq!(email.subject(), Some("via reader"));
        assert_eq!(email.text_body, "body");
    }
}
