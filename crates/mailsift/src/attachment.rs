//! Attachments, inline files and the leaf classifier that tells them apart.

use crate::boundary::Part;
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::decode_header_words;
use crate::error::Result;

/// A file attached to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attachment {
    /// Filename with RFC 2047 encoded words decoded.
    pub filename: String,
    /// `type/subtype` of the part, without parameters.
    pub content_type: String,
    /// Decoded content.
    pub data: Vec<u8>,
}

/// A file embedded in the message body, usually referenced from HTML via
/// `cid:` URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmbeddedFile {
    /// Content-Id without the surrounding angle brackets.
    pub cid: String,
    /// Filename, if the part declares one.
    pub filename: Option<String>,
    /// The part's `Content-Type` header as written, parameters included.
    pub content_type: String,
    /// Decoded content.
    pub data: Vec<u8>,
}

/// Returns the filename a part declares, if any.
///
/// `Content-Disposition: ...; filename=` wins over the `name` (or
/// `filename`) parameter of `Content-Type`. Empty values do not count.
pub(crate) fn declared_filename(part: &Part<'_>, content_type: &ContentType) -> Option<String> {
    ContentDisposition::parse(part.headers.get_or_empty("content-disposition"))
        .and_then(|cd| cd.filename().map(str::to_string))
        .or_else(|| content_type.name().map(str::to_string))
}

impl Attachment {
    /// Builds an attachment from a part that declared `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be decoded.
    pub(crate) fn from_part(part: &Part<'_>, filename: &str) -> Result<Self> {
        let data = part.decode_body()?;
        let content_type = part
            .headers
            .get_or_empty("content-type")
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            filename: decode_header_words(filename),
            content_type,
            data,
        })
    }
}

impl EmbeddedFile {
    /// Builds an embedded file from a part.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be decoded.
    pub(crate) fn from_part(part: &Part<'_>, filename: Option<&str>) -> Result<Self> {
        let data = part.decode_body()?;
        let cid = decode_header_words(part.headers.get_or_empty("content-id"));

        Ok(Self {
            cid: cid.trim_matches(|c| c == '<' || c == '>').to_string(),
            filename: filename.map(decode_header_words),
            content_type: part.headers.get_or_empty("content-type").to_string(),
            data,
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
    use crate::header::Headers;

    fn part<'a>(headers: &[(&str, &str)], body: &'a [u8]) -> Part<'a> {
        let mut map = Headers::new();
        for (name, value) in headers {
            map.add(*name, *value);
        }
        Part { headers: map, body }
    }

    fn filename_of(headers: &[(&str, &str)]) -> Option<String> {
        let part = part(headers, b"");
        let ct = ContentType::parse(part.headers.get_or_empty("content-type")).unwrap();
        declared_filename(&part, &ct)
    }

    #[test]
    fn test_filename_from_disposition() {
        let name = filename_of(&[("Content-Disposition", "attachment; filename=\"f.txt\"")]);
        assert_eq!(name.as_deref(), Some("f.txt"));
    }

    #[test]
    fn test_filename_disposition_wins_over_content_type() {
        let name = filename_of(&[
            ("Content-Type", "application/pdf; name=\"ct.pdf\""),
            ("Content-Disposition", "attachment; filename=\"cd.pdf\""),
        ]);
        assert_eq!(name.as_deref(), Some("cd.pdf"));
    }

    #[test]
    fn test_filename_from_content_type_name() {
        let name = filename_of(&[
            ("Content-Type", "application/pdf; name=\"ct.pdf\""),
            ("Content-Disposition", "attachment"),
        ]);
        assert_eq!(name.as_deref(), Some("ct.pdf"));
    }

    #[test]
    fn test_no_filename() {
        assert_eq!(filename_of(&[("Content-Type", "image/png")]), None);
        assert_eq!(
            filename_of(&[("Content-Disposition", "attachment; filename=\"\"")]),
            None
        );
    }

    #[test]
    fn test_attachment_from_part() {
        let part = part(
            &[
                ("Content-Type", "text/plain; charset=utf-8; name=\"f.txt\""),
                ("Content-Transfer-Encoding", "base64"),
            ],
            b"QUJD",
        );
        let attachment = Attachment::from_part(&part, "=?UTF-8?B?ZsOpLnR4dA==?=").unwrap();
        assert_eq!(attachment.filename, "fé.txt");
        assert_eq!(attachment.content_type, "text/plain");
        assert_eq!(attachment.data, b"ABC");
    }

    #[test]
    fn test_embedded_file_from_part() {
        let part = part(
            &[
                ("Content-Type", "image/png; name=logo.png"),
                ("Content-Id", "<img1@example.com>"),
            ],
            b"\x89PNG",
        );
        let file = EmbeddedFile::from_part(&part, None).unwrap();
        assert_eq!(file.cid, "img1@example.com");
        assert_eq!(file.filename, None);
        assert_eq!(file.content_type, "image/png; name=logo.png");
        assert_eq!(file.data, b"\x89PNG");
    }

    #[test]
    fn test_embedded_file_without_content_id() {
        let part = part(&[], b"raw");
        let file = EmbeddedFile::from_part(&part, Some("a.bin")).unwrap();
        assert_eq!(file.cid, "");
        assert_eq!(file.filename.as_deref(), Some("a.bin"));
        assert_eq!(file.content_type, "");
    }

    #[test]
    fn test_unsupported_encoding_fails() {
        let part = part(&[("Content-Transfer-Encoding", "x-uuencode")], b"data");
        assert!(EmbeddedFile::from_part(&part, None).is_err());
        assert!(Attachment::from_part(&part, "a").is_err());
    }
}
