//! Recursive walk over a multipart MIME tree.
//!
//! `multipart/alternative` and `multipart/related` share one walker and
//! recurse into each other; `multipart/mixed` has its own, since it is the
//! only container whose leaves can become attachments.

use crate::attachment::{Attachment, EmbeddedFile, declared_filename};
use crate::boundary::{MultipartReader, Part};
use crate::config::ParseOptions;
use crate::content_type::{ContentType, MediaKind, MultipartKind};
use crate::error::{Error, Result};
use tracing::{debug, trace};

/// The containers whose leaves become text bodies or embedded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Alternative,
    Related,
}

impl Container {
    /// The container kind this one recurses into.
    const fn nested(self) -> MultipartKind {
        match self {
            Self::Alternative => MultipartKind::Related,
            Self::Related => MultipartKind::Alternative,
        }
    }

    const fn flip(self) -> Self {
        match self {
            Self::Alternative => Self::Related,
            Self::Related => Self::Alternative,
        }
    }
}

/// Output of an alternative/related walk.
#[derive(Debug, Default)]
pub(crate) struct Bodies {
    pub text: String,
    pub html: String,
    pub embedded_files: Vec<EmbeddedFile>,
}

/// Output of a mixed walk.
#[derive(Debug, Default)]
pub(crate) struct MixedContent {
    pub text: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
    pub embedded_files: Vec<EmbeddedFile>,
}

/// Decoded text with exactly one trailing newline removed.
pub(crate) fn text_from(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_suffix('\n').unwrap_or(&text).to_string()
}

fn append_text(target: &mut String, part: &Part<'_>) -> Result<()> {
    target.push_str(&text_from(&part.decode_body()?));
    Ok(())
}

fn check_depth(depth: usize, options: &ParseOptions) -> Result<()> {
    if depth > options.max_depth {
        return Err(Error::NestingTooDeep(options.max_depth));
    }
    Ok(())
}

fn content_type_of(part: &Part<'_>) -> Result<ContentType> {
    ContentType::parse(part.headers.get_or_empty("content-type"))
}

/// Walks a `multipart/alternative` or `multipart/related` body.
///
/// Text leaves are appended to the bodies, the nested container kind is
/// walked recursively and merged, and every other leaf becomes an
/// embedded file.
pub(crate) fn parse_container(
    body: &[u8],
    boundary: &str,
    container: Container,
    depth: usize,
    options: &ParseOptions,
) -> Result<Bodies> {
    check_depth(depth, options)?;
    debug!(?container, boundary, depth, "walking container");

    let mut reader = MultipartReader::new(body, boundary);
    let mut bodies = Bodies::default();

    while let Some(part) = reader.next_part()? {
        let content_type = content_type_of(&part)?;

        match content_type.kind() {
            MediaKind::TextPlain => append_text(&mut bodies.text, &part)?,
            MediaKind::TextHtml => append_text(&mut bodies.html, &part)?,
            MediaKind::Multipart(kind, nested_boundary) if kind == container.nested() => {
                let nested = parse_container(
                    part.body,
                    nested_boundary,
                    container.flip(),
                    depth + 1,
                    options,
                )?;
                bodies.text.push_str(&nested.text);
                bodies.html.push_str(&nested.html);
                bodies.embedded_files.extend(nested.embedded_files);
            }
            MediaKind::Multipart(..) | MediaKind::Other => {
                let filename = declared_filename(&part, &content_type);
                let file = EmbeddedFile::from_part(&part, filename.as_deref())?;
                trace!(cid = %file.cid, content_type = %content_type.mime_type, "embedded file");
                bodies.embedded_files.push(file);
            }
        }
    }

    Ok(bodies)
}

/// Walks a `multipart/mixed` body.
///
/// A nested alternative or related container replaces the text and HTML
/// collected so far and contributes its embedded files. Leaves that
/// declare a filename become attachments; unnamed text leaves are appended
/// to the bodies; any other unnamed leaf is dropped.
pub(crate) fn parse_mixed(
    body: &[u8],
    boundary: &str,
    depth: usize,
    options: &ParseOptions,
) -> Result<MixedContent> {
    check_depth(depth, options)?;
    debug!(boundary, depth, "walking mixed container");

    let mut reader = MultipartReader::new(body, boundary);
    let mut content = MixedContent::default();

    while let Some(part) = reader.next_part()? {
        let content_type = content_type_of(&part)?;

        let nested = match content_type.kind() {
            MediaKind::Multipart(MultipartKind::Alternative, nested_boundary) => {
                Some((Container::Alternative, nested_boundary))
            }
            MediaKind::Multipart(MultipartKind::Related, nested_boundary) => {
                Some((Container::Related, nested_boundary))
            }
            _ => None,
        };

        if let Some((container, nested_boundary)) = nested {
            let bodies =
                parse_container(part.body, nested_boundary, container, depth + 1, options)?;
            content.text = bodies.text;
            content.html = bodies.html;
            content.embedded_files.extend(bodies.embedded_files);
            continue;
        }

        if let Some(filename) = declared_filename(&part, &content_type) {
            let attachment = Attachment::from_part(&part, &filename)?;
            trace!(filename = %attachment.filename, "attachment");
            content.attachments.push(attachment);
            continue;
        }

        match content_type.kind() {
            MediaKind::TextPlain => append_text(&mut content.text, &part)?,
            MediaKind::TextHtml => append_text(&mut content.html, &part)?,
            _ => {
                // Unknown encodings are still a hard failure
                part.transfer_encoding()?;
                debug!(content_type = %content_type.mime_type, "dropping unnamed part");
            }
        }
    }

    Ok(content)
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

    fn alternative(body: &str, boundary: &str) -> Result<Bodies> {
        parse_container(
            body.as_bytes(),
            boundary,
            Container::Alternative,
            0,
            &ParseOptions::default(),
        )
    }

    fn mixed(body: &str, boundary: &str) -> Result<MixedContent> {
        parse_mixed(body.as_bytes(), boundary, 0, &ParseOptions::default())
    }

    #[test]
    fn test_text_from_strips_one_newline() {
        assert_eq!(text_from(b"hello\n"), "hello");
        assert_eq!(text_from(b"hello\n\n"), "hello\n");
        assert_eq!(text_from(b"hello"), "hello");
        assert_eq!(text_from(b""), "");
    }

    #[test]
    fn test_alternative_collects_both_bodies() {
        let body = concat!(
            "--alt\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--alt\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<b>x</b>\r\n",
            "--alt--\r\n"
        );
        let bodies = alternative(body, "alt").unwrap();
        assert_eq!(bodies.text, "plain");
        assert_eq!(bodies.html, "<b>x</b>");
        assert!(bodies.embedded_files.is_empty());
    }

    #[test]
    fn test_alternative_appends_repeated_text_parts() {
        let body = concat!(
            "--b\r\n\r\none\r\n",
            "--b\r\n\r\ntwo\r\n",
            "--b--\r\n"
        );
        let bodies = alternative(body, "b").unwrap();
        assert_eq!(bodies.text, "onetwo");
    }

    #[test]
    fn test_alternative_recurses_into_related() {
        let body = concat!(
            "--outer\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--outer\r\n",
            "Content-Type: multipart/related; boundary=inner\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<img src=\"cid:logo\">\r\n",
            "--inner\r\n",
            "Content-Type: image/png\r\n",
            "Content-Id: <logo>\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "iVBORw==\r\n",
            "--inner--\r\n",
            "--outer--\r\n"
        );
        let bodies = alternative(body, "outer").unwrap();
        assert_eq!(bodies.text, "plain");
        assert_eq!(bodies.html, "<img src=\"cid:logo\">");
        assert_eq!(bodies.embedded_files.len(), 1);
        assert_eq!(bodies.embedded_files[0].cid, "logo");
        assert_eq!(bodies.embedded_files[0].data, b"\x89PNG");
    }

    #[test]
    fn test_alternative_treats_nested_alternative_as_embedded() {
        let body = concat!(
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=inner\r\n",
            "\r\n",
            "--inner\r\n\r\nhidden\r\n--inner--\r\n",
            "--outer--\r\n"
        );
        let bodies = alternative(body, "outer").unwrap();
        assert_eq!(bodies.text, "");
        assert_eq!(bodies.embedded_files.len(), 1);
        assert!(
            bodies.embedded_files[0]
                .content_type
                .starts_with("multipart/alternative")
        );
    }

    #[test]
    fn test_related_named_leaf_is_embedded_with_filename() {
        let body = concat!(
            "--rel\r\n",
            "Content-Type: image/gif; name=\"dot.gif\"\r\n",
            "Content-Id: <dot>\r\n",
            "\r\n",
            "GIF\r\n",
            "--rel--\r\n"
        );
        let bodies = parse_container(
            body.as_bytes(),
            "rel",
            Container::Related,
            0,
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(bodies.embedded_files.len(), 1);
        assert_eq!(bodies.embedded_files[0].filename.as_deref(), Some("dot.gif"));
    }

    #[test]
    fn test_named_text_leaves_feed_bodies_in_both_containers() {
        let body = concat!(
            "--c\r\n",
            "Content-Type: text/plain; name=n.txt\r\n",
            "\r\n",
            "body\r\n",
            "--c\r\n",
            "Content-Type: text/html\r\n",
            "Content-Disposition: attachment; filename=\"page.html\"\r\n",
            "\r\n",
            "<p>page</p>\r\n",
            "--c--\r\n"
        );

        for container in [Container::Alternative, Container::Related] {
            let bodies = parse_container(
                body.as_bytes(),
                "c",
                container,
                0,
                &ParseOptions::default(),
            )
            .unwrap();
            assert_eq!(bodies.text, "body", "{container:?}");
            assert_eq!(bodies.html, "<p>page</p>", "{container:?}");
            assert!(bodies.embedded_files.is_empty(), "{container:?}");
        }
    }

    #[test]
    fn test_mixed_later_alternative_replaces_related_html() {
        let body = concat!(
            "--mix\r\n",
            "Content-Type: multipart/related; boundary=rel\r\n",
            "\r\n",
            "--rel\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<img src=\"cid:a\">\r\n",
            "--rel\r\n",
            "Content-Type: image/png\r\n",
            "Content-Id: <a>\r\n",
            "\r\n",
            "png\r\n",
            "--rel--\r\n",
            "--mix\r\n",
            "Content-Type: multipart/alternative; boundary=alt\r\n",
            "\r\n",
            "--alt\r\n\r\nplain only\r\n--alt--\r\n",
            "--mix--\r\n"
        );
        let content = mixed(body, "mix").unwrap();
        assert_eq!(content.text, "plain only");
        assert_eq!(content.html, "");
        assert_eq!(content.embedded_files.len(), 1);
        assert_eq!(content.embedded_files[0].cid, "a");
    }

    #[test]
    fn test_mixed_replaces_bodies_with_nested_container() {
        let body = concat!(
            "--mix\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "before\r\n",
            "--mix\r\n",
            "Content-Type: multipart/alternative; boundary=alt\r\n",
            "\r\n",
            "--alt\r\n\r\nnested\r\n--alt--\r\n",
            "--mix\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "-after\r\n",
            "--mix--\r\n"
        );
        let content = mixed(body, "mix").unwrap();
        assert_eq!(content.text, "nested-after");
    }

    #[test]
    fn test_mixed_named_text_part_is_attachment() {
        let body = concat!(
            "--mix\r\n",
            "Content-Type: text/plain\r\n",
            "Content-Disposition: attachment; filename=notes.txt\r\n",
            "\r\n",
            "notes\r\n",
            "--mix--\r\n"
        );
        let content = mixed(body, "mix").unwrap();
        assert_eq!(content.text, "");
        assert_eq!(content.attachments.len(), 1);
        assert_eq!(content.attachments[0].filename, "notes.txt");
        assert_eq!(content.attachments[0].data, b"notes");
    }

    #[test]
    fn test_mixed_drops_unnamed_binary_part() {
        let body = concat!(
            "--mix\r\n",
            "Content-Type: application/octet-stream\r\n",
            "\r\n",
            "blob\r\n",
            "--mix--\r\n"
        );
        let content = mixed(body, "mix").unwrap();
        assert!(content.attachments.is_empty());
        assert!(content.embedded_files.is_empty());
        assert_eq!(content.text, "");
    }

    #[test]
    fn test_mixed_dropped_part_with_unknown_encoding_fails() {
        let body = concat!(
            "--mix\r\n",
            "Content-Type: application/octet-stream\r\n",
            "Content-Transfer-Encoding: x-unknown\r\n",
            "\r\n",
            "blob\r\n",
            "--mix--\r\n"
        );
        let err = mixed(body, "mix").unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(_)));
    }

    #[test]
    fn test_malformed_part_content_type_aborts() {
        let body = "--b\r\nContent-Type: garbage\r\n\r\nx\r\n--b--\r\n";
        let err = alternative(body, "b").unwrap_err();
        assert!(matches!(err, Error::MalformedContentType(_)));
    }

    #[test]
    fn test_nesting_limit() {
        let body = concat!(
            "--a\r\n",
            "Content-Type: multipart/related; boundary=b\r\n",
            "\r\n",
            "--b\r\n\r\ndeep\r\n--b--\r\n",
            "--a--\r\n"
        );
        let options = ParseOptions::builder().max_depth(0).build();
        let err =
            parse_container(body.as_bytes(), "a", Container::Alternative, 0, &options).unwrap_err();
        assert!(matches!(err, Error::NestingTooDeep(0)));
    }
}
