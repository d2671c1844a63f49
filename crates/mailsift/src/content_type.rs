//! MIME content type handling.
//!
//! `Content-Type` and `Content-Disposition` share one grammar:
//! a (type/subtype) value followed by `; key=value` parameters, where a
//! value is either a token or a quoted string. RFC 2231 extended
//! parameters (`filename*=utf-8''%E2%82%AC.pdf`, `name*0=`, `name*1*=`)
//! are folded back into their plain names.

use crate::encoding::{decode_charset, hex_value};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// The three multipart containers the walker descends into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartKind {
    /// `multipart/mixed`.
    Mixed,
    /// `multipart/alternative`.
    Alternative,
    /// `multipart/related`.
    Related,
}

/// The content kinds the multipart walker dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind<'a> {
    /// `text/plain`.
    TextPlain,
    /// `text/html`.
    TextHtml,
    /// A multipart container and its boundary.
    Multipart(MultipartKind, &'a str),
    /// Anything else, including a multipart type without a boundary.
    Other,
}

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lower-cased `type/subtype` (e.g., "text/plain", "image/png").
    pub mime_type: String,
    /// Parameters with lower-cased names (e.g., charset, boundary, name).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a content type without parameters.
    #[must_use]
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// The RFC 2045 default for parts without a `Content-Type`.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text/plain")
    }

    /// Returns a parameter by (lower-case) name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present and non-empty.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary").filter(|b| !b.is_empty())
    }

    /// Returns the `name` (or, failing that, `filename`) parameter.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameter("name")
            .filter(|n| !n.is_empty())
            .or_else(|| self.parameter("filename").filter(|n| !n.is_empty()))
    }

    /// Classifies this type for dispatch.
    #[must_use]
    pub fn kind(&self) -> MediaKind<'_> {
        let multipart = match self.mime_type.as_str() {
            "text/plain" => return MediaKind::TextPlain,
            "text/html" => return MediaKind::TextHtml,
            "multipart/mixed" => MultipartKind::Mixed,
            "multipart/alternative" => MultipartKind::Alternative,
            "multipart/related" => MultipartKind::Related,
            _ => return MediaKind::Other,
        };

        self.boundary()
            .map_or(MediaKind::Other, |boundary| MediaKind::Multipart(multipart, boundary))
    }

    /// Parses a `Content-Type` header value.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// An empty value yields `text/plain` without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedContentType`] if the value does not follow
    /// the media-type grammar.
    pub fn parse(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::text_plain());
        }

        let (mime_type, parameters) = parse_media(s, true)
            .map_err(|reason| Error::MalformedContentType(format!("{s:?}: {reason}")))?;

        Ok(Self {
            mime_type,
            parameters,
        })
    }
}

/// A parsed `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Lower-cased disposition type (e.g., "attachment", "inline").
    pub disposition: String,
    /// Parameters with lower-cased names.
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a `Content-Disposition` header value.
    ///
    /// Returns `None` for an empty or malformed value; a broken
    /// disposition only means the part declares no filename.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().is_empty() {
            return None;
        }
        let (disposition, parameters) = parse_media(s, false).ok()?;
        Some(Self {
            disposition,
            parameters,
        })
    }

    /// Returns the non-empty `filename` parameter.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters
            .get("filename")
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }
}

/// Characters that end an RFC 2045 token.
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !TSPECIALS.contains(c)
}

/// Small cursor over a header value.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    const fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        if let Some(rest) = self.rest.strip_prefix(c) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    fn token(&mut self) -> &'a str {
        let end = self
            .rest
            .find(|c: char| !is_token_char(c))
            .unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        token
    }

    fn quoted_string(&mut self) -> std::result::Result<String, String> {
        let rest = self.rest;
        let mut value = String::new();
        let mut chars = rest.char_indices();
        while let Some((idx, c)) = chars.next() {
            match c {
                '"' => {
                    self.rest = &rest[idx + 1..];
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                _ => value.push(c),
            }
        }
        Err("unterminated quoted string".to_string())
    }

    const fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

/// Parses `value *(";" param)`, returning the lower-cased value and the
/// parameter map.
fn parse_media(
    s: &str,
    require_subtype: bool,
) -> std::result::Result<(String, HashMap<String, String>), String> {
    let mut cursor = Cursor::new(s);
    cursor.skip_whitespace();

    let main_type = cursor.token();
    if main_type.is_empty() {
        return Err("no media type".to_string());
    }
    let mut media = main_type.to_ascii_lowercase();

    cursor.skip_whitespace();
    if cursor.eat('/') {
        cursor.skip_whitespace();
        let sub_type = cursor.token();
        if sub_type.is_empty() {
            return Err("expected token after slash".to_string());
        }
        media.push('/');
        media.push_str(&sub_type.to_ascii_lowercase());
    } else if require_subtype {
        return Err("expected slash after media type".to_string());
    }

    let mut simple = HashMap::new();
    let mut extended = HashMap::new();

    loop {
        cursor.skip_whitespace();
        if cursor.is_empty() {
            break;
        }
        if !cursor.eat(';') {
            return Err(format!("unexpected content after media type: {:?}", cursor.rest));
        }
        cursor.skip_whitespace();
        if cursor.is_empty() {
            break;
        }

        let key = cursor.token().to_ascii_lowercase();
        if key.is_empty() {
            return Err("missing parameter name".to_string());
        }
        cursor.skip_whitespace();
        if !cursor.eat('=') {
            return Err(format!("missing '=' after parameter {key:?}"));
        }
        cursor.skip_whitespace();

        let value = if cursor.eat('"') {
            cursor.quoted_string()?
        } else {
            let token = cursor.token();
            if token.is_empty() {
                return Err(format!("missing value for parameter {key:?}"));
            }
            token.to_string()
        };

        let target = if key.contains('*') {
            &mut extended
        } else {
            &mut simple
        };
        if target.insert(key.clone(), value).is_some() {
            return Err(format!("duplicate parameter {key:?}"));
        }
    }

    fold_extended_parameters(&mut simple, &extended);
    Ok((media, simple))
}

/// Folds RFC 2231 parameters into `params`, overriding plain values.
/// Undecodable extended values are ignored.
fn fold_extended_parameters(params: &mut HashMap<String, String>, extended: &HashMap<String, String>) {
    let mut bases: Vec<&str> = extended
        .keys()
        .filter_map(|key| key.split('*').next())
        .collect();
    bases.sort_unstable();
    bases.dedup();

    for base in bases {
        if let Some(value) = extended.get(&format!("{base}*")) {
            if let Some(decoded) = decode_extended_value(value) {
                params.insert(base.to_string(), decoded);
            }
            continue;
        }

        let mut charset: Option<String> = None;
        let mut bytes = Vec::new();
        let mut valid = true;
        for n in 0.. {
            if let Some(piece) = extended.get(&format!("{base}*{n}*")) {
                let piece = if n == 0 {
                    let mut fields = piece.splitn(3, '\'');
                    match (fields.next(), fields.next(), fields.next()) {
                        (Some(cs), Some(_lang), Some(rest)) => {
                            charset = Some(cs.to_string());
                            rest
                        }
                        _ => {
                            valid = false;
                            break;
                        }
                    }
                } else {
                    piece.as_str()
                };
                if let Some(decoded) = percent_decode(piece) {
                    bytes.extend(decoded);
                } else {
                    valid = false;
                    break;
                }
            } else if let Some(piece) = extended.get(&format!("{base}*{n}")) {
                bytes.extend_from_slice(piece.as_bytes());
            } else {
                break;
            }
        }

        if valid && !bytes.is_empty() {
            if let Some(decoded) = decode_charset(charset.as_deref().unwrap_or("us-ascii"), bytes) {
                params.insert(base.to_string(), decoded);
            }
        }
    }
}

/// Decodes `charset'language'percent-encoded`.
fn decode_extended_value(value: &str) -> Option<String> {
    let mut fields = value.splitn(3, '\'');
    let charset = fields.next()?;
    let _language = fields.next()?;
    let encoded = fields.next()?;
    let charset = if charset.is_empty() { "us-ascii" } else { charset };
    decode_charset(charset, percent_decode(encoded)?)
}

fn percent_decode(s: &str) -> Option<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
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
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.mime_type, "text/plain");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(ct.kind(), MediaKind::TextPlain);
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("Multipart/Mixed; Boundary=\"----=_Part_123\"").unwrap();
        assert_eq!(ct.mime_type, "multipart/mixed");
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
        assert_eq!(
            ct.kind(),
            MediaKind::Multipart(MultipartKind::Mixed, "----=_Part_123")
        );
    }

    #[test]
    fn test_content_type_empty_defaults_to_text_plain() {
        let ct = ContentType::parse("").unwrap();
        assert_eq!(ct, ContentType::text_plain());
        assert!(ct.parameters.is_empty());

        let ct = ContentType::parse("   ").unwrap();
        assert_eq!(ct.kind(), MediaKind::TextPlain);
    }

    #[test]
    fn test_content_type_trailing_semicolon() {
        let ct = ContentType::parse("text/html;").unwrap();
        assert_eq!(ct.kind(), MediaKind::TextHtml);
    }

    #[test]
    fn test_content_type_escaped_quote() {
        let ct = ContentType::parse(r#"image/png; name="a \"b\".png""#).unwrap();
        assert_eq!(ct.name(), Some("a \"b\".png"));
    }

    #[test]
    fn test_content_type_malformed() {
        for bad in [
            "text",
            "text/",
            "/plain",
            "text/plain; charset",
            "text/plain; charset=",
            "text/plain; name=\"open",
            "text/plain garbage",
            "text/plain; a=1; A=2",
        ] {
            let err = ContentType::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::MalformedContentType(_)),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_multipart_without_boundary_is_other() {
        let ct = ContentType::parse("multipart/related").unwrap();
        assert_eq!(ct.kind(), MediaKind::Other);

        let ct = ContentType::parse("multipart/alternative; boundary=\"\"").unwrap();
        assert_eq!(ct.kind(), MediaKind::Other);
    }

    #[test]
    fn test_kind_other() {
        let ct = ContentType::parse("image/jpeg").unwrap();
        assert_eq!(ct.kind(), MediaKind::Other);
    }

    #[test]
    fn test_name_falls_back_to_filename_parameter() {
        let ct = ContentType::parse("application/pdf; filename=report.pdf").unwrap();
        assert_eq!(ct.name(), Some("report.pdf"));

        let ct = ContentType::parse("application/pdf; name=\"\"").unwrap();
        assert_eq!(ct.name(), None);
    }

    #[test]
    fn test_rfc2231_extended_value() {
        let ct =
            ContentType::parse("application/pdf; name*=UTF-8''%E2%82%AC%20rates.pdf").unwrap();
        assert_eq!(ct.name(), Some("€ rates.pdf"));
    }

    #[test]
    fn test_rfc2231_rejects_signed_percent_escape() {
        assert_eq!(percent_decode("%+1"), None);
        assert_eq!(percent_decode("%4"), None);
        assert_eq!(percent_decode("a%2Fb").unwrap(), b"a/b");

        let ct = ContentType::parse("application/pdf; name*=UTF-8''%+1x.pdf").unwrap();
        assert_eq!(ct.name(), None);
    }

    #[test]
    fn test_rfc2231_continuations() {
        let cd = ContentDisposition::parse(
            "attachment; filename*0*=utf-8''caf%C3%A9; filename*1=\"-menu.txt\"",
        )
        .unwrap();
        assert_eq!(cd.filename(), Some("café-menu.txt"));
    }

    #[test]
    fn test_content_disposition_parse() {
        let cd = ContentDisposition::parse("Attachment; filename=\"f.txt\"").unwrap();
        assert_eq!(cd.disposition, "attachment");
        assert_eq!(cd.filename(), Some("f.txt"));

        let cd = ContentDisposition::parse("inline").unwrap();
        assert_eq!(cd.filename(), None);
    }

    #[test]
    fn test_content_disposition_malformed_is_none() {
        assert!(ContentDisposition::parse("").is_none());
        assert!(ContentDisposition::parse("attachment; filename=\"x").is_none());
    }
}
