//! MIME decoding utilities.
//!
//! Supports the body transfer encodings (identity, Base64,
//! Quoted-Printable) and RFC 2047 encoded words in header values.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Body transfer encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// No transformation: absent header, `7bit`, `8bit` or `binary`.
    #[default]
    Identity,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses a `Content-Transfer-Encoding` value (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncoding`] for any name this decoder
    /// does not implement. Unknown encodings are never passed through.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "7bit" | "8bit" | "binary" => Ok(Self::Identity),
            "base64" => Ok(Self::Base64),
            "quoted-printable" => Ok(Self::QuotedPrintable),
            _ => Err(Error::UnsupportedEncoding(s.trim().to_string())),
        }
    }

    /// Decodes `data` according to this encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEncoding`] if `data` is not valid for the
    /// encoding.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Identity => Ok(data.to_vec()),
            Self::Base64 => decode_base64(data),
            Self::QuotedPrintable => decode_quoted_printable(data),
        }
    }
}

/// Decodes Base64 data, ignoring line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

pub(crate) const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        if data[i] != b'=' {
            result.push(data[i]);
            i += 1;
            continue;
        }

        // Soft line break, possibly after transport padding
        let mut j = i + 1;
        while j < data.len() && matches!(data[j], b' ' | b'\t') {
            j += 1;
        }
        match data.get(j..) {
            Some([]) => {
                i = j;
                continue;
            }
            Some([b'\n', ..]) => {
                i = j + 1;
                continue;
            }
            Some([b'\r', b'\n', ..]) => {
                i = j + 2;
                continue;
            }
            _ => {}
        }

        // Hex encoded byte
        match (
            data.get(i + 1).copied().and_then(hex_value),
            data.get(i + 2).copied().and_then(hex_value),
        ) {
            (Some(hi), Some(lo)) => {
                result.push((hi << 4) | lo);
                i += 3;
            }
            _ => {
                return Err(Error::InvalidEncoding(format!(
                    "quoted-printable: invalid escape at offset {i}"
                )));
            }
        }
    }

    Ok(result)
}

/// Converts raw bytes in `charset` to a string.
///
/// Only UTF-8, US-ASCII and ISO-8859-1 are understood; any other charset
/// yields `None`.
pub(crate) fn decode_charset(charset: &str, bytes: Vec<u8>) -> Option<String> {
    match charset.trim().to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8(bytes).ok(),
        "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => {
            Some(bytes.into_iter().map(char::from).collect())
        }
        _ => None,
    }
}

/// Decodes the `Q` encoding of an encoded word.
fn decode_q(text: &str) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                out.push((hi << 4) | lo);
                i += 2;
            }
            b'?' => return None,
            b @ (b' '..=b'~' | b'\t') => out.push(b),
            _ => return None,
        }
        i += 1;
    }
    Some(out)
}

/// Decodes one encoded word at the start of `s`.
///
/// Returns the decoded text and the unconsumed remainder.
fn decode_word(s: &str) -> Option<(String, &str)> {
    let rest = s.strip_prefix("=?")?;
    let (charset, rest) = rest.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let (text, rest) = (&rest[..end], &rest[end + 2..]);

    // RFC 2231 allows a language suffix: `UTF-8*en`
    let charset = charset.split('*').next().unwrap_or_default();
    if charset.is_empty() {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => STANDARD.decode(text).ok()?,
        "Q" | "q" => decode_q(text)?,
        _ => return None,
    };

    Some((decode_charset(charset, bytes)?, rest))
}

/// Decodes a token made of one or more abutting RFC 2047 encoded words.
///
/// Format: `=?charset?encoding?encoded-text?=`
///
/// Returns `None` unless the whole token decodes.
#[must_use]
pub fn decode_rfc2047(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    let mut decoded = String::new();
    let mut rest = token;
    while !rest.is_empty() {
        let (word, remainder) = decode_word(rest)?;
        decoded.push_str(&word);
        rest = remainder;
    }
    Some(decoded)
}

/// Decodes the encoded words of a header value such as a filename or a
/// `Content-Id`.
///
/// The value is split on single spaces and every token is decoded on its
/// own. Decoded tokens are joined with no separator; a token that does
/// not decode is kept verbatim and, unless it is the first token, gets
/// back the space the split removed.
#[must_use]
pub fn decode_header_words(value: &str) -> String {
    let mut result = String::with_capacity(value.len());

    for (index, token) in value.split(' ').enumerate() {
        if let Some(decoded) = decode_rfc2047(token) {
            result.push_str(&decoded);
        } else {
            if index > 0 {
                result.push(' ');
            }
            result.push_str(token);
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("").unwrap(), TransferEncoding::Identity);
        assert_eq!(TransferEncoding::parse("7bit").unwrap(), TransferEncoding::Identity);
        assert_eq!(TransferEncoding::parse("8BIT").unwrap(), TransferEncoding::Identity);
        assert_eq!(TransferEncoding::parse("binary").unwrap(), TransferEncoding::Identity);
        assert_eq!(TransferEncoding::parse(" Base64 ").unwrap(), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable").unwrap(),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_transfer_encoding_unsupported() {
        let err = TransferEncoding::parse("quoted-unknown").unwrap_err();
        match err {
            Error::UnsupportedEncoding(name) => assert_eq!(name, "quoted-unknown"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identity_passes_bytes_through() {
        let data = b"\x00\xffraw =41 bytes\r\n";
        assert_eq!(TransferEncoding::Identity.decode(data).unwrap(), data.to_vec());
    }

    #[test]
    fn test_base64_decode() {
        assert_eq!(decode_base64(b"QUJD").unwrap(), b"ABC");
        assert_eq!(
            decode_base64(b"SGVsbG8s\r\nIFdvcmxk\r\nIQ==\r\n").unwrap(),
            b"Hello, World!"
        );
    }

    #[test]
    fn test_base64_invalid() {
        let err = TransferEncoding::Base64.decode(b"not*base64").unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");

        let decoded = decode_quoted_printable(b"a=3db").unwrap();
        assert_eq!(decoded, b"a=b");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=  \nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"trailing=").unwrap(), b"trailing");
    }

    #[test]
    fn test_quoted_printable_invalid_escape() {
        let err = decode_quoted_printable(b"bad=ZZ").unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }

    #[test]
    fn test_rfc2047_decode() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo?=").unwrap(), "Héllo");
        assert_eq!(decode_rfc2047("=?ISO-8859-1?q?caf=E9_au_lait?=").unwrap(), "café au lait");
        assert_eq!(decode_rfc2047("=?UTF-8*en?Q?Hi?=").unwrap(), "Hi");
    }

    #[test]
    fn test_rfc2047_abutting_words() {
        assert_eq!(
            decode_rfc2047("=?UTF-8?Q?Hi?==?UTF-8?Q?There?=").unwrap(),
            "HiThere"
        );
    }

    #[test]
    fn test_rfc2047_rejects_plain_and_broken_words() {
        assert_eq!(decode_rfc2047(""), None);
        assert_eq!(decode_rfc2047("Hello"), None);
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), None);
        assert_eq!(decode_rfc2047("=??Q?abc?="), None);
        assert_eq!(decode_rfc2047("=?koi8-r?Q?abc?="), None);
        assert_eq!(decode_rfc2047("=?utf-8?Q?abc?=tail"), None);
    }

    #[test]
    fn test_rfc2047_q_rejects_question_mark() {
        assert_eq!(decode_rfc2047("=?UTF-8?Q?a?b?="), None);
        assert_eq!(decode_header_words("=?UTF-8?Q?a?b?="), "=?UTF-8?Q?a?b?=");
    }

    #[test]
    fn test_header_words_keep_space_before_literal() {
        assert_eq!(decode_header_words("=?UTF-8?Q?Hi?= World"), "Hi World");
    }

    #[test]
    fn test_header_words_drop_space_between_encoded() {
        assert_eq!(decode_header_words("=?UTF-8?Q?Hi?= =?UTF-8?Q?There?="), "HiThere");
    }

    #[test]
    fn test_header_words_literal() {
        assert_eq!(decode_header_words("<img1>"), "<img1>");
        assert_eq!(decode_header_words("my report.pdf"), "my report.pdf");
        assert_eq!(decode_header_words(""), "");
    }

    #[test]
    fn test_header_words_literal_first_then_encoded() {
        assert_eq!(decode_header_words("Re: =?UTF-8?Q?caf=C3=A9?="), "Re:café");
    }
}
