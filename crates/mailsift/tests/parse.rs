//! Integration tests for message decoding.
//!
//! Each test feeds a complete raw message through the public entry points.

#![allow(clippy::unwrap_used)]

use mailsift::{Error, ParseOptions, encoding::decode_header_words};
use proptest::prelude::*;

#[test]
fn test_text_plain_strips_single_trailing_newline() {
    let email = mailsift::parse(b"Content-Type: text/plain\r\n\r\nhello\n").unwrap();
    assert_eq!(email.text_body, "hello");

    let email = mailsift::parse(b"Content-Type: text/plain\r\n\r\nhello\n\n").unwrap();
    assert_eq!(email.text_body, "hello\n");
}

#[test]
fn test_single_part_text_ignores_unknown_transfer_encoding() {
    let raw = b"Content-Type: text/plain\r\nContent-Transfer-Encoding: x-uuencode\r\n\r\nhello\n";
    let email = mailsift::parse(raw).unwrap();
    assert_eq!(email.text_body, "hello");
}

#[test]
fn test_related_named_html_stays_in_body() {
    let raw = concat!(
        "Content-Type: multipart/related; boundary=rel\r\n",
        "\r\n",
        "--rel\r\n",
        "Content-Type: text/html; name=\"index.html\"\r\n",
        "Content-Disposition: attachment; filename=\"index.html\"\r\n",
        "\r\n",
        "<p>hi</p>\r\n",
        "--rel--\r\n"
    );

    let email = mailsift::parse(raw.as_bytes()).unwrap();
    assert_eq!(email.html_body, "<p>hi</p>");
    assert!(email.embedded_files.is_empty());
    assert!(email.attachments.is_empty());
}

#[test]
fn test_mixed_with_text_and_attachment() {
    let raw = concat!(
        "From: a@example.com\r\n",
        "Content-Type: multipart/mixed; boundary=\"mix\"\r\n",
        "\r\n",
        "--mix\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "A\r\n",
        "--mix\r\n",
        "Content-Type: text/plain\r\n",
        "Content-Disposition: attachment; filename=\"f.txt\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "QUJD\r\n",
        "--mix--\r\n"
    );

    let email = mailsift::parse(raw.as_bytes()).unwrap();
    assert_eq!(email.text_body, "A");
    assert_eq!(email.attachments.len(), 1);
    assert_eq!(email.attachments[0].filename, "f.txt");
    assert_eq!(email.attachments[0].content_type, "text/plain");
    assert_eq!(email.attachments[0].data, b"ABC");
    assert!(email.embedded_files.is_empty());
}

#[test]
fn test_alternative_populates_both_bodies() {
    let raw = concat!(
        "Content-Type: multipart/alternative; boundary=alt\r\n",
        "\r\n",
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

    let email = mailsift::parse(raw.as_bytes()).unwrap();
    assert_eq!(email.text_body, "plain");
    assert_eq!(email.html_body, "<b>x</b>");
    assert!(email.attachments.is_empty());
}

#[test]
fn test_related_inline_image() {
    let raw = concat!(
        "Content-Type: multipart/related; boundary=rel\r\n",
        "\r\n",
        "--rel\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<img src=\"cid:img1\">\r\n",
        "--rel\r\n",
        "Content-Type: image/png\r\n",
        "Content-Id: <img1>\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "iVBORw==\r\n",
        "--rel--\r\n"
    );

    let email = mailsift::parse(raw.as_bytes()).unwrap();
    assert_eq!(email.html_body, "<img src=\"cid:img1\">");
    assert_eq!(email.embedded_files.len(), 1);
    let file = &email.embedded_files[0];
    assert_eq!(file.cid, "img1");
    assert_eq!(file.filename, None);
    assert_eq!(file.content_type, "image/png");
    assert_eq!(file.data, b"\x89PNG");
}

#[test]
fn test_unknown_transfer_encoding_fails() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=mix\r\n",
        "\r\n",
        "--mix\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "fine\r\n",
        "--mix\r\n",
        "Content-Type: text/plain\r\n",
        "Content-Transfer-Encoding: quoted-unknown\r\n",
        "\r\n",
        "broken\r\n",
        "--mix--\r\n"
    );

    match mailsift::parse(raw.as_bytes()) {
        Err(Error::UnsupportedEncoding(name)) => assert_eq!(name, "quoted-unknown"),
        other => panic!("expected UnsupportedEncoding, got {other:?}"),
    }
}

#[test]
fn test_typical_newsletter_structure() {
    let raw = concat!(
        "Subject: =?UTF-8?Q?Caf=C3=A9?= news\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "This is a multi-part message in MIME format.\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=\"alt\"\r\n",
        "\r\n",
        "--alt\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "Caf=C3=A9 menu\r\n",
        "--alt\r\n",
        "Content-Type: multipart/related; boundary=\"rel\"\r\n",
        "\r\n",
        "--rel\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "\r\n",
        "<img src=\"cid:logo@x\">\r\n",
        "--rel\r\n",
        "Content-Type: image/gif\r\n",
        "Content-ID: <logo@x>\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "R0lGODlh\r\n",
        "--rel--\r\n",
        "\r\n",
        "--alt--\r\n",
        "\r\n",
        "--outer\r\n",
        "Content-Type: application/pdf; name=\"=?UTF-8?B?bWVuw7oucGRm?=\"\r\n",
        "Content-Disposition: attachment\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "JVBERi0=\r\n",
        "--outer--\r\n"
    );

    let email = mailsift::parse(raw.as_bytes()).unwrap();
    assert_eq!(email.subject(), Some("=?UTF-8?Q?Caf=C3=A9?= news"));
    assert_eq!(email.text_body, "Café menu");
    assert_eq!(email.html_body, "<img src=\"cid:logo@x\">");

    assert_eq!(email.embedded_files.len(), 1);
    assert_eq!(email.embedded_files[0].cid, "logo@x");
    assert_eq!(email.embedded_files[0].data, b"GIF89a");

    assert_eq!(email.attachments.len(), 1);
    assert_eq!(email.attachments[0].filename, "menú.pdf");
    assert_eq!(email.attachments[0].content_type, "application/pdf");
    assert_eq!(email.attachments[0].data, b"%PDF-");
}

#[test]
fn test_broken_nested_body_discards_everything() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=mix\r\n",
        "\r\n",
        "--mix\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "kept?\r\n",
        "--mix\r\n",
        "Content-Type: multipart/related; boundary=rel\r\n",
        "\r\n",
        "--rel\r\n",
        "\r\n",
        "never closed\r\n",
        "--mix--\r\n"
    );

    let err = mailsift::parse(raw.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Tokenizer(_)));
}

#[test]
fn test_invalid_base64_attachment_fails() {
    let raw = concat!(
        "Content-Type: multipart/mixed; boundary=mix\r\n",
        "\r\n",
        "--mix\r\n",
        "Content-Disposition: attachment; filename=x.bin\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "@@@@\r\n",
        "--mix--\r\n"
    );

    let err = mailsift::parse(raw.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::InvalidEncoding(_)));
}

#[test]
fn test_malformed_envelope() {
    let err = mailsift::parse(b"this is not a header\r\n\r\nbody").unwrap_err();
    assert!(matches!(err, Error::MalformedMessage(_)));
}

#[test]
fn test_deep_nesting_is_bounded() {
    let depth = 5;
    let mut raw = String::from("Content-Type: multipart/alternative; boundary=b0\r\n\r\n");
    for level in 0..depth {
        let next = if level % 2 == 0 { "related" } else { "alternative" };
        raw.push_str(&format!(
            "--b{level}\r\nContent-Type: multipart/{next}; boundary=b{}\r\n\r\n",
            level + 1
        ));
    }
    raw.push_str(&format!("--b{depth}\r\n\r\ncore\r\n--b{depth}--\r\n"));
    for level in (0..depth).rev() {
        raw.push_str(&format!("--b{level}--\r\n"));
    }

    let email = mailsift::parse(raw.as_bytes()).unwrap();
    assert_eq!(email.text_body, "core");

    let options = ParseOptions::builder().max_depth(3).build();
    let err = mailsift::parse_with(raw.as_bytes(), &options).unwrap_err();
    assert!(matches!(err, Error::NestingTooDeep(3)));
}

#[test]
fn test_io_error_is_reported() {
    struct FailingReader;

    impl std::io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk on fire"))
        }
    }

    let err = mailsift::parse_reader(FailingReader).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_header_word_examples() {
    assert_eq!(decode_header_words("=?UTF-8?Q?Hi?= World"), "Hi World");
    assert_eq!(decode_header_words("=?UTF-8?Q?Hi?==?UTF-8?Q?There?="), "HiThere");
}

proptest! {
    #[test]
    fn prop_parse_is_idempotent(
        text in "[a-zA-Z0-9 .,]{0,40}",
        html in "[a-zA-Z0-9 <>/]{0,40}",
        payload in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&payload);
        let raw = format!(
            "Content-Type: multipart/mixed; boundary=zz\r\n\r\n\
             --zz\r\nContent-Type: multipart/alternative; boundary=yy\r\n\r\n\
             --yy\r\nContent-Type: text/plain\r\n\r\n{text}\r\n\
             --yy\r\nContent-Type: text/html\r\n\r\n{html}\r\n--yy--\r\n\
             --zz\r\nContent-Disposition: attachment; filename=p.bin\r\n\
             Content-Transfer-Encoding: base64\r\n\r\n{encoded}\r\n--zz--\r\n"
        );

        let first = mailsift::parse(raw.as_bytes()).unwrap();
        let second = mailsift::parse(raw.as_bytes()).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first.text_body, &text);
        prop_assert_eq!(&first.html_body, &html);
        prop_assert_eq!(&first.attachments[0].data, &payload);
    }

    #[test]
    fn prop_plain_words_survive_header_decoding(value in "[a-zA-Z0-9.<>@-]{1,12}( [a-zA-Z0-9.<>@-]{1,12}){0,4}") {
        prop_assert_eq!(decode_header_words(&value), value);
    }
}
