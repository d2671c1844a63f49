//! JSON view of a decoded message.

use mailsift::{Attachment, Email, EmbeddedFile};
use serde::Serialize;

/// What the CLI prints for one message.
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub subject: Option<&'a str>,
    pub from: Option<&'a str>,
    pub date: Option<&'a str>,
    pub message_id: Option<&'a str>,
    pub content_type: &'a str,
    pub text_body: &'a str,
    pub html_body: &'a str,
    /// Size of the opaque body, for messages that are neither text nor
    /// multipart.
    pub content_len: Option<usize>,
    pub attachments: Vec<FileSummary<'a>>,
    pub embedded_files: Vec<FileSummary<'a>>,
}

/// One attachment or inline file, without its bytes.
#[derive(Debug, Serialize)]
pub struct FileSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<&'a str>,
    pub filename: Option<&'a str>,
    pub content_type: &'a str,
    pub size: usize,
}

impl<'a> From<&'a Attachment> for FileSummary<'a> {
    fn from(attachment: &'a Attachment) -> Self {
        Self {
            cid: None,
            filename: Some(&attachment.filename),
            content_type: &attachment.content_type,
            size: attachment.data.len(),
        }
    }
}

impl<'a> From<&'a EmbeddedFile> for FileSummary<'a> {
    fn from(file: &'a EmbeddedFile) -> Self {
        Self {
            cid: Some(&file.cid),
            filename: file.filename.as_deref(),
            content_type: &file.content_type,
            size: file.data.len(),
        }
    }
}

impl<'a> From<&'a Email> for Summary<'a> {
    fn from(email: &'a Email) -> Self {
        Self {
            subject: email.subject(),
            from: email.from(),
            date: email.date(),
            message_id: email.message_id(),
            content_type: &email.content_type,
            text_body: &email.text_body,
            html_body: &email.html_body,
            content_len: email.content.as_ref().map(Vec::len),
            attachments: email.attachments.iter().map(FileSummary::from).collect(),
            embedded_files: email.embedded_files.iter().map(FileSummary::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json() {
        let raw = concat!(
            "Subject: hello\r\n",
            "Date: Fri, 16 Oct 2026 09:00:00 +0000\r\n",
            "Message-ID: <m1@example.com>\r\n",
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "\r\n",
            "body\r\n",
            "--b\r\n",
            "Content-Type: application/octet-stream; name=blob.bin\r\n",
            "\r\n",
            "1234\r\n",
            "--b--\r\n"
        );
        let email = mailsift::parse(raw.as_bytes()).unwrap();
        let json = serde_json::to_value(Summary::from(&email)).unwrap();

        assert_eq!(json["subject"], "hello");
        assert_eq!(json["date"], "Fri, 16 Oct 2026 09:00:00 +0000");
        assert_eq!(json["message_id"], "<m1@example.com>");
        assert_eq!(json["from"], serde_json::Value::Null);
        assert_eq!(json["text_body"], "body");
        assert_eq!(json["content_len"], serde_json::Value::Null);
        assert_eq!(json["attachments"][0]["filename"], "blob.bin");
        assert_eq!(json["attachments"][0]["size"], 4);
        assert!(json["attachments"][0].get("cid").is_none());
    }
}
