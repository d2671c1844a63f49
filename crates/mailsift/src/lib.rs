//! # mailsift
//!
//! Decodes a raw email message (RFC 5322 envelope plus MIME body) into its
//! text body, HTML body, attachments and inline files.
//!
//! ## Features
//!
//! - **Recursive multipart walk**: `multipart/mixed`, `multipart/alternative`
//!   and `multipart/related`, nested in any combination
//! - **Transfer decoding**: Base64, Quoted-Printable, 7bit/8bit/binary
//! - **Header words**: RFC 2047 encoded filenames and Content-Ids, RFC 2231
//!   extended parameters
//! - **Fail-fast**: the first malformed part aborts the whole parse
//!
//! ## Quick Start
//!
//! ```ignore
//! let raw = std::fs::read("message.eml")?;
//! let email = mailsift::parse(&raw)?;
//!
//! println!("Subject: {}", email.subject().unwrap_or("(no subject)"));
//! println!("{}", email.text_body);
//! for attachment in &email.attachments {
//!     println!("{} ({} bytes)", attachment.filename, attachment.data.len());
//! }
//! ```
//!
//! ### Limiting nesting
//!
//! ```ignore
//! use mailsift::ParseOptions;
//!
//! let options = ParseOptions::builder().max_depth(8).build();
//! let email = mailsift::parse_with(&raw, &options)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod attachment;
mod boundary;
mod config;
mod content_type;
mod error;
mod header;
mod message;
mod multipart;

pub mod encoding;

pub use attachment::{Attachment, EmbeddedFile};
pub use boundary::{MultipartReader, Part};
pub use config::{DEFAULT_MAX_DEPTH, ParseOptions, ParseOptionsBuilder};
pub use content_type::{ContentDisposition, ContentType, MediaKind, MultipartKind};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::Email;

use std::io::Read;

/// Decodes a raw message with default options.
///
/// # Errors
///
/// Returns the first error met anywhere in the message; no partial result
/// is produced.
pub fn parse(data: &[u8]) -> Result<Email> {
    Email::parse(data)
}

/// Decodes a raw message with explicit options.
///
/// # Errors
///
/// Returns the first error met anywhere in the message.
pub fn parse_with(data: &[u8], options: &ParseOptions) -> Result<Email> {
    Email::parse_with(data, options)
}

/// Reads a message from `reader` to the end and decodes it.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, otherwise as [`parse`].
pub fn parse_reader<R: Read>(reader: R) -> Result<Email> {
    Email::parse_reader(reader)
}
