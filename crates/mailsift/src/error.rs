//! Error types for message decoding.

/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Decoding error types.
///
/// Every error is fatal: the first one raised anywhere in the walk aborts
/// the whole parse and no partial [`Email`](crate::Email) is returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The envelope (top-level header block) could not be read.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A `Content-Type` header does not follow the media-type grammar.
    #[error("Malformed content type: {0}")]
    MalformedContentType(String),

    /// A `Content-Transfer-Encoding` this decoder does not know.
    #[error("Unsupported transfer encoding: {0}")]
    UnsupportedEncoding(String),

    /// A body that does not match its declared transfer encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A multipart body whose boundary structure is broken.
    #[error("Invalid multipart structure: {0}")]
    Tokenizer(String),

    /// Containers nested deeper than the configured limit.
    #[error("Multipart nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    /// I/O error while reading the message.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidEncoding(format!("base64: {err}"))
    }
}
