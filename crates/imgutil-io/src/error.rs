//! Parse error types
//!
//! Every format module maps its decoder's errors into [`ParseError`], so
//! callers handle one error type regardless of the input format.

use std::io;
use thiserror::Error;

/// Error type for image stream parsing and encoding.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Standard I/O error from the caller's reader or writer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The format is not recognized, not decodable, or not enabled via features
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The stream is truncated or its metadata is inconsistent
    #[error("malformed stream: {0}")]
    MalformedStream(String),

    /// A format-specific decoder returned an error
    #[error("decode error: {0}")]
    DecodeError(String),

    /// A format-specific encoder returned an error
    #[error("encode error: {0}")]
    EncodeError(String),

    /// An error from the core library (e.g. palette overflow)
    #[error("core error: {0}")]
    Core(#[from] imgutil_core::Error),
}

impl ParseError {
    /// Map a read failure, treating end-of-input as truncation of `what`.
    pub(crate) fn from_read(err: io::Error, what: &str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ParseError::MalformedStream(format!("truncated {what}"))
        } else {
            ParseError::Io(err)
        }
    }
}

/// Convenience alias for parse results.
pub type ParseResult<T> = Result<T, ParseError>;
