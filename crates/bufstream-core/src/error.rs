use thiserror::Error;

use crate::encoding::Encoding;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The stream was destroyed; it accepts neither writes nor `end`.
    #[error("stream is not writable")]
    NotWritable,

    /// `end` was already called on this stream.
    #[error("stream is already ended")]
    AlreadyEnded,

    #[error("cannot encode text as {encoding}: {reason}")]
    Encoding { encoding: Encoding, reason: String },

    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Programmer errors: the operation is invalid in the current lifecycle
    /// state and must not be retried.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Error::NotWritable | Error::AlreadyEnded)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
