//! Error types for hn_reader

use thiserror::Error;

/// Result type alias for hn_reader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hn_reader
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown item category, or the single-item category used where a list is expected
    #[error("invalid item type: {0:?}")]
    InvalidItemType(String),

    /// Remote failure reported by a non-HTTP client
    #[error("remote error: {0}")]
    Remote(String),

    /// The API answered with a non-success status
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    /// Transport failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed JSON payload
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request context was cancelled
    #[error("request cancelled")]
    Cancelled,

    /// The request context ran past its deadline
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that came from talking to the remote service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Remote(_)
                | Error::Status(_)
                | Error::Network(_)
                | Error::Cancelled
                | Error::DeadlineExceeded
        )
    }
}
