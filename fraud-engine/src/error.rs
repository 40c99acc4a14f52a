//! Error types for fraud engine

use thiserror::Error;

/// Fraud engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Required request field absent or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Collaborator (history store, device intelligence) could not answer
    #[error("Signal source unavailable: {0}")]
    SignalUnavailable(String),

    /// Collaborator lookup exceeded its time budget
    #[error("Signal lookup timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for errors the caller must fix by resubmitting the request
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, Error::MissingField(_))
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
