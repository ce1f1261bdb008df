//! Error types for the funding tracker

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the funding tracker
#[derive(Error, Debug)]
pub enum Error {
    // Input validation errors
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    // Upstream history source errors
    #[error("Upstream history fetch failed: {0}")]
    UpstreamFetch(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::UpstreamFetch(_))
    }

    /// Check if this error was caused by bad caller input
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::InvalidAddress(_))
    }
}

// Conversion from reqwest transport errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::UpstreamFetch(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
