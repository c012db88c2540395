//! Error types for ledger-api.
//!
//! These never escape the high-level client operations; those report
//! failures as [`Envelope`](crate::Envelope) values instead.

use thiserror::Error;

/// Result type alias using ledger-api's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ledger-api operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Path discovery error.
    #[error("path error: {0}")]
    Path(String),

    /// HTTP transport error (client construction, connect, timeout).
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
