//! Error types for homedns
//!
//! The taxonomy is deliberately small: configuration problems are fatal at
//! startup, everything else surfaces from one poll cycle and is handled by
//! the reconciler.

use thiserror::Error;

/// Result type alias for homedns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for homedns
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// IP resolution or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success response from a provider API
    #[error("provider API error (status {status}): {body}")]
    Api {
        /// HTTP status code returned by the provider
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// Zone or record missing on the provider side
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed provider payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a provider API error from a response status and body
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Network(err.to_string())
    }
}
