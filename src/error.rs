//! Error types for scw-exec

use std::time::Duration;

use thiserror::Error;

/// Main error type for scw-exec
#[derive(Debug, Error)]
pub enum ExecError {
    /// The server API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure talking to the API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No server matches the given identifier
    #[error("No such server: {0}")]
    NotFound(String),

    /// Several servers match the given identifier
    #[error("Too many candidates for {needle}: {candidates}")]
    Ambiguous { needle: String, candidates: String },

    /// The server has no public IP address to connect to
    #[error("Server {0} has no public IP address")]
    NoPublicAddress(String),

    /// A readiness wait exceeded its deadline
    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),

    /// A readiness wait was interrupted
    #[error("Interrupted while waiting for {0}")]
    Cancelled(String),

    /// The ssh client could not be started
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ExecError
pub type Result<T> = std::result::Result<T, ExecError>;

impl ExecError {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        ExecError::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        ExecError::Config(msg.into())
    }

    /// Create a not-found error for an identifier
    pub fn not_found(needle: impl Into<String>) -> Self {
        ExecError::NotFound(needle.into())
    }
}
