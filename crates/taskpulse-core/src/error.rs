//! Error types for TaskPulse.

use thiserror::Error;

/// Result type alias using TaskPulse's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TaskPulse operations.
///
/// Notification store operations never fail; these variants cover the
/// boundaries around it (event channel, REST backend, configuration, forms).
#[derive(Error, Debug)]
pub enum Error {
    /// Event channel connection or transport failure
    #[error("Channel error: {0}")]
    Channel(String),

    /// Resource not found on the backend
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (form validation)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Authentication failed or no token available
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Message suitable for showing to the user, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            Error::Channel(msg)
            | Error::NotFound(msg)
            | Error::Serialization(msg)
            | Error::Config(msg)
            | Error::InvalidInput(msg)
            | Error::Request(msg)
            | Error::Unauthorized(msg)
            | Error::Forbidden(msg) => msg.clone(),
            Error::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
