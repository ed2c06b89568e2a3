//! Error types for CloudPanel

use thiserror::Error;

/// Result type alias using CloudPanel Error
pub type Result<T> = std::result::Result<T, Error>;

/// Shown for every transport and decode failure.
pub const REQUEST_FAILED_MESSAGE: &str = "Unable to complete the request. Please try again.";

/// Shown when an authenticated request is rejected and the session is dropped.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please sign in again.";

/// CloudPanel error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed user input, caught before any network call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not be completed (no response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("Backend rejected request ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    BackendRejection { status: u16, detail: Option<String> },

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// An authenticated request was rejected for authorization reasons
    #[error("Session expired")]
    AuthExpired,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Message suitable for a transient notification.
    ///
    /// Backend `detail` strings are surfaced verbatim; transport and decode
    /// failures collapse into one generic message; everything else falls back
    /// to the operation-specific `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Validation(e) => e.to_string(),
            Error::BackendRejection {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            Error::BackendRejection { .. } => fallback.to_string(),
            Error::Transport(_) | Error::Decode(_) => REQUEST_FAILED_MESSAGE.to_string(),
            Error::AuthExpired => SESSION_EXPIRED_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Error::AuthExpired)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Form input that cannot be turned into a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in the required field: {field}")]
    MissingField { field: &'static str },

    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Nothing to update")]
    EmptyPatch,
}
