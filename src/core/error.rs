//! Custom error types for the application.
//!
//! Provides structured error handling with meaningful error messages
//! and proper error categorization for each domain:
//!
//! - [`ApiError`] - Network/HTTP failures from the backend API
//! - [`AuthError`] - Login and signup failures surfaced to the UI
//! - [`StorageError`] - localStorage operations for the session token
//!
//! All errors are `Clone` because a single failed fetch is delivered to
//! every caller coalesced onto it.

use thiserror::Error;

/// Network/fetch-related errors for HTTP requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Browser window not available
    #[error("Browser window not available")]
    NoWindow,
    /// Failed to create HTTP request
    #[error("Failed to create request")]
    RequestCreationFailed,
    /// Network request failed (no response, CORS, etc.)
    #[error("Network error: {0}")]
    Network(String),
    /// Request timed out
    #[error("Request timed out")]
    Timeout,
    /// Non-2xx response. `message` comes from the body when it has one.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// Failed to read response body
    #[error("Failed to read response")]
    ResponseReadFailed,
    /// Body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server answered at all (as opposed to a transport failure).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NoWindow | Self::RequestCreationFailed | Self::Network(_) | Self::Timeout
        )
    }
}

/// Login/signup errors shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// Any login failure. Status details are deliberately not exposed.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// Signup rejected by the server (e.g. email already registered).
    #[error("{0}")]
    Signup(String),
    /// A logout or newer login started before this one finished.
    #[error("Sign-in was cancelled")]
    Superseded,
}

/// Token persistence errors for localStorage operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// localStorage not available.
    #[error("localStorage not available")]
    Unavailable,
    /// Failed to save to localStorage.
    #[error("failed to save to localStorage")]
    WriteFailed,
    /// Failed to remove from localStorage.
    #[error("failed to remove from localStorage")]
    RemoveFailed,
}
