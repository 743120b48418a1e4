//! Typed outcome of every remote operation.
//!
//! A call either yields its payload or exactly one of two errors: the server
//! was reached but refused or garbled the answer, or no answer was obtainable.

use thiserror::Error;

/// Message used for every transport-level failure.
pub const NO_INTERNET_MESSAGE: &str = "No internet connection";

/// Message used when the caller cancelled an attachment upload.
pub const UPLOAD_CANCELLED_MESSAGE: &str = "File upload cancelled";

/// Error half of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// Transport succeeded but the server reported failure, or the body was
    /// absent or could not be parsed.
    #[error("API call failed: {0}")]
    ApiCallError(String),
    /// The transport call itself failed; no response was obtained.
    #[error("{0}")]
    NoInternetConnection(String),
}

impl ResponseError {
    pub fn api(message: impl Into<String>) -> Self {
        ResponseError::ApiCallError(message.into())
    }

    pub fn no_internet() -> Self {
        ResponseError::NoInternetConnection(NO_INTERNET_MESSAGE.to_string())
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ResponseError::ApiCallError(m) | ResponseError::NoInternetConnection(m) => m,
        }
    }

    /// Whether this error was produced by a cancelled attachment upload.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResponseError::ApiCallError(m) if m == UPLOAD_CANCELLED_MESSAGE)
    }

    pub fn is_no_internet(&self) -> bool {
        matches!(self, ResponseError::NoInternetConnection(_))
    }
}

/// Result of a remote operation: a payload or a [`ResponseError`], never both.
pub type Response<T> = Result<T, ResponseError>;
