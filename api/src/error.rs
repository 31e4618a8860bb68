//! Error types for the FocusApp API client

use focusapp_core::storage::StorageError;
use thiserror::Error;

/// Errors that can occur when talking to the FocusApp backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configured base URL is not an absolute http(s) URL
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// An authenticated call was made with no access token stored
    #[error("No access token available")]
    MissingToken,

    /// Reading the stored access token failed
    #[error("Token storage failed: {0}")]
    Storage(#[from] StorageError),

    /// HTTP request failed before a response was received
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Unauthorized - session missing, expired or revoked
    #[error("Unauthorized - session is no longer valid")]
    Unauthorized,

    /// API returned a non-success status
    #[error("API error (status {status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// API answered 2xx but with `success: false`
    #[error("Request rejected: {message}")]
    Rejected {
        /// Message from the response envelope
        message: String,
    },
}

impl ApiError {
    /// HTTP status carried by this error, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this error means the session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_extraction() {
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert_eq!(
            ApiError::Status {
                status: 503,
                message: String::new()
            }
            .status(),
            Some(503)
        );
        assert_eq!(ApiError::RequestFailed("timeout".into()).status(), None);
        assert_eq!(ApiError::MissingToken.status(), None);
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(
            ApiError::Status {
                status: 401,
                message: String::new()
            }
            .is_unauthorized()
        );
        assert!(
            !ApiError::Status {
                status: 403,
                message: String::new()
            }
            .is_unauthorized()
        );
        assert!(!ApiError::MissingToken.is_unauthorized());
    }
}
