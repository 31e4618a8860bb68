//! Response bodies of the FocusApp backend.

use crate::error::ApiError;
use serde::Deserialize;

/// Standard `{success, data, message}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Whether the backend considers the call successful
    #[serde(default)]
    pub success: bool,
    /// Payload, absent on failure
    pub data: Option<T>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Extract the payload of a successful envelope.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when `success` is false or `data` is missing.
    pub fn into_data(self) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ApiError::Rejected {
                message: self.message.unwrap_or_else(|| "missing data".to_string()),
            }),
        }
    }
}

/// Body of `users/token/`.
///
/// Both fields are optional on the wire; a pair is only formed when both are
/// present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    /// Access token
    #[serde(default)]
    pub access: Option<String>,
    /// Refresh token
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Body of `notifications/count/`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UnreadCountResponse {
    /// Whether the count is valid
    #[serde(default)]
    pub success: bool,
    /// Number of unread notifications
    #[serde(default)]
    pub unread_count: u64,
}

/// Bare `{success, message}` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    /// Whether the mutation was applied
    #[serde(default)]
    pub success: bool,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    /// Turn a negative acknowledgement into an error.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when `success` is false.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: self.message.unwrap_or_else(|| "request rejected".to_string()),
            })
        }
    }
}
