//! Notification endpoints.
//!
//! These use [`ApiClient::send_json`], the high-level convention, with the
//! stored access token.

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::responses::{Ack, Envelope, UnreadCountResponse};
use focusapp_core::model::NotificationItem;

impl ApiClient {
    /// Every notification of the signed-in user, newest first.
    ///
    /// An envelope with `success: false` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns transport, status and parsing errors.
    pub async fn notifications(&self) -> Result<Vec<NotificationItem>, ApiError> {
        self.notification_list("notifications/").await
    }

    /// Unread notifications only.
    ///
    /// # Errors
    ///
    /// Same as [`notifications`](Self::notifications).
    pub async fn unread_notifications(&self) -> Result<Vec<NotificationItem>, ApiError> {
        self.notification_list("notifications/unread/").await
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns transport, status and parsing errors, or `ApiError::Rejected`
    /// when the backend reports failure.
    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let response: UnreadCountResponse = self
            .send_json(ApiRequest::get("notifications/count/").authenticated())
            .await?;

        if response.success {
            Ok(response.unread_count)
        } else {
            Err(ApiError::Rejected {
                message: "unread count unavailable".to_string(),
            })
        }
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns transport, status and parsing errors, or `ApiError::Rejected`.
    pub async fn mark_notification_read(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("notifications/mark-as-read/{id}/");
        self.send_json::<Ack>(ApiRequest::patch(path).authenticated())
            .await?
            .into_result()
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// Returns transport, status and parsing errors, or `ApiError::Rejected`.
    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        self.send_json::<Ack>(ApiRequest::patch("notifications/mark-all-as-read/").authenticated())
            .await?
            .into_result()
    }

    async fn notification_list(&self, path: &str) -> Result<Vec<NotificationItem>, ApiError> {
        let envelope: Envelope<Vec<NotificationItem>> =
            self.send_json(ApiRequest::get(path).authenticated()).await?;

        if !envelope.success {
            tracing::debug!(path, message = ?envelope.message, "Notification list not available");
            return Ok(Vec::new());
        }
        Ok(envelope.data.unwrap_or_default())
    }
}
