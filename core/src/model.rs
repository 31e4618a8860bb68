//! Wire types shared across the client.
//!
//! Field names follow the REST backend (`snake_case`), with a few renames where
//! the backend uses a Rust keyword (`type`) or an older alias (`profile_pic`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username/password pair posted to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username (the backend does not accept e-mail here).
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl Credentials {
    /// Create a new credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Access/refresh token pair returned by `users/token/`.
///
/// The two tokens only ever exist together; there is no way to build a
/// `TokenPair` with just one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access: String,
    /// Long-lived token used for revocation on logout.
    pub refresh: String,
}

impl TokenPair {
    /// Create a token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

/// Identity of the logged-in user, fetched once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Backend user id.
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Profile picture URL, if the user uploaded one.
    #[serde(default, alias = "profile_pic", skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,

    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserSummary {
    /// Create a summary with only the mandatory fields.
    #[must_use]
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            profile_picture_url: None,
            first_name: None,
            last_name: None,
        }
    }
}

/// Account data posted to `users/register/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Desired username.
    pub username: String,
    /// E-mail address.
    pub email: String,
    /// Password (validated server-side).
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Date of birth, `YYYY-MM-DD`. The backend rejects minors.
    pub date_of_birth: String,
}

/// User who triggered a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationActor {
    /// Backend user id.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Profile picture URL.
    #[serde(default, alias = "profile_pic", skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

/// A notification as delivered by `notifications/`.
///
/// Created server-side and never created or deleted by the client; the only
/// local mutation is flipping `is_read` after a mark-as-read call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Notification id.
    pub id: i64,

    /// Server-rendered message ("alice ha comentado tu publicación.").
    pub message: String,

    /// Notification kind (`comment`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Whether the recipient has read it.
    pub is_read: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Id of the object the notification points at.
    #[serde(default)]
    pub target_id: Option<i64>,

    /// Model name of the object the notification points at (`postcomment`, ...).
    #[serde(default, rename = "target_type")]
    pub target_kind: Option<String>,

    /// User who caused the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<NotificationActor>,
}

impl NotificationItem {
    /// Client route this notification links to, if it links anywhere.
    ///
    /// # Examples
    ///
    /// ```
    /// # use focusapp_core::NotificationItem;
    /// # use chrono::Utc;
    /// let item = NotificationItem {
    ///     id: 1,
    ///     message: "bob ha comentado tu publicación.".to_string(),
    ///     kind: "comment".to_string(),
    ///     is_read: false,
    ///     created_at: Utc::now(),
    ///     target_id: Some(42),
    ///     target_kind: Some("postcomment".to_string()),
    ///     actor: None,
    /// };
    /// assert_eq!(item.target_route().as_deref(), Some("/posts/42/"));
    /// ```
    #[must_use]
    pub fn target_route(&self) -> Option<String> {
        match (self.target_id, self.target_kind.as_deref()) {
            (Some(id), Some("postcomment")) => Some(format!("/posts/{id}/")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_deserializes_backend_shape() {
        let item: NotificationItem = serde_json::from_value(json!({
            "id": 7,
            "recipient": "alice",
            "actor": {"id": 2, "username": "bob", "profile_pic": null},
            "type": "comment",
            "target_id": 13,
            "target_type": "postcomment",
            "is_read": false,
            "created_at": "2025-01-01T10:00:00.123456Z",
            "message": "bob ha comentado tu publicación."
        }))
        .unwrap();

        assert_eq!(item.kind, "comment");
        assert_eq!(item.target_kind.as_deref(), Some("postcomment"));
        assert_eq!(item.actor.unwrap().username, "bob");
        assert!(!item.is_read);
    }

    #[test]
    fn test_notification_without_target() {
        let item: NotificationItem = serde_json::from_value(json!({
            "id": 8,
            "type": "comment",
            "is_read": true,
            "created_at": "2025-01-01T10:00:00Z",
            "message": "x"
        }))
        .unwrap();

        assert_eq!(item.target_route(), None);
    }

    #[test]
    fn test_user_summary_accepts_profile_pic_alias() {
        let user: UserSummary = serde_json::from_value(json!({
            "id": 1,
            "username": "alice",
            "profile_pic": "https://cdn.example.com/a.png"
        }))
        .unwrap();

        assert_eq!(
            user.profile_picture_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(user.first_name, None);
    }
}
