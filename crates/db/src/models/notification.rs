//! Notification entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unilib_core::notification::NotificationType;
use unilib_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_type: String,
    pub message: String,
    pub is_read: bool,
    pub related_url: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for writing an in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub notification_type: NotificationType,
    pub message: String,
    pub related_url: Option<String>,
}

/// Read/unread/total counts for a user's notification list.
#[derive(Debug, Clone, Default, FromRow, Serialize, PartialEq, Eq)]
pub struct NotificationCounts {
    pub total: i64,
    pub unread: i64,
}
