//! Repository for the `notifications` table.

use sqlx::PgPool;
use unilib_core::types::DbId;

use crate::models::notification::{CreateNotification, Notification, NotificationCounts};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, notification_type, message, is_read, related_url, created_at";

/// Provides persistence for in-app notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a new unread notification.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, notification_type, message, related_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(input.notification_type.code())
            .bind(&input.message)
            .bind(&input.related_url)
            .fetch_one(pool)
            .await
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = $1 AND (NOT $2 OR is_read = false)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark one of the user's notifications read.
    ///
    /// Returns `false` when the notification does not exist or belongs to
    /// someone else.
    pub async fn mark_read(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification of the user read. Returns how many changed.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn counts(pool: &PgPool, user_id: DbId) -> Result<NotificationCounts, sqlx::Error> {
        sqlx::query_as::<_, NotificationCounts>(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE NOT is_read) AS unread
             FROM notifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
