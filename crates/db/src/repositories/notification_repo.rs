//! Repository for the `in_app_notifications` table.

use sqlx::PgPool;

use fete_core::types::DbId;

use crate::models::notification::InAppNotification;

/// Column list for `in_app_notifications` queries.
const COLUMNS: &str =
    "id, sender_id, recipient_id, notification_type, subject_kind, subject_id, created_at";

/// Provides append and listing for the in-app notification feed.
pub struct InAppNotificationRepo;

impl InAppNotificationRepo {
    /// Append one notification row, returning the generated id.
    pub async fn create(
        pool: &PgPool,
        sender_id: DbId,
        recipient_id: DbId,
        notification_type: i16,
        subject_kind: &str,
        subject_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO in_app_notifications \
                (sender_id, recipient_id, notification_type, subject_kind, subject_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(notification_type)
        .bind(subject_kind)
        .bind(subject_id)
        .fetch_one(pool)
        .await
    }

    /// List a recipient's notifications, newest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InAppNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM in_app_notifications \
             WHERE recipient_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, InAppNotification>(&query)
            .bind(recipient_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
