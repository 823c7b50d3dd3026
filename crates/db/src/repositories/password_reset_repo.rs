//! Repository for the `password_resets` table.

use chrono::{Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use fete_core::types::{DbId, Timestamp};

use crate::models::password_reset::PasswordReset;

/// Column list for `password_resets` queries.
const COLUMNS: &str =
    "id, account_id, email, token_salt, message_sent_at, reset_at, created_at, updated_at";

/// Provides CRUD operations for password reset requests.
pub struct PasswordResetRepo;

impl PasswordResetRepo {
    /// Record a new reset request.
    pub async fn create(
        pool: &PgPool,
        account_id: DbId,
        email: &str,
        token_salt: Uuid,
        message_sent_at: Timestamp,
    ) -> Result<PasswordReset, sqlx::Error> {
        let query = format!(
            "INSERT INTO password_resets (account_id, email, token_salt, message_sent_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PasswordReset>(&query)
            .bind(account_id)
            .bind(email)
            .bind(token_salt)
            .bind(message_sent_at)
            .fetch_one(pool)
            .await
    }

    /// Fetch a reset request by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PasswordReset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM password_resets WHERE id = $1");
        sqlx::query_as::<_, PasswordReset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether an unconsumed request younger than `within` exists for the
    /// account. Drives the re-request throttle.
    pub async fn recent_unconsumed_exists(
        pool: &PgPool,
        account_id: DbId,
        within: Duration,
    ) -> Result<bool, sqlx::Error> {
        let cutoff = Utc::now() - within;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM password_resets \
             WHERE account_id = $1 AND message_sent_at > $2 AND reset_at IS NULL",
        )
        .bind(account_id)
        .bind(cutoff)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// Stamp a request consumed. Paired with the account password update
    /// in one transaction by the caller.
    pub async fn mark_consumed(
        conn: &mut PgConnection,
        id: DbId,
        reset_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE password_resets SET reset_at = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(reset_at)
            .execute(conn)
            .await?;
        Ok(())
    }
}
