//! Password reset request entity model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use fete_core::types::{DbId, Timestamp};

/// A row from the `password_resets` table.
///
/// The reset token itself is never stored: it is recomputed from this row
/// plus account state whenever it needs checking. `reset_at` is null until
/// the request is consumed, after which the row is permanently spent.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PasswordReset {
    pub id: DbId,
    pub account_id: DbId,
    pub email: String,
    pub token_salt: Uuid,
    pub message_sent_at: Timestamp,
    pub reset_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
