//! In-app notification entity model.

use serde::Serialize;
use sqlx::FromRow;

use fete_core::types::{DbId, Timestamp};

/// A row from the `in_app_notifications` table.
///
/// One row is written per dispatched notification and recipient, whatever
/// external channel (if any) carried it. Rows are append-only: nothing in
/// this codebase mutates or deletes them.
///
/// The subject is stored as a `(subject_kind, subject_id)` pair matching
/// [`fete_core::SubjectRef`], not a free-form foreign key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InAppNotification {
    pub id: DbId,
    pub sender_id: DbId,
    pub recipient_id: DbId,
    pub notification_type: i16,
    pub subject_kind: String,
    pub subject_id: DbId,
    pub created_at: Timestamp,
}
