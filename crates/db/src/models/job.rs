//! Background job entity model.

use serde::Serialize;
use sqlx::FromRow;

use fete_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `jobs` table.
///
/// `payload` is an opaque JSON document interpreted by the handler
/// registered for `job_type`. Delivery is at-least-once: a crashed worker
/// leaves the row claimable again, so handlers must tolerate replays.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_type: String,
    pub status: StatusId,
    pub payload: serde_json::Value,
    pub error_message: Option<String>,
    pub attempts: i32,
    pub submitted_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
