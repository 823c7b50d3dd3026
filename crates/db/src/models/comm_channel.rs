//! Communication-endpoint validation model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use fete_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `comm_channels` table.
///
/// Records one validation round for an email (or, later, phone) endpoint:
/// a token is issued, mailed to the endpoint, and `validation_at` is set
/// when the owner proves receipt.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommChannel {
    pub id: DbId,
    pub account_id: DbId,
    pub comm_type: StatusId,
    pub comm_endpoint: String,
    pub validation_token: Uuid,
    pub validation_at: Option<Timestamp>,
    pub message_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
