//! Event guest relation model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use fete_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `event_guests` table.
///
/// `token` is the opaque access token assigned once at creation; it lets an
/// unregistered guest view and answer this one invitation without logging
/// in. It is never reassigned.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventGuest {
    pub id: DbId,
    pub event_id: DbId,
    pub guest_id: DbId,
    pub name: String,
    pub rsvp: StatusId,
    #[serde(skip_serializing)]
    pub token: Uuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
