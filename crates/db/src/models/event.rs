//! Event entity model.

use serde::Serialize;
use sqlx::FromRow;

use fete_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `events` table.
///
/// `timezone` is an IANA zone name chosen by the owner; `start`/`end` are
/// stored in UTC and rendered in that zone. `lat`/`lon` are optional —
/// events without a pinned location carry neither.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub title: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub timezone: String,
    pub owner_id: DbId,
    pub privacy: StatusId,
    pub status: StatusId,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub is_all_day: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
