//! Repository for the `event_guests` table.

use sqlx::PgPool;
use uuid::Uuid;

use fete_core::types::DbId;

use crate::models::guest::EventGuest;
use crate::models::status::{RsvpStatus, StatusId};

/// Column list for `event_guests` queries.
const COLUMNS: &str = "id, event_id, guest_id, name, rsvp, token, created_at, updated_at";

/// Provides CRUD operations for event guest relations.
pub struct EventGuestRepo;

impl EventGuestRepo {
    /// Add a guest to an event with a freshly issued access token.
    ///
    /// The token is generated by the guest-token registry and never changes
    /// afterwards. RSVP starts out Undecided.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        guest_id: DbId,
        name: &str,
        token: Uuid,
    ) -> Result<EventGuest, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_guests (event_id, guest_id, name, rsvp, token) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventGuest>(&query)
            .bind(event_id)
            .bind(guest_id)
            .bind(name)
            .bind(RsvpStatus::Undecided.id())
            .bind(token)
            .fetch_one(pool)
            .await
    }

    /// Exact-match token lookup: both the event id and the token must
    /// match. A valid token presented under the wrong event finds nothing.
    pub async fn find_by_event_and_token(
        pool: &PgPool,
        event_id: DbId,
        token: Uuid,
    ) -> Result<Option<EventGuest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_guests WHERE event_id = $1 AND token = $2");
        sqlx::query_as::<_, EventGuest>(&query)
            .bind(event_id)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the relation row for a specific guest of a specific event.
    pub async fn find_for_event_and_guest(
        pool: &PgPool,
        event_id: DbId,
        guest_id: DbId,
    ) -> Result<Option<EventGuest>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM event_guests WHERE event_id = $1 AND guest_id = $2");
        sqlx::query_as::<_, EventGuest>(&query)
            .bind(event_id)
            .bind(guest_id)
            .fetch_optional(pool)
            .await
    }

    /// Record a guest's RSVP answer.
    pub async fn update_rsvp(
        pool: &PgPool,
        guest_row_id: DbId,
        rsvp: StatusId,
    ) -> Result<EventGuest, sqlx::Error> {
        let query = format!(
            "UPDATE event_guests SET rsvp = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventGuest>(&query)
            .bind(guest_row_id)
            .bind(rsvp)
            .fetch_one(pool)
            .await
    }
}
