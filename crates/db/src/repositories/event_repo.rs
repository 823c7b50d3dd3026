//! Repository for the `events` table.

use sqlx::PgPool;

use fete_core::types::DbId;

use crate::models::event::Event;

/// Column list for `events` queries.
const COLUMNS: &str = "id, title, start, \"end\", timezone, owner_id, privacy, status, \
     location, lat, lon, is_all_day, created_at, updated_at";

/// Provides lookups for events.
pub struct EventRepo;

impl EventRepo {
    /// Fetch an event by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Account ids of every current guest of the event, in invite order.
    pub async fn guest_account_ids(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT guest_id FROM event_guests WHERE event_id = $1 ORDER BY created_at",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}
