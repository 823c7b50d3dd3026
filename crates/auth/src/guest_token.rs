//! Guest access tokens.
//!
//! A guest relation gets one opaque token at creation, letting an
//! unregistered invitee view and answer that single invitation without an
//! account. Verification requires an exact match of both the token and the
//! event id: a real token presented under the wrong event is
//! indistinguishable from an unknown token, so tokens cannot be probed
//! across events.

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use fete_core::types::DbId;

use fete_db::models::guest::EventGuest;
use fete_db::repositories::EventGuestRepo;

/// Error type for token verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Wrong token, wrong event, or both — deliberately one variant.
    #[error("No guest matches the supplied event and token")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Token → guest resolution.
#[async_trait]
pub trait GuestLookup: Send + Sync {
    async fn find_by_event_and_token(
        &self,
        event_id: DbId,
        token: Uuid,
    ) -> Result<Option<EventGuest>, sqlx::Error>;
}

/// Issues and verifies guest access tokens.
pub struct GuestTokenRegistry<L> {
    lookup: L,
}

impl GuestTokenRegistry<()> {
    /// Mint a fresh token for a new guest relation.
    ///
    /// Random v4 UUID; the `event_guests.token` unique constraint backs up
    /// global uniqueness. Assigned once, never rotated.
    pub fn issue() -> Uuid {
        Uuid::new_v4()
    }
}

impl<L: GuestLookup> GuestTokenRegistry<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolve a token presented for a specific event.
    ///
    /// Grants access to exactly the matching (event, guest) relation; any
    /// mismatch is a uniform [`VerifyError::NotFound`].
    pub async fn verify(&self, event_id: DbId, token: Uuid) -> Result<EventGuest, VerifyError> {
        self.lookup
            .find_by_event_and_token(event_id, token)
            .await?
            .ok_or(VerifyError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Lookup implementations
// ---------------------------------------------------------------------------

/// Postgres-backed lookup over `event_guests`.
pub struct PgGuestLookup {
    pool: PgPool,
}

impl PgGuestLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestLookup for PgGuestLookup {
    async fn find_by_event_and_token(
        &self,
        event_id: DbId,
        token: Uuid,
    ) -> Result<Option<EventGuest>, sqlx::Error> {
        EventGuestRepo::find_by_event_and_token(&self.pool, event_id, token).await
    }
}

/// In-memory lookup; used by tests.
#[derive(Default)]
pub struct MemoryGuestLookup {
    rows: Mutex<Vec<EventGuest>>,
}

impl MemoryGuestLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, guest: EventGuest) {
        self.rows.lock().unwrap().push(guest);
    }
}

#[async_trait]
impl GuestLookup for MemoryGuestLookup {
    async fn find_by_event_and_token(
        &self,
        event_id: DbId,
        token: Uuid,
    ) -> Result<Option<EventGuest>, sqlx::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.event_id == event_id && g.token == token)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fete_db::models::status::RsvpStatus;

    fn guest(event_id: DbId, guest_id: DbId, token: Uuid) -> EventGuest {
        let now = Utc::now();
        EventGuest {
            id: guest_id * 100,
            event_id,
            guest_id,
            name: String::new(),
            rsvp: RsvpStatus::Undecided.id(),
            token,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_tokens_are_unique() {
        let a = GuestTokenRegistry::issue();
        let b = GuestTokenRegistry::issue();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn token_verifies_against_its_own_event() {
        let lookup = MemoryGuestLookup::new();
        let token = GuestTokenRegistry::issue();
        lookup.insert(guest(1, 20, token));
        let registry = GuestTokenRegistry::new(lookup);

        let found = registry.verify(1, token).await.unwrap();
        assert_eq!(found.event_id, 1);
        assert_eq!(found.guest_id, 20);
    }

    #[tokio::test]
    async fn same_token_under_wrong_event_is_not_found() {
        let lookup = MemoryGuestLookup::new();
        let token = GuestTokenRegistry::issue();
        lookup.insert(guest(1, 20, token));
        let registry = GuestTokenRegistry::new(lookup);

        match registry.verify(2, token).await {
            Err(VerifyError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let lookup = MemoryGuestLookup::new();
        lookup.insert(guest(1, 20, GuestTokenRegistry::issue()));
        let registry = GuestTokenRegistry::new(lookup);

        match registry.verify(1, GuestTokenRegistry::issue()).await {
            Err(VerifyError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
