//! Account entity models.

use serde::Serialize;
use sqlx::FromRow;

use fete_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `accounts` table.
///
/// `email` and `phone` are both optional, but account creation guarantees
/// at least one is present. `password_hash` is a PHC-format Argon2id string.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: DbId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: String,
    pub status: StatusId,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub last_login: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    /// Display name, or `None` when the account has no name set
    /// (stub contacts created from a bare email/phone).
    pub fn display_name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }
}

/// A row from the `account_settings` table: per-category notification
/// preferences. All categories default to enabled.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccountSettings {
    pub account_id: DbId,
    pub email_rsvp_updates: bool,
    pub email_social_activity: bool,
    pub email_promotions: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AccountSettings {
    /// Defaults used when an account has no settings row yet.
    pub fn defaults_for(account_id: DbId, now: Timestamp) -> Self {
        Self {
            account_id,
            email_rsvp_updates: true,
            email_social_activity: true,
            email_promotions: true,
            created_at: now,
            updated_at: now,
        }
    }
}
