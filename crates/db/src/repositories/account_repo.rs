//! Repository for the `accounts` and `account_settings` tables.

use sqlx::PgPool;

use fete_core::types::DbId;

use crate::models::account::{Account, AccountSettings};
use crate::models::status::StatusId;

/// Column list for `accounts` queries.
const COLUMNS: &str =
    "id, email, phone, name, status, password_hash, last_login, created_at, updated_at";

/// Column list for `account_settings` queries.
const SETTINGS_COLUMNS: &str = "account_id, email_rsvp_updates, email_social_activity, \
     email_promotions, created_at, updated_at";

/// Provides lookups and mutations for accounts.
pub struct AccountRepo;

impl AccountRepo {
    /// Fetch an account by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch an account by normalized email, restricted to the given
    /// statuses. Used by the password-reset path, which accepts active and
    /// soft-deleted accounts but nothing else.
    pub async fn find_by_email_in_statuses(
        pool: &PgPool,
        email: &str,
        statuses: &[StatusId],
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE email = $1 AND status = ANY($2)");
        sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .bind(statuses)
            .fetch_optional(pool)
            .await
    }

    /// Replace the account's password hash.
    ///
    /// Takes a connection rather than the pool so the reset-consumption
    /// path can pair it with marking the reset row spent in one
    /// transaction.
    pub async fn update_password_hash(
        conn: &mut sqlx::PgConnection,
        account_id: DbId,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(account_id)
            .bind(password_hash)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Fetch an account's notification settings, or `None` when no row
    /// exists yet (callers fall back to [`AccountSettings::defaults_for`]).
    pub async fn settings(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<Option<AccountSettings>, sqlx::Error> {
        let query = format!("SELECT {SETTINGS_COLUMNS} FROM account_settings WHERE account_id = $1");
        sqlx::query_as::<_, AccountSettings>(&query)
            .bind(account_id)
            .fetch_optional(pool)
            .await
    }
}
