//! Deterministic, stateless password-reset tokens.
//!
//! The token is never stored: it is a one-way function of the reset row's
//! send time and salt, the account's current password hash, the process
//! secret, and the last successful login. Verifying recomputes; consuming
//! the request (or changing the password any other way) invalidates every
//! outstanding token for the account.
//!
//! Request-time behavior is deliberately quiet: "no such account" and
//! "asked again too soon" both come back as [`ResetOutcome::NotSent`], so
//! callers cannot tell the two apart and leak account existence.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use fete_core::normalize::normalize_email;
use fete_core::types::{DbId, Timestamp};

use fete_db::models::password_reset::PasswordReset;
use fete_db::models::status::AccountStatus;
use fete_db::repositories::{AccountRepo, PasswordResetRepo};

use fete_notify::channel::{ChannelError, EmailChannel, OutboundEmail};
use fete_notify::template::{TemplateError, TemplateSet};
use fete_notify::urls::UrlBuilder;

use crate::password;

/// How long a reset token stays usable.
pub fn token_validity() -> Duration {
    Duration::hours(24)
}

/// Minimum gap between reset emails for one account.
pub fn resend_cooldown() -> Duration {
    Duration::minutes(5)
}

// ---------------------------------------------------------------------------
// Token computation
// ---------------------------------------------------------------------------

/// Compute the reset token for a request.
///
/// SHA-256 over the RFC 3339 send timestamp, the salt, the account's
/// current password hash, the process-wide secret, and — when the account
/// has logged in before — the last-login timestamp. Identical inputs give
/// the identical token; any input moving (most importantly the password
/// hash) gives a different one.
pub fn compute_token(
    message_sent_at: Timestamp,
    token_salt: Uuid,
    password_hash: &str,
    secret: &str,
    last_login: Option<Timestamp>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message_sent_at.to_rfc3339().as_bytes());
    hasher.update(token_salt.to_string().as_bytes());
    hasher.update(password_hash.as_bytes());
    hasher.update(secret.as_bytes());
    if let Some(last_login) = last_login {
        hasher.update(last_login.to_rfc3339().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Whether a reset request is still usable: not yet consumed and sent
/// within the validity window.
pub fn can_still_use(reset: &PasswordReset, now: Timestamp) -> bool {
    reset.reset_at.is_none() && reset.message_sent_at > now - token_validity()
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// The account fields the reset flow needs.
#[derive(Debug, Clone)]
pub struct ResetAccount {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub last_login: Option<Timestamp>,
}

/// Error type for the reset flow.
#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Reset email delivery failed: {0}")]
    Channel(#[from] ChannelError),

    #[error("Password rejected: {0}")]
    WeakPassword(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Storage operations behind the reset service.
#[async_trait]
pub trait ResetStore: Send + Sync {
    /// Find an account eligible for a reset (active or soft-deleted) by
    /// normalized email.
    async fn find_account_for_reset(&self, email: &str)
        -> Result<Option<ResetAccount>, ResetError>;

    /// Whether an unconsumed request younger than `within` exists.
    async fn recent_unconsumed_exists(
        &self,
        account_id: DbId,
        within: Duration,
    ) -> Result<bool, ResetError>;

    /// Persist a new reset request.
    async fn create_request(
        &self,
        account_id: DbId,
        email: &str,
        token_salt: Uuid,
        message_sent_at: Timestamp,
    ) -> Result<PasswordReset, ResetError>;

    /// Atomically store the new password hash and stamp the request spent.
    async fn consume(
        &self,
        reset_id: DbId,
        account_id: DbId,
        new_password_hash: &str,
        reset_at: Timestamp,
    ) -> Result<(), ResetError>;
}

// ---------------------------------------------------------------------------
// PgResetStore
// ---------------------------------------------------------------------------

/// Postgres-backed reset storage.
pub struct PgResetStore {
    pool: PgPool,
}

impl PgResetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetStore for PgResetStore {
    async fn find_account_for_reset(
        &self,
        email: &str,
    ) -> Result<Option<ResetAccount>, ResetError> {
        let statuses = [AccountStatus::Active.id(), AccountStatus::Deleted.id()];
        let account = AccountRepo::find_by_email_in_statuses(&self.pool, email, &statuses).await?;
        Ok(account.map(|a| ResetAccount {
            id: a.id,
            email: a.email.unwrap_or_else(|| email.to_string()),
            password_hash: a.password_hash,
            last_login: a.last_login,
        }))
    }

    async fn recent_unconsumed_exists(
        &self,
        account_id: DbId,
        within: Duration,
    ) -> Result<bool, ResetError> {
        Ok(PasswordResetRepo::recent_unconsumed_exists(&self.pool, account_id, within).await?)
    }

    async fn create_request(
        &self,
        account_id: DbId,
        email: &str,
        token_salt: Uuid,
        message_sent_at: Timestamp,
    ) -> Result<PasswordReset, ResetError> {
        Ok(PasswordResetRepo::create(&self.pool, account_id, email, token_salt, message_sent_at)
            .await?)
    }

    async fn consume(
        &self,
        reset_id: DbId,
        account_id: DbId,
        new_password_hash: &str,
        reset_at: Timestamp,
    ) -> Result<(), ResetError> {
        let mut tx = self.pool.begin().await?;
        AccountRepo::update_password_hash(&mut tx, account_id, new_password_hash).await?;
        PasswordResetRepo::mark_consumed(&mut tx, reset_id, reset_at).await?;
        tx.commit().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryResetStore
// ---------------------------------------------------------------------------

/// In-memory reset storage; used by tests.
#[derive(Default)]
pub struct MemoryResetStore {
    accounts: Mutex<Vec<ResetAccount>>,
    requests: Mutex<Vec<PasswordReset>>,
}

impl MemoryResetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: ResetAccount) {
        self.accounts.lock().unwrap().push(account);
    }

    pub fn requests(&self) -> Vec<PasswordReset> {
        self.requests.lock().unwrap().clone()
    }

    pub fn password_hash(&self, account_id: DbId) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| a.password_hash.clone())
    }
}

#[async_trait]
impl ResetStore for MemoryResetStore {
    async fn find_account_for_reset(
        &self,
        email: &str,
    ) -> Result<Option<ResetAccount>, ResetError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn recent_unconsumed_exists(
        &self,
        account_id: DbId,
        within: Duration,
    ) -> Result<bool, ResetError> {
        let cutoff = Utc::now() - within;
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.account_id == account_id && r.reset_at.is_none() && r.message_sent_at > cutoff))
    }

    async fn create_request(
        &self,
        account_id: DbId,
        email: &str,
        token_salt: Uuid,
        message_sent_at: Timestamp,
    ) -> Result<PasswordReset, ResetError> {
        let mut requests = self.requests.lock().unwrap();
        let reset = PasswordReset {
            id: requests.len() as DbId + 1,
            account_id,
            email: email.to_string(),
            token_salt,
            message_sent_at,
            reset_at: None,
            created_at: message_sent_at,
            updated_at: message_sent_at,
        };
        requests.push(reset.clone());
        Ok(reset)
    }

    async fn consume(
        &self,
        reset_id: DbId,
        account_id: DbId,
        new_password_hash: &str,
        reset_at: Timestamp,
    ) -> Result<(), ResetError> {
        if let Some(account) = self
            .accounts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|a| a.id == account_id)
        {
            account.password_hash = new_password_hash.to_string();
        }
        if let Some(request) = self
            .requests
            .lock()
            .unwrap()
            .iter_mut()
            .find(|r| r.id == reset_id)
        {
            request.reset_at = Some(reset_at);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PasswordResetService
// ---------------------------------------------------------------------------

/// Outcome of a reset request. Deliberately does not say why nothing was
/// sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Sent,
    NotSent,
}

/// Orchestrates reset requests, verification, and consumption.
pub struct PasswordResetService<S> {
    store: S,
    email: Arc<dyn EmailChannel>,
    templates: Arc<TemplateSet>,
    urls: UrlBuilder,
    secret: String,
    contact_email: String,
}

impl<S: ResetStore> PasswordResetService<S> {
    pub fn new(
        store: S,
        email: Arc<dyn EmailChannel>,
        templates: Arc<TemplateSet>,
        urls: UrlBuilder,
        secret: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            store,
            email,
            templates,
            urls,
            secret: secret.into(),
            contact_email: contact_email.into(),
        }
    }

    /// Handle a reset request for `email`.
    ///
    /// Sends at most one email, and only when an eligible account exists
    /// and no unconsumed request from the last five minutes is pending.
    /// Every other case is a quiet `NotSent`.
    pub async fn request_reset(&self, email: &str) -> Result<ResetOutcome, ResetError> {
        let email = normalize_email(email);

        let Some(account) = self.store.find_account_for_reset(&email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(ResetOutcome::NotSent);
        };

        if self
            .store
            .recent_unconsumed_exists(account.id, resend_cooldown())
            .await?
        {
            tracing::info!(
                account_id = account.id,
                "Password reset recently sent; suppressing",
            );
            return Ok(ResetOutcome::NotSent);
        }

        let reset = self
            .store
            .create_request(account.id, &email, Uuid::new_v4(), Utc::now())
            .await?;
        let token = self.token_for(&reset, &account);

        let rendered = self.templates.render_password_reset(serde_json::json!({
            "reset_url": self.urls.password_reset_url(reset.id, &token),
            "contact_email": self.contact_email,
        }))?;

        self.email
            .send(&OutboundEmail {
                to: email,
                subject: rendered.subject,
                text_body: rendered.text_body,
                html_body: rendered.html_body,
            })
            .await?;

        tracing::info!(account_id = account.id, reset_id = reset.id, "Password reset email sent");
        Ok(ResetOutcome::Sent)
    }

    /// Recompute the token for a request against current account state.
    pub fn token_for(&self, reset: &PasswordReset, account: &ResetAccount) -> String {
        compute_token(
            reset.message_sent_at,
            reset.token_salt,
            &account.password_hash,
            &self.secret,
            account.last_login,
        )
    }

    /// Whether `presented` is the valid, still-usable token for a request.
    pub fn verify_token(
        &self,
        reset: &PasswordReset,
        account: &ResetAccount,
        presented: &str,
    ) -> bool {
        can_still_use(reset, Utc::now()) && self.token_for(reset, account) == presented
    }

    /// Set the account's new password and spend the request.
    ///
    /// After this, the request is refused via its `reset_at` stamp AND its
    /// token stops matching, since the password hash input changed.
    pub async fn consume(&self, reset: &PasswordReset, new_password: &str) -> Result<(), ResetError> {
        password::validate_password_strength(new_password).map_err(ResetError::WeakPassword)?;
        let new_hash =
            password::hash_password(new_password).map_err(|e| ResetError::Hash(e.to_string()))?;
        self.store
            .consume(reset.id, reset.account_id, &new_hash, Utc::now())
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use fete_notify::channel::memory::MemoryEmailChannel;

    fn sent_at() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    fn salt() -> Uuid {
        Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap()
    }

    #[test]
    fn compute_token_is_deterministic() {
        let last_login = Some(Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap());
        let a = compute_token(sent_at(), salt(), "$argon2id$hash", "secret", last_login);
        let b = compute_token(sent_at(), salt(), "$argon2id$hash", "secret", last_login);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64, "sha-256 hex digest");
    }

    #[test]
    fn every_input_moves_the_token() {
        let base = compute_token(sent_at(), salt(), "hash", "secret", None);

        let other_time = compute_token(
            Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 1).unwrap(),
            salt(),
            "hash",
            "secret",
            None,
        );
        assert_ne!(base, other_time);

        let other_salt = compute_token(sent_at(), Uuid::new_v4(), "hash", "secret", None);
        assert_ne!(base, other_salt);

        let other_hash = compute_token(sent_at(), salt(), "hash2", "secret", None);
        assert_ne!(base, other_hash, "a password change revokes the token");

        let other_secret = compute_token(sent_at(), salt(), "hash", "secret2", None);
        assert_ne!(base, other_secret);

        let with_login = compute_token(sent_at(), salt(), "hash", "secret", Some(sent_at()));
        assert_ne!(base, with_login);
    }

    fn request(message_sent_at: Timestamp, reset_at: Option<Timestamp>) -> PasswordReset {
        PasswordReset {
            id: 1,
            account_id: 1,
            email: "jane@example.com".to_string(),
            token_salt: salt(),
            message_sent_at,
            reset_at,
            created_at: message_sent_at,
            updated_at: message_sent_at,
        }
    }

    #[test]
    fn usable_within_window_and_unconsumed() {
        let now = Utc::now();
        assert!(can_still_use(&request(now - Duration::hours(1), None), now));
    }

    #[test]
    fn consumed_request_is_spent() {
        let now = Utc::now();
        let reset = request(now - Duration::hours(1), Some(now - Duration::minutes(5)));
        assert!(!can_still_use(&reset, now));
    }

    #[test]
    fn request_expires_after_a_day() {
        let now = Utc::now();
        assert!(!can_still_use(&request(now - Duration::hours(25), None), now));
        assert!(can_still_use(&request(now - Duration::hours(23), None), now));
    }

    struct Fixture {
        email: Arc<MemoryEmailChannel>,
        service: PasswordResetService<MemoryResetStore>,
    }

    fn fixture() -> Fixture {
        let email = Arc::new(MemoryEmailChannel::new());
        let store = MemoryResetStore::new();
        store.add_account(ResetAccount {
            id: 1,
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$old-hash".to_string(),
            last_login: None,
        });
        let service = PasswordResetService::new(
            store,
            email.clone(),
            Arc::new(TemplateSet::new()),
            UrlBuilder::new("https://fete.example"),
            "process-secret",
            "noreply@fete.local",
        );
        Fixture { email, service }
    }

    #[tokio::test]
    async fn unknown_email_is_quietly_not_sent() {
        let f = fixture();
        let outcome = f.service.request_reset("nobody@example.com").await.unwrap();
        assert_eq!(outcome, ResetOutcome::NotSent);
        assert!(f.email.sent().is_empty());
    }

    #[tokio::test]
    async fn known_email_gets_one_reset_mail() {
        let f = fixture();
        let outcome = f.service.request_reset("jane@example.com").await.unwrap();
        assert_eq!(outcome, ResetOutcome::Sent);

        let sent = f.email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert!(sent[0].text_body.contains("/reset-password/1?t="));

        // The link token matches a recomputation from stored state.
        let reset = &f.service.store.requests()[0];
        let account = f
            .service
            .store
            .find_account_for_reset("jane@example.com")
            .await
            .unwrap()
            .unwrap();
        let token = f.service.token_for(reset, &account);
        assert!(sent[0].text_body.contains(&token));
    }

    #[tokio::test]
    async fn email_lookup_uses_normalized_form() {
        let f = fixture();
        let outcome = f.service.request_reset("  jane@EXAMPLE.COM ").await.unwrap();
        assert_eq!(outcome, ResetOutcome::Sent);
        assert_eq!(f.email.sent()[0].to, "jane@example.com");
    }

    #[tokio::test]
    async fn second_request_within_cooldown_is_suppressed() {
        let f = fixture();
        assert_eq!(
            f.service.request_reset("jane@example.com").await.unwrap(),
            ResetOutcome::Sent
        );
        assert_eq!(
            f.service.request_reset("jane@example.com").await.unwrap(),
            ResetOutcome::NotSent
        );
        assert_eq!(f.email.sent().len(), 1, "the throttled request sends nothing");
    }

    #[tokio::test]
    async fn consuming_frees_the_throttle() {
        let f = fixture();
        f.service.request_reset("jane@example.com").await.unwrap();
        let reset = f.service.store.requests()[0].clone();
        f.service.consume(&reset, "brand-new-password").await.unwrap();

        // The pending request is spent, so a fresh one may be sent.
        assert_eq!(
            f.service.request_reset("jane@example.com").await.unwrap(),
            ResetOutcome::Sent
        );
        assert_eq!(f.email.sent().len(), 2);
    }

    #[tokio::test]
    async fn consume_rotates_hash_and_spends_the_request() {
        let f = fixture();
        f.service.request_reset("jane@example.com").await.unwrap();
        let reset = f.service.store.requests()[0].clone();
        let account_before = f
            .service
            .store
            .find_account_for_reset("jane@example.com")
            .await
            .unwrap()
            .unwrap();
        let token = f.service.token_for(&reset, &account_before);
        assert!(f.service.verify_token(&reset, &account_before, &token));

        f.service.consume(&reset, "brand-new-password").await.unwrap();

        let new_hash = f.service.store.password_hash(1).unwrap();
        assert_ne!(new_hash, "$argon2id$old-hash");
        assert!(crate::password::verify_password("brand-new-password", &new_hash).unwrap());

        // Spent via the stamp...
        let spent = f.service.store.requests()[0].clone();
        assert!(spent.reset_at.is_some());
        assert!(!can_still_use(&spent, Utc::now()));
        // ...and via the rotated hash feeding the token function.
        let account_after = f
            .service
            .store
            .find_account_for_reset("jane@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(f.service.token_for(&spent, &account_after), token);
    }

    #[tokio::test]
    async fn consume_rejects_weak_passwords() {
        let f = fixture();
        f.service.request_reset("jane@example.com").await.unwrap();
        let reset = f.service.store.requests()[0].clone();
        let err = f.service.consume(&reset, "short").await.unwrap_err();
        assert!(matches!(err, ResetError::WeakPassword(_)));
    }
}
