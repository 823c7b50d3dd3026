//! In-app audit sink.
//!
//! Every dispatched notification leaves one in-app record per recipient,
//! regardless of which external channel (if any) carried it. The sink is a
//! trait so the dispatcher can be exercised without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use fete_core::notification::{NotificationType, SubjectRef};
use fete_core::types::DbId;

use fete_db::repositories::InAppNotificationRepo;

/// Error type for audit writes.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Audit write failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Appends one in-app notification record per delivery.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        sender_id: DbId,
        recipient_id: DbId,
        notification_type: NotificationType,
        subject: SubjectRef,
    ) -> Result<DbId, AuditError>;
}

// ---------------------------------------------------------------------------
// PgAuditSink
// ---------------------------------------------------------------------------

/// Writes audit records to the `in_app_notifications` table.
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(
        &self,
        sender_id: DbId,
        recipient_id: DbId,
        notification_type: NotificationType,
        subject: SubjectRef,
    ) -> Result<DbId, AuditError> {
        let id = InAppNotificationRepo::create(
            &self.pool,
            sender_id,
            recipient_id,
            notification_type.id(),
            subject.kind(),
            subject.id(),
        )
        .await?;
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// MemoryAuditSink
// ---------------------------------------------------------------------------

/// One recorded audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub sender_id: DbId,
    pub recipient_id: DbId,
    pub notification_type: NotificationType,
    pub subject: SubjectRef,
}

/// Collects audit entries in memory; used by tests.
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(
        &self,
        sender_id: DbId,
        recipient_id: DbId,
        notification_type: NotificationType,
        subject: SubjectRef,
    ) -> Result<DbId, AuditError> {
        let mut entries = self.entries.lock().unwrap();
        entries.push(AuditEntry {
            sender_id,
            recipient_id,
            notification_type,
            subject,
        });
        Ok(entries.len() as DbId)
    }
}
