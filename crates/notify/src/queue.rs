//! Background job queue collaborator.
//!
//! The core only knows `enqueue`; claiming and executing jobs is the
//! worker's business. Jobs are delivered at-least-once, so every payload
//! here names work that is safe to repeat.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use fete_core::notification::{NotificationType, SubjectRef};
use fete_core::types::DbId;

use fete_db::repositories::JobRepo;

/// Job type for one per-recipient notification delivery.
pub const JOB_NOTIFY_DELIVER: &str = "notify.deliver";

/// Job type for one finalize callback from the thumbnailing pipeline.
pub const JOB_MEDIA_FINALIZE: &str = "media.finalize";

/// Error type for enqueueing.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Job payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Job enqueue failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// A job ready to enqueue: a type tag plus an opaque JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub job_type: String,
    pub payload: serde_json::Value,
}

impl JobSpec {
    pub fn new(job_type: &str, payload: serde_json::Value) -> Self {
        Self {
            job_type: job_type.to_string(),
            payload,
        }
    }
}

/// Handle returned from a successful enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub id: DbId,
}

/// Payload of a `notify.deliver` job: everything the worker needs to
/// resolve the recipient and run one independent delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliverJob {
    pub notification_type: NotificationType,
    pub sender_id: DbId,
    pub recipient_id: DbId,
    pub subject: SubjectRef,
}

impl DeliverJob {
    /// Wrap this payload in a [`JobSpec`].
    pub fn into_spec(self) -> Result<JobSpec, QueueError> {
        Ok(JobSpec::new(
            JOB_NOTIFY_DELIVER,
            serde_json::to_value(self)?,
        ))
    }
}

/// Accepts background jobs for later execution.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: JobSpec) -> Result<JobHandle, QueueError>;
}

// ---------------------------------------------------------------------------
// PgJobQueue
// ---------------------------------------------------------------------------

/// Queue backed by the `jobs` table; workers claim rows with
/// `FOR UPDATE SKIP LOCKED`.
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, job: JobSpec) -> Result<JobHandle, QueueError> {
        let row = JobRepo::submit(&self.pool, &job.job_type, &job.payload).await?;
        Ok(JobHandle { id: row.id })
    }
}

// ---------------------------------------------------------------------------
// MemoryJobQueue
// ---------------------------------------------------------------------------

/// Collects jobs in memory; used by tests.
#[derive(Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<Vec<JobSpec>>,
    next_id: AtomicI64,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything enqueued so far.
    pub fn jobs(&self) -> Vec<JobSpec> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: JobSpec) -> Result<JobHandle, QueueError> {
        self.jobs.lock().unwrap().push(job);
        Ok(JobHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deliver_job_round_trips_through_json() {
        let job = DeliverJob {
            notification_type: NotificationType::EventInvite,
            sender_id: 1,
            recipient_id: 2,
            subject: SubjectRef::Event(3),
        };
        let spec = job.clone().into_spec().unwrap();
        assert_eq!(spec.job_type, JOB_NOTIFY_DELIVER);
        let back: DeliverJob = serde_json::from_value(spec.payload).unwrap();
        assert_eq!(back, job);
    }
}
