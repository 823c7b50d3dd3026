//! Repository for the `jobs` table.
//!
//! The queue is plain Postgres: `submit` inserts, workers claim with
//! `SELECT ... FOR UPDATE SKIP LOCKED` so concurrent workers never grab the
//! same row. Delivery is at-least-once; handlers are expected to be
//! idempotent.

use sqlx::PgPool;

use fete_core::types::DbId;

use crate::models::job::Job;
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "id, job_type, status, payload, error_message, attempts, \
     submitted_at, claimed_at, completed_at, created_at, updated_at";

/// Provides queue operations for background jobs.
pub struct JobRepo;

impl JobRepo {
    /// Enqueue a new pending job.
    pub async fn submit(
        pool: &PgPool,
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_type, status, payload) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_type)
            .bind(JobStatus::Pending.id())
            .bind(payload)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest pending job, if any.
    ///
    /// `FOR UPDATE SKIP LOCKED` prevents double-claiming when several
    /// workers poll concurrently.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET status = $1, claimed_at = NOW(), attempts = attempts + 1, updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE status = $2 \
                 ORDER BY submitted_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a job completed.
    pub async fn mark_completed(pool: &PgPool, job_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET status = $2, completed_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job failed with its error message. The surrounding
    /// infrastructure decides whether to resubmit.
    pub async fn mark_failed(
        pool: &PgPool,
        job_id: DbId,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs \
             SET status = $2, error_message = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }
}
