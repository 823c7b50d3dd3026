//! Background job claim/execute loop.
//!
//! Polls the `jobs` table, claims one job at a time with
//! `FOR UPDATE SKIP LOCKED` (via [`JobRepo::claim_next`]), runs the handler
//! registered for its type, and records the outcome. Failures mark the job
//! failed with the error message; resubmission policy belongs to the
//! surrounding infrastructure, not this loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use fete_core::notification::SubjectRef;

use fete_db::models::account::AccountSettings;
use fete_db::models::job::Job;
use fete_db::repositories::{AccountRepo, EventGuestRepo, EventRepo, JobRepo};

use fete_media::store::PgMediaStore;
use fete_media::{FinalizePayload, Finalizer};

use fete_notify::dispatch::{Dispatcher, EventContext, Recipient};
use fete_notify::queue::{DeliverJob, JOB_MEDIA_FINALIZE, JOB_NOTIFY_DELIVER};

/// Default polling interval for the claim loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Claims and executes background jobs.
pub struct JobExecutor {
    pool: PgPool,
    dispatcher: Arc<Dispatcher>,
    finalizer: Finalizer<PgMediaStore>,
    poll_interval: Duration,
}

impl JobExecutor {
    /// Create an executor with the default 1-second poll interval.
    pub fn new(pool: PgPool, dispatcher: Arc<Dispatcher>) -> Self {
        let finalizer = Finalizer::new(PgMediaStore::new(pool.clone()));
        Self {
            pool,
            dispatcher,
            finalizer,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Run the claim loop until the cancellation token fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Job executor started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job executor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain_available().await {
                        tracing::error!(error = %e, "Claim cycle failed");
                    }
                }
            }
        }
    }

    /// Claim and execute jobs until the queue is momentarily empty.
    async fn drain_available(&self) -> Result<(), sqlx::Error> {
        while let Some(job) = JobRepo::claim_next(&self.pool).await? {
            tracing::info!(job_id = job.id, job_type = %job.job_type, "Job claimed");
            match self.execute(&job).await {
                Ok(()) => JobRepo::mark_completed(&self.pool, job.id).await?,
                Err(e) => {
                    tracing::error!(job_id = job.id, error = %e, "Job failed");
                    JobRepo::mark_failed(&self.pool, job.id, &e.to_string()).await?;
                }
            }
        }
        Ok(())
    }

    async fn execute(&self, job: &Job) -> anyhow::Result<()> {
        match job.job_type.as_str() {
            JOB_NOTIFY_DELIVER => {
                let payload: DeliverJob = serde_json::from_value(job.payload.clone())
                    .context("malformed notify.deliver payload")?;
                self.handle_deliver(payload).await
            }
            JOB_MEDIA_FINALIZE => {
                let payload: FinalizePayload = serde_json::from_value(job.payload.clone())
                    .context("malformed media.finalize payload")?;
                self.finalizer.finalize_thumbnails(&payload).await?;
                Ok(())
            }
            other => anyhow::bail!("no handler registered for job type '{other}'"),
        }
    }

    /// Resolve the recipient and subject event, then run one delivery.
    async fn handle_deliver(&self, job: DeliverJob) -> anyhow::Result<()> {
        let SubjectRef::Event(event_id) = job.subject else {
            anyhow::bail!(
                "notify.deliver subject kind '{}' is not routable",
                job.subject.kind()
            );
        };

        let account = AccountRepo::find_by_id(&self.pool, job.recipient_id)
            .await?
            .with_context(|| format!("recipient account {} not found", job.recipient_id))?;
        let settings = AccountRepo::settings(&self.pool, account.id)
            .await?
            .unwrap_or_else(|| AccountSettings::defaults_for(account.id, Utc::now()));

        let event = EventRepo::find_by_id(&self.pool, event_id)
            .await?
            .with_context(|| format!("event {event_id} not found"))?;
        let owner = AccountRepo::find_by_id(&self.pool, event.owner_id)
            .await?
            .with_context(|| format!("event owner {} not found", event.owner_id))?;

        let guest_token =
            EventGuestRepo::find_for_event_and_guest(&self.pool, event_id, job.recipient_id)
                .await?
                .map(|g| g.token);

        let recipient = Recipient::resolve(&account, &settings, guest_token)?;
        let context = EventContext::of(&event, &owner);

        let report = self
            .dispatcher
            .deliver(
                job.notification_type,
                job.sender_id,
                &recipient,
                job.subject,
                &context,
            )
            .await?;

        tracing::info!(
            recipient_id = recipient.account_id,
            external = ?report.external,
            "Delivery finished",
        );
        Ok(())
    }
}
