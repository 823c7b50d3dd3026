//! Background worker: claims notification-delivery and media-finalize jobs
//! from the Postgres queue and executes them.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fete_notify::audit::PgAuditSink;
use fete_notify::channel::email::{EmailConfig, SmtpEmailChannel};
use fete_notify::channel::memory::{MemoryEmailChannel, MemorySmsChannel};
use fete_notify::channel::sms::{TwilioConfig, TwilioSmsChannel};
use fete_notify::channel::{EmailChannel, SmsChannel};
use fete_notify::dispatch::Dispatcher;
use fete_notify::queue::PgJobQueue;
use fete_notify::template::TemplateSet;
use fete_notify::urls::UrlBuilder;

mod executor;

use executor::JobExecutor;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fete_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = fete_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    fete_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    fete_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let email: Arc<dyn EmailChannel> = match EmailConfig::from_env() {
        Some(config) => Arc::new(
            SmtpEmailChannel::new(config).expect("Failed to build SMTP transport"),
        ),
        None => {
            tracing::warn!("SMTP_HOST not set; emails will be recorded, not sent");
            Arc::new(MemoryEmailChannel::new())
        }
    };

    let sms: Arc<dyn SmsChannel> = match TwilioConfig::from_env() {
        Some(config) => Arc::new(TwilioSmsChannel::new(config)),
        None => {
            tracing::warn!("TWILIO_ACCOUNT_SID not set; SMS will be recorded, not sent");
            Arc::new(MemorySmsChannel::new())
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(PgAuditSink::new(pool.clone())),
        email,
        sms,
        Arc::new(TemplateSet::new()),
        UrlBuilder::from_env(),
        Arc::new(PgJobQueue::new(pool.clone())),
    ));

    let executor = JobExecutor::new(pool, dispatcher);
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_cancel.cancel();
        }
    });

    executor.run(cancel).await;
}
