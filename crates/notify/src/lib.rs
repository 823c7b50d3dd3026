//! Notification infrastructure: change detection, routing, and delivery.
//!
//! The pipeline runs in three stages:
//!
//! 1. [`change`] — explicit before/after snapshot comparison at the point
//!    of mutation, producing at most one
//!    [`NotificationIntent`](fete_core::NotificationIntent).
//! 2. [`dispatch::Dispatcher::fan_out`] — one background job per recipient,
//!    enqueued on the [`queue::JobQueue`] collaborator.
//! 3. [`dispatch::Dispatcher::deliver`] — executed by the worker per
//!    recipient: in-app audit entry, preference gating, email-first channel
//!    choice, template rendering.
//!
//! Channels, audit sink, and queue are trait objects so the worker, tests,
//! and any future transport share one dispatcher.

pub mod audit;
pub mod change;
pub mod channel;
pub mod dispatch;
pub mod queue;
pub mod template;
pub mod urls;
pub mod validation;

pub use audit::{AuditSink, MemoryAuditSink, PgAuditSink};
pub use change::{detect_event_change, detect_rsvp_change, EventSnapshot, GuestSnapshot};
pub use dispatch::{Dispatcher, EventContext, Recipient};
pub use queue::{DeliverJob, JobQueue, JobSpec, MemoryJobQueue, PgJobQueue};
pub use template::TemplateSet;
pub use urls::UrlBuilder;
