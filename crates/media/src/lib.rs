//! Album-file processing: reconciling the external thumbnailing pipeline.
//!
//! Files are uploaded in `Processing` with a storage locator assigned. The
//! pipeline works asynchronously and reports per-size thumbnails through
//! finalize callbacks, delivered at-least-once over the job queue. This
//! crate owns that reconciliation:
//!
//! - [`payload`] — the callback's wire shape and its validation.
//! - [`store`] — the atomic apply step ([`store::MediaStore`]), with
//!   Postgres and in-memory implementations.
//! - [`finalize`] — the state machine driving lookup, upsert, and the
//!   one-shot `Processing → Active` transition.

pub mod finalize;
pub mod payload;
pub mod sizes;
pub mod store;

pub use finalize::{FinalizeDisposition, Finalizer};
pub use payload::{FinalizePayload, ThumbnailUpsert};
pub use sizes::ThumbnailSize;
pub use store::{MediaStore, MemoryMediaStore, PgMediaStore};
