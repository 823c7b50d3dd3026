//! Atomic application of finalize results.
//!
//! [`MediaStore::apply_finalize`] is the one mutating step of the state
//! machine: locate the file by locator, upsert the given thumbnails, and
//! flip `Processing → Active` iff the row is still Processing — all under
//! one row lock, so two concurrent callbacks for the same file cannot lose
//! each other's upserts.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;

use fete_core::types::DbId;

use fete_db::models::status::AlbumFileStatus;
use fete_db::repositories::{AlbumFileRepo, ThumbnailRepo};

use crate::payload::ThumbnailUpsert;

/// Error type for media persistence.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of one atomic finalize application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub albumfile_id: DbId,
    /// Thumbnails written (created or overwritten) by this call.
    pub upserted: usize,
    /// Whether this call performed the `Processing → Active` transition.
    pub activated: bool,
}

/// Storage behind the finalize state machine.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Apply one callback's thumbnails to the file at `(bucket, key)`.
    ///
    /// Returns `None` when no album file matches the locator (stale or
    /// garbage callback). Must be atomic per file: concurrent calls for
    /// the same locator serialize, and the activation fires at most once
    /// over the row's lifetime.
    async fn apply_finalize(
        &self,
        bucket: &str,
        key: &str,
        upserts: &[ThumbnailUpsert],
    ) -> Result<Option<FinalizeOutcome>, MediaError>;
}

// ---------------------------------------------------------------------------
// PgMediaStore
// ---------------------------------------------------------------------------

/// Postgres-backed store: one transaction per callback, row-locked via
/// `SELECT ... FOR UPDATE`.
pub struct PgMediaStore {
    pool: PgPool,
}

impl PgMediaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaStore for PgMediaStore {
    async fn apply_finalize(
        &self,
        bucket: &str,
        key: &str,
        upserts: &[ThumbnailUpsert],
    ) -> Result<Option<FinalizeOutcome>, MediaError> {
        let mut tx = self.pool.begin().await?;

        let Some(file) = AlbumFileRepo::find_by_locator_for_update(&mut tx, bucket, key).await?
        else {
            return Ok(None);
        };

        for upsert in upserts {
            ThumbnailRepo::upsert(
                &mut tx,
                file.id,
                upsert.size.id(),
                &upsert.url,
                upsert.width,
                upsert.height,
                upsert.size_bytes,
            )
            .await?;
        }

        let activated = AlbumFileRepo::activate_if_processing(&mut tx, file.id).await?;
        tx.commit().await?;

        Ok(Some(FinalizeOutcome {
            albumfile_id: file.id,
            upserted: upserts.len(),
            activated,
        }))
    }
}

// ---------------------------------------------------------------------------
// MemoryMediaStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoryAlbumFile {
    id: DbId,
    status: AlbumFileStatus,
    thumbnails: BTreeMap<i16, ThumbnailUpsert>,
}

/// In-memory store with the same per-file atomicity semantics; used by
/// tests.
#[derive(Default)]
pub struct MemoryMediaStore {
    files: Mutex<HashMap<(String, String), MemoryAlbumFile>>,
    next_id: Mutex<DbId>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file in `Processing`, as the upload path would.
    pub fn insert_processing(&self, bucket: &str, key: &str) -> DbId {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = *next_id;
        self.files.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            MemoryAlbumFile {
                id,
                status: AlbumFileStatus::Processing,
                thumbnails: BTreeMap::new(),
            },
        );
        id
    }

    /// Current status of a seeded file.
    pub fn status(&self, bucket: &str, key: &str) -> Option<AlbumFileStatus> {
        self.files
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|f| f.status)
    }

    /// Thumbnail column values currently stored for a seeded file.
    pub fn thumbnail_sizes(&self, bucket: &str, key: &str) -> Vec<i16> {
        self.files
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|f| f.thumbnails.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The stored URL for one size, if present.
    pub fn thumbnail_url(&self, bucket: &str, key: &str, size: i16) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .and_then(|f| f.thumbnails.get(&size).map(|t| t.url.clone()))
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn apply_finalize(
        &self,
        bucket: &str,
        key: &str,
        upserts: &[ThumbnailUpsert],
    ) -> Result<Option<FinalizeOutcome>, MediaError> {
        let mut files = self.files.lock().unwrap();
        let Some(file) = files.get_mut(&(bucket.to_string(), key.to_string())) else {
            return Ok(None);
        };

        for upsert in upserts {
            file.thumbnails.insert(upsert.size.id(), upsert.clone());
        }

        let activated = file.status == AlbumFileStatus::Processing;
        if activated {
            file.status = AlbumFileStatus::Active;
        }

        Ok(Some(FinalizeOutcome {
            albumfile_id: file.id,
            upserted: upserts.len(),
            activated,
        }))
    }
}
