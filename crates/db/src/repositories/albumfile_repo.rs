//! Repository for the `album_files` table.

use sqlx::{PgConnection, PgPool};

use fete_core::types::DbId;

use crate::models::album::AlbumFile;
use crate::models::status::AlbumFileStatus;

/// Column list for `album_files` queries.
const COLUMNS: &str = "id, owner_id, name, status, file_url, width, height, size_bytes, \
     s3_bucket, s3_key, created_at, updated_at";

/// Provides CRUD operations for album files.
pub struct AlbumFileRepo;

impl AlbumFileRepo {
    /// Create a new album file in Processing with its storage locator
    /// assigned. This is the only way a row enters the processing
    /// lifecycle; thumbnails arrive later via the finalize callback.
    pub async fn create_processing(
        pool: &PgPool,
        owner_id: DbId,
        name: &str,
        s3_bucket: &str,
        s3_key: &str,
    ) -> Result<AlbumFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO album_files (owner_id, name, status, width, height, size_bytes, s3_bucket, s3_key) \
             VALUES ($1, $2, $3, 0, 0, 0, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlbumFile>(&query)
            .bind(owner_id)
            .bind(name)
            .bind(AlbumFileStatus::Processing.id())
            .bind(s3_bucket)
            .bind(s3_key)
            .fetch_one(pool)
            .await
    }

    /// Fetch an album file by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AlbumFile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM album_files WHERE id = $1");
        sqlx::query_as::<_, AlbumFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up an album file by its storage locator and lock the row for
    /// the remainder of the transaction.
    ///
    /// The finalize path uses this so that concurrent callbacks for the
    /// same file serialize: thumbnail upserts and the status check/flip
    /// happen against a stable row.
    pub async fn find_by_locator_for_update(
        conn: &mut PgConnection,
        bucket: &str,
        key: &str,
    ) -> Result<Option<AlbumFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM album_files \
             WHERE s3_bucket = $1 AND s3_key = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, AlbumFile>(&query)
            .bind(bucket)
            .bind(key)
            .fetch_optional(conn)
            .await
    }

    /// Transition Processing → Active, guarded on the current status.
    ///
    /// Returns `true` if this call performed the transition. Any status
    /// other than Processing leaves the row untouched, which is what makes
    /// replayed finalize callbacks harmless.
    pub async fn activate_if_processing(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE album_files SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(AlbumFileStatus::Active.id())
        .bind(AlbumFileStatus::Processing.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
