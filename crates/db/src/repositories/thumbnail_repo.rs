//! Repository for the `thumbnails` table.

use sqlx::{PgConnection, PgPool};

use fete_core::types::DbId;

use crate::models::album::Thumbnail;

/// Column list for `thumbnails` queries.
const COLUMNS: &str =
    "id, albumfile_id, file_url, size_type, width, height, size_bytes, created_at, updated_at";

/// Provides upsert and listing for thumbnails.
pub struct ThumbnailRepo;

impl ThumbnailRepo {
    /// Insert or overwrite the thumbnail for one `(albumfile, size_type)`.
    ///
    /// The unique key makes redelivered finalize payloads converge instead
    /// of accumulating rows.
    pub async fn upsert(
        conn: &mut PgConnection,
        albumfile_id: DbId,
        size_type: i16,
        file_url: &str,
        width: i32,
        height: i32,
        size_bytes: i64,
    ) -> Result<Thumbnail, sqlx::Error> {
        let query = format!(
            "INSERT INTO thumbnails (albumfile_id, size_type, file_url, width, height, size_bytes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (albumfile_id, size_type) DO UPDATE SET \
                file_url = EXCLUDED.file_url, \
                width = EXCLUDED.width, \
                height = EXCLUDED.height, \
                size_bytes = EXCLUDED.size_bytes, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Thumbnail>(&query)
            .bind(albumfile_id)
            .bind(size_type)
            .bind(file_url)
            .bind(width)
            .bind(height)
            .bind(size_bytes)
            .fetch_one(conn)
            .await
    }

    /// List thumbnails for an album file, smallest size first.
    pub async fn list_for_albumfile(
        pool: &PgPool,
        albumfile_id: DbId,
    ) -> Result<Vec<Thumbnail>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM thumbnails WHERE albumfile_id = $1 ORDER BY size_type");
        sqlx::query_as::<_, Thumbnail>(&query)
            .bind(albumfile_id)
            .fetch_all(pool)
            .await
    }
}
