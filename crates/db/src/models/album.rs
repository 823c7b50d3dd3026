//! Album file and thumbnail entity models.

use percent_encoding::percent_decode_str;
use serde::Serialize;
use sqlx::FromRow;

use fete_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

// ---------------------------------------------------------------------------
// AlbumFile
// ---------------------------------------------------------------------------

/// A row from the `album_files` table.
///
/// The `(s3_bucket, s3_key)` pair is the storage locator assigned at upload
/// time; it is stable for the life of the row and is the key by which the
/// external thumbnailing pipeline refers back to the file.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlbumFile {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub status: StatusId,
    pub file_url: Option<String>,
    pub width: i32,
    pub height: i32,
    pub size_bytes: i64,
    pub s3_bucket: Option<String>,
    pub s3_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Thumbnail
// ---------------------------------------------------------------------------

/// A row from the `thumbnails` table.
///
/// At most one thumbnail exists per `(albumfile_id, size_type)`; the
/// finalize path upserts on that key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Thumbnail {
    pub id: DbId,
    pub albumfile_id: DbId,
    pub file_url: String,
    pub size_type: i16,
    pub width: i32,
    pub height: i32,
    pub size_bytes: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Thumbnail {
    /// Human-readable file name: the last URL path segment,
    /// percent-decoded.
    pub fn name(&self) -> String {
        let segment = self.file_url.rsplit('/').next().unwrap_or("");
        percent_decode_str(segment).decode_utf8_lossy().into_owned()
    }
}

// ---------------------------------------------------------------------------
// AlbumType
// ---------------------------------------------------------------------------

/// A row from the `album_types` catalogue table.
///
/// Ids are fixed (no auto-increment); the set changes only by migration.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlbumType {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub sort_order: i16,
    pub is_virtual: bool,
    pub is_deletable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn thumb(url: &str) -> Thumbnail {
        let now = Utc::now();
        Thumbnail {
            id: 1,
            albumfile_id: 1,
            file_url: url.to_string(),
            size_type: 48,
            width: 48,
            height: 48,
            size_bytes: 1024,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn thumbnail_name_is_decoded_last_segment() {
        let t = thumb("https://cdn.example.com/thumbs/2026/08/Beach%20Party.jpg");
        assert_eq!(t.name(), "Beach Party.jpg");
    }

    #[test]
    fn thumbnail_name_of_bare_url() {
        let t = thumb("plain.jpg");
        assert_eq!(t.name(), "plain.jpg");
    }
}
