//! The finalize state machine.
//!
//! Drives one callback through: empty-payload check, size validation,
//! atomic apply. Callbacks referencing unknown locators or carrying no
//! results are logged and dropped — the pipeline redelivers, races with
//! deletes, and occasionally emits garbage, none of which should fail the
//! job.

use crate::payload::FinalizePayload;
use crate::store::{FinalizeOutcome, MediaStore, MediaError};

/// How a finalize callback was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeDisposition {
    /// Thumbnails were applied; `activated` inside tells whether this call
    /// performed the status transition.
    Applied(FinalizeOutcome),
    /// No album file matches the locator. Dropped.
    UnknownLocator,
    /// The payload carried no usable per-size results. Dropped.
    EmptyPayload,
}

/// Executes finalize callbacks against a [`MediaStore`].
pub struct Finalizer<S> {
    store: S,
}

impl<S: MediaStore> Finalizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Process one finalize callback.
    ///
    /// Safe under at-least-once delivery: thumbnail writes are upserts
    /// keyed by `(albumfile, size)`, and the `Processing → Active` flip is
    /// guarded on current status, so replaying a payload changes nothing.
    /// Only infrastructure errors are returned; bad payloads resolve to a
    /// non-`Applied` disposition.
    pub async fn finalize_thumbnails(
        &self,
        payload: &FinalizePayload,
    ) -> Result<FinalizeDisposition, MediaError> {
        if payload.is_empty() {
            tracing::error!(
                src_bucket = %payload.src_bucket,
                src_key = %payload.src_key,
                "Finalize callback carried no thumbnail results",
            );
            return Ok(FinalizeDisposition::EmptyPayload);
        }

        let upserts = payload.upserts();
        if upserts.is_empty() {
            tracing::error!(
                src_bucket = %payload.src_bucket,
                src_key = %payload.src_key,
                "Finalize callback carried only unknown size classes",
            );
            return Ok(FinalizeDisposition::EmptyPayload);
        }

        match self
            .store
            .apply_finalize(&payload.src_bucket, &payload.src_key, &upserts)
            .await?
        {
            Some(outcome) => {
                tracing::info!(
                    albumfile_id = outcome.albumfile_id,
                    upserted = outcome.upserted,
                    activated = outcome.activated,
                    "Finalize applied",
                );
                Ok(FinalizeDisposition::Applied(outcome))
            }
            None => {
                tracing::error!(
                    src_bucket = %payload.src_bucket,
                    src_key = %payload.src_key,
                    "AlbumFile not found for finalize locator",
                );
                Ok(FinalizeDisposition::UnknownLocator)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use fete_db::models::status::AlbumFileStatus;

    use crate::payload::ThumbnailResult;
    use crate::sizes::ThumbnailSize;
    use crate::store::MemoryMediaStore;

    const BUCKET: &str = "fete-media";
    const KEY: &str = "img/2026/08/07/abc.jpeg";

    fn result_for(size: ThumbnailSize) -> ThumbnailResult {
        let id = size.id();
        ThumbnailResult {
            bucket: "fete-thumbs".to_string(),
            key: format!("{id}/abc.jpeg"),
            url: format!("https://cdn.example.com/{id}/abc.jpeg"),
            width: i32::from(id),
            height: i32::from(id),
            size_bytes: 1024,
        }
    }

    fn payload_with(sizes: &[ThumbnailSize]) -> FinalizePayload {
        let mut thumbnail_results = BTreeMap::new();
        for &size in sizes {
            thumbnail_results.insert(size.id().to_string(), result_for(size));
        }
        FinalizePayload {
            src_bucket: BUCKET.to_string(),
            src_key: KEY.to_string(),
            thumbnail_results,
        }
    }

    fn finalizer_with_processing_file() -> Finalizer<MemoryMediaStore> {
        let store = MemoryMediaStore::new();
        store.insert_processing(BUCKET, KEY);
        Finalizer::new(store)
    }

    #[tokio::test]
    async fn full_payload_activates_and_stores_all_sizes() {
        let finalizer = finalizer_with_processing_file();
        let payload = payload_with(&ThumbnailSize::ALL);

        let disposition = finalizer.finalize_thumbnails(&payload).await.unwrap();
        let FinalizeDisposition::Applied(outcome) = disposition else {
            panic!("expected Applied, got {disposition:?}");
        };
        assert_eq!(outcome.upserted, 7);
        assert!(outcome.activated);

        let store = &finalizer.store;
        assert_eq!(store.status(BUCKET, KEY), Some(AlbumFileStatus::Active));
        assert_eq!(
            store.thumbnail_sizes(BUCKET, KEY),
            vec![48, 100, 144, 205, 320, 610, 960]
        );
    }

    #[tokio::test]
    async fn replaying_a_payload_is_idempotent() {
        let finalizer = finalizer_with_processing_file();
        let payload = payload_with(&ThumbnailSize::ALL);

        finalizer.finalize_thumbnails(&payload).await.unwrap();
        let second = finalizer.finalize_thumbnails(&payload).await.unwrap();

        let FinalizeDisposition::Applied(outcome) = second else {
            panic!("expected Applied");
        };
        // The second application changes neither thumbnail count nor status,
        // and the transition does not fire again.
        assert!(!outcome.activated);
        let store = &finalizer.store;
        assert_eq!(store.thumbnail_sizes(BUCKET, KEY).len(), 7);
        assert_eq!(store.status(BUCKET, KEY), Some(AlbumFileStatus::Active));
    }

    #[tokio::test]
    async fn incremental_payloads_converge_with_one_activation() {
        let finalizer = finalizer_with_processing_file();

        // First callback carries only the 48px size...
        let first = finalizer
            .finalize_thumbnails(&payload_with(&[ThumbnailSize::S48]))
            .await
            .unwrap();
        let FinalizeDisposition::Applied(outcome) = first else {
            panic!("expected Applied");
        };
        // ...and already flips the status.
        assert!(outcome.activated);
        assert_eq!(
            finalizer.store.status(BUCKET, KEY),
            Some(AlbumFileStatus::Active)
        );
        assert_eq!(finalizer.store.thumbnail_sizes(BUCKET, KEY), vec![48]);

        // A later callback delivers the remaining six.
        let rest: Vec<ThumbnailSize> = ThumbnailSize::ALL
            .into_iter()
            .filter(|s| *s != ThumbnailSize::S48)
            .collect();
        let second = finalizer
            .finalize_thumbnails(&payload_with(&rest))
            .await
            .unwrap();
        let FinalizeDisposition::Applied(outcome) = second else {
            panic!("expected Applied");
        };
        assert!(!outcome.activated, "the transition fires exactly once");
        assert_eq!(finalizer.store.thumbnail_sizes(BUCKET, KEY).len(), 7);
    }

    #[tokio::test]
    async fn redelivery_overwrites_rather_than_duplicates() {
        let finalizer = finalizer_with_processing_file();
        finalizer
            .finalize_thumbnails(&payload_with(&[ThumbnailSize::S100]))
            .await
            .unwrap();

        let mut payload = payload_with(&[ThumbnailSize::S100]);
        payload
            .thumbnail_results
            .get_mut("100")
            .unwrap()
            .url = "https://cdn.example.com/100/abc-v2.jpeg".to_string();
        finalizer.finalize_thumbnails(&payload).await.unwrap();

        assert_eq!(finalizer.store.thumbnail_sizes(BUCKET, KEY), vec![100]);
        assert_eq!(
            finalizer.store.thumbnail_url(BUCKET, KEY, 100).unwrap(),
            "https://cdn.example.com/100/abc-v2.jpeg"
        );
    }

    #[tokio::test]
    async fn unknown_locator_is_dropped_quietly() {
        let finalizer = Finalizer::new(MemoryMediaStore::new());
        let disposition = finalizer
            .finalize_thumbnails(&payload_with(&[ThumbnailSize::S48]))
            .await
            .unwrap();
        assert_eq!(disposition, FinalizeDisposition::UnknownLocator);
    }

    #[tokio::test]
    async fn empty_payload_is_dropped_quietly() {
        let finalizer = finalizer_with_processing_file();
        let payload = FinalizePayload {
            src_bucket: BUCKET.to_string(),
            src_key: KEY.to_string(),
            thumbnail_results: BTreeMap::new(),
        };
        let disposition = finalizer.finalize_thumbnails(&payload).await.unwrap();
        assert_eq!(disposition, FinalizeDisposition::EmptyPayload);
        // The file is untouched.
        assert_eq!(
            finalizer.store.status(BUCKET, KEY),
            Some(AlbumFileStatus::Processing)
        );
    }
}
