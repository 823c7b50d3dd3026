//! Finalize-callback wire format.
//!
//! The pipeline posts one JSON document per processed file, keyed by the
//! storage locator it was given at upload time. Field casing follows the
//! pipeline's contract, not ours.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::sizes::ThumbnailSize;

/// One per-size result inside a finalize callback.
///
/// `Width`/`Height`/`SizeBytes` are optional in practice — older pipeline
/// versions omit them — and default to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailResult {
    #[serde(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Width", default)]
    pub width: i32,
    #[serde(rename = "Height", default)]
    pub height: i32,
    #[serde(rename = "SizeBytes", default)]
    pub size_bytes: i64,
}

/// The full finalize callback payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FinalizePayload {
    #[serde(rename = "srcBucket")]
    pub src_bucket: String,
    #[serde(rename = "srcKey")]
    pub src_key: String,
    #[serde(rename = "thumbnailResults", default)]
    pub thumbnail_results: BTreeMap<String, ThumbnailResult>,
}

/// A validated, size-classed thumbnail ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailUpsert {
    pub size: ThumbnailSize,
    pub url: String,
    pub width: i32,
    pub height: i32,
    pub size_bytes: i64,
}

impl FinalizePayload {
    /// Whether the payload carries any per-size results at all.
    pub fn is_empty(&self) -> bool {
        self.thumbnail_results.is_empty()
    }

    /// Validate the per-size results against the closed size set.
    ///
    /// Keys outside the set are logged and skipped; a partial payload is
    /// normal (the pipeline may report sizes across several callbacks).
    pub fn upserts(&self) -> Vec<ThumbnailUpsert> {
        let mut out = Vec::with_capacity(self.thumbnail_results.len());
        for (key, result) in &self.thumbnail_results {
            match ThumbnailSize::from_key(key) {
                Some(size) => out.push(ThumbnailUpsert {
                    size,
                    url: result.url.clone(),
                    width: result.width,
                    height: result.height,
                    size_bytes: result.size_bytes,
                }),
                None => {
                    tracing::warn!(
                        size_key = %key,
                        src_key = %self.src_key,
                        "Skipping unknown thumbnail size class",
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "srcBucket": "fete-media",
        "srcKey": "img/2026/08/07/abc.jpeg",
        "thumbnailResults": {
            "48": {
                "Bucket": "fete-thumbs",
                "Key": "48/abc.jpeg",
                "SizeBytes": 1820,
                "Width": 48,
                "Height": 32,
                "Url": "https://cdn.example.com/48/abc.jpeg"
            },
            "960": {
                "Bucket": "fete-thumbs",
                "Key": "960/abc.jpeg",
                "Url": "https://cdn.example.com/960/abc.jpeg"
            }
        }
    }"#;

    #[test]
    fn sample_payload_parses() {
        let payload: FinalizePayload = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(payload.src_bucket, "fete-media");
        assert_eq!(payload.src_key, "img/2026/08/07/abc.jpeg");
        assert_eq!(payload.thumbnail_results.len(), 2);

        let upserts = payload.upserts();
        assert_eq!(upserts.len(), 2);
        assert_eq!(upserts[0].size, ThumbnailSize::S48);
        assert_eq!(upserts[0].size_bytes, 1820);
        // Dimensions missing from the 960 entry default to zero.
        assert_eq!(upserts[1].size, ThumbnailSize::S960);
        assert_eq!(upserts[1].width, 0);
    }

    #[test]
    fn missing_results_section_is_empty() {
        let payload: FinalizePayload =
            serde_json::from_str(r#"{"srcBucket": "b", "srcKey": "k"}"#).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn unknown_size_keys_are_skipped() {
        let raw = r#"{
            "srcBucket": "b", "srcKey": "k",
            "thumbnailResults": {
                "48": {"Bucket": "t", "Key": "48/k", "Url": "u1"},
                "750": {"Bucket": "t", "Key": "750/k", "Url": "u2"}
            }
        }"#;
        let payload: FinalizePayload = serde_json::from_str(raw).unwrap();
        let upserts = payload.upserts();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].size, ThumbnailSize::S48);
    }
}
