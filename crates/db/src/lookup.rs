//! Lazily populated album-type catalogue lookup.
//!
//! The catalogue is tiny and effectively static, so it is cached in memory
//! after the first query. Construction performs no I/O — the cache fills on
//! first use and can be invalidated with [`AlbumTypeLookup::refresh`].

use std::collections::HashMap;

use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::models::album::AlbumType;

/// Name-keyed lookup over the `album_types` catalogue.
pub struct AlbumTypeLookup {
    pool: PgPool,
    cache: RwLock<Option<HashMap<String, AlbumType>>>,
}

impl AlbumTypeLookup {
    /// Create an empty lookup bound to a pool. No query runs here.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: RwLock::new(None),
        }
    }

    /// Fetch an album type by name, populating the cache on first use.
    pub async fn by_name(&self, name: &str) -> Result<Option<AlbumType>, sqlx::Error> {
        {
            let cache = self.cache.read().await;
            if let Some(map) = cache.as_ref() {
                return Ok(map.get(name).cloned());
            }
        }

        let map = self.load().await?;
        let found = map.get(name).cloned();
        *self.cache.write().await = Some(map);
        Ok(found)
    }

    /// Drop the cached catalogue; the next lookup reloads it.
    pub async fn refresh(&self) {
        *self.cache.write().await = None;
    }

    async fn load(&self) -> Result<HashMap<String, AlbumType>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AlbumType>(
            "SELECT id, name, description, sort_order, is_virtual, is_deletable \
             FROM album_types ORDER BY sort_order",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|t| (t.name.clone(), t)).collect())
    }
}
