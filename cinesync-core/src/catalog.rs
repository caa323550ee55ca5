//! Cached catalog read path.

use std::sync::Arc;
use std::time::Duration;

use cinesync_model::{CatalogFilter, CatalogPage, ContentKind};

use crate::cache::{CacheFacade, CacheKeys};
use crate::database::CatalogStore;
use crate::error::StoreResult;

#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    cache: CacheFacade,
    ttl: Duration,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, cache: CacheFacade, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    pub async fn list(&self, filter: &CatalogFilter) -> StoreResult<CatalogPage> {
        let key = CacheKeys::catalog(filter);
        self.cache
            .get_or_compute(&key, self.ttl, || self.store.list_catalog(filter))
            .await
    }

    /// Provider ids already in the catalog, newest first. Never cached, so a
    /// record imported a moment ago is listed.
    pub async fn imported_ids(&self, kind: ContentKind) -> StoreResult<Vec<i64>> {
        self.store.imported_provider_ids(kind).await
    }

    pub async fn imported_among(
        &self,
        kind: ContentKind,
        provider_ids: &[i64],
    ) -> StoreResult<Vec<i64>> {
        if provider_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .find_imported_provider_ids(kind, provider_ids)
            .await
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Drops every cached page. Called after imports change the catalog.
    pub async fn invalidate(&self) -> usize {
        self.cache.invalidate(&CacheKeys::catalog_pattern()).await
    }
}
