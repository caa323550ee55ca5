use async_trait::async_trait;

use cinesync_model::{CatalogFilter, CatalogPage};

use crate::error::StoreResult;

/// Read path used by the public catalog listing.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn list_catalog(&self, filter: &CatalogFilter) -> StoreResult<CatalogPage>;
}
