use std::{fmt, sync::Arc};

use cinesync_core::catalog::CatalogService;
use cinesync_core::sync::{BulkImporter, HierarchyImporter, TrailerRefresher};

/// Shared handles for request handlers. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub importer: Arc<HierarchyImporter>,
    pub bulk: BulkImporter,
    pub catalog: CatalogService,
    pub trailers: TrailerRefresher,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        importer: Arc<HierarchyImporter>,
        bulk: BulkImporter,
        catalog: CatalogService,
        trailers: TrailerRefresher,
    ) -> Self {
        Self {
            importer,
            bulk,
            catalog,
            trailers,
        }
    }

    pub fn importer(&self) -> &Arc<HierarchyImporter> {
        &self.importer
    }

    pub fn bulk(&self) -> &BulkImporter {
        &self.bulk
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn trailers(&self) -> &TrailerRefresher {
        &self.trailers
    }
}
