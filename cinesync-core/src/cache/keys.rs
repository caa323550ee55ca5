use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use cinesync_model::CatalogFilter;

const CATALOG_PREFIX: &str = "catalog:v1";

#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    /// Key for one catalog page. Covers every field that changes the
    /// result, with paging normalized the way the query normalizes it.
    pub fn catalog(filter: &CatalogFilter) -> String {
        let mut hasher = DefaultHasher::new();

        filter.kind.map(|k| k.as_str()).hash(&mut hasher);
        filter
            .genre
            .as_deref()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .hash(&mut hasher);
        filter
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .hash(&mut hasher);
        filter.year.hash(&mut hasher);
        filter.page().hash(&mut hasher);
        filter.limit().hash(&mut hasher);

        format!("{CATALOG_PREFIX}:{:x}", hasher.finish())
    }

    /// Matches every catalog page key.
    pub fn catalog_pattern() -> String {
        format!("{CATALOG_PREFIX}:*")
    }
}
