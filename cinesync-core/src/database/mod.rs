//! Store ports, their adapters and store-error classification.

pub mod classify;
pub mod filters;
pub mod infrastructure;
pub mod ports;

pub use infrastructure::{InMemoryCatalogStore, PostgresCatalogStore};
pub use ports::{
    CatalogReader, CatalogStore, ContentRepository, DimensionRepository, DimensionRow,
    HierarchyRepository, LinkInsert, LinkRepository, TrailerBacklog,
};
