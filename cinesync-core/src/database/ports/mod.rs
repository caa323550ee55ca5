pub mod catalog;
pub mod content;
pub mod dimensions;
pub mod hierarchy;
pub mod links;

pub use catalog::CatalogReader;
pub use content::{ContentRepository, TrailerBacklog};
pub use dimensions::{DimensionRepository, DimensionRow};
pub use hierarchy::HierarchyRepository;
pub use links::{LinkInsert, LinkRepository};

/// Every port the pipeline needs, chosen once at startup.
///
/// Postgres and the in-memory store both satisfy it through the blanket
/// impl below; the pipeline only ever holds an `Arc<dyn CatalogStore>`.
pub trait CatalogStore:
    ContentRepository
    + DimensionRepository
    + LinkRepository
    + HierarchyRepository
    + CatalogReader
    + std::fmt::Debug
{
}

impl<T> CatalogStore for T where
    T: ContentRepository
        + DimensionRepository
        + LinkRepository
        + HierarchyRepository
        + CatalogReader
        + std::fmt::Debug
{
}
