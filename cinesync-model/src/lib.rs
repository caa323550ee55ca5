//! Core data model definitions shared across cinesync crates.

pub mod catalog;
pub mod content;
pub mod dimensions;
pub mod error;
pub mod hierarchy;
pub mod ids;

pub use ::chrono;

pub use catalog::{CatalogFilter, CatalogItem, CatalogPage};
pub use content::{
    AssetLocators, ContentDraft, ContentKind, PROVIDER_EXTERNAL_PREFIX, StoredContent,
    provider_external_id, provider_id_from_external,
};
pub use dimensions::{CategoryLinks, DimensionKind, LinkItem, slugify};
pub use error::{ModelError, Result as ModelResult};
pub use hierarchy::{EpisodeDraft, EpisodeRecord, SeasonDraft, SeasonRecord};
pub use ids::{ContentId, DimensionId, EpisodeId, SeasonId};
