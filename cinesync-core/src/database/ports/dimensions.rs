use async_trait::async_trait;

use cinesync_model::{DimensionId, DimensionKind};

use crate::error::StoreResult;

/// A dimension row as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionRow {
    pub id: DimensionId,
    pub name: String,
    /// Actors only.
    pub photo: Option<String>,
}

/// Repository port for genre, country, tag and actor rows.
#[async_trait]
pub trait DimensionRepository: Send + Sync {
    /// Case-sensitive lookup by natural key.
    async fn find_dimension(
        &self,
        kind: DimensionKind,
        name: &str,
    ) -> StoreResult<Option<DimensionRow>>;

    /// Insert-or-return keyed by the unique name. Concurrent callers with the
    /// same name converge on one row.
    async fn upsert_dimension(
        &self,
        kind: DimensionKind,
        name: &str,
        slug: Option<&str>,
    ) -> StoreResult<DimensionId>;

    /// Same as [`DimensionRepository::upsert_dimension`] for actors. A
    /// non-empty stored photo is never replaced.
    async fn upsert_actor(
        &self,
        name: &str,
        photo: Option<&str>,
    ) -> StoreResult<DimensionId>;

    /// Sets the photo only when the stored one is empty.
    async fn backfill_actor_photo(
        &self,
        id: DimensionId,
        photo: &str,
    ) -> StoreResult<bool>;
}
