use async_trait::async_trait;

use cinesync_model::{ContentId, DimensionId, DimensionKind};

use crate::error::StoreResult;

/// Result of a single idempotent link insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkInsert {
    Inserted,
    AlreadyPresent,
}

/// Repository port for join rows between content and dimensions.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Removes every link of `content_id` across all four categories in a
    /// single pass. Returns the number of rows removed.
    async fn delete_all_links(&self, content_id: ContentId) -> StoreResult<u64>;

    /// Inserts the `(content, dimension)` pair. An existing pair is reported
    /// as [`LinkInsert::AlreadyPresent`], not as an error.
    async fn insert_link(
        &self,
        kind: DimensionKind,
        content_id: ContentId,
        dimension_id: DimensionId,
        role: Option<&str>,
    ) -> StoreResult<LinkInsert>;

    /// Moves the surrogate-key counter of the join table to
    /// `max(id) + 1`.
    async fn reseed_link_sequence(&self, kind: DimensionKind) -> StoreResult<()>;

    /// Names of the dimensions currently linked to `content_id`.
    async fn linked_names(
        &self,
        kind: DimensionKind,
        content_id: ContentId,
    ) -> StoreResult<Vec<String>>;
}
