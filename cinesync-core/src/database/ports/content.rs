use async_trait::async_trait;

use cinesync_model::{AssetLocators, ContentDraft, ContentId, ContentKind, StoredContent};

use crate::error::StoreResult;

/// Records that have a provider id but no trailer yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrailerBacklog {
    /// Oldest first, at most the requested limit.
    pub items: Vec<StoredContent>,
    /// Every record still missing a trailer.
    pub total: u64,
}

/// Repository port for content rows. Only the upsert engine writes here.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_content_by_external_id(
        &self,
        external_id: &str,
    ) -> StoreResult<Option<StoredContent>>;

    async fn insert_content(&self, draft: &ContentDraft) -> StoreResult<ContentId>;

    async fn update_content(
        &self,
        id: ContentId,
        draft: &ContentDraft,
    ) -> StoreResult<()>;

    async fn update_asset_locators(
        &self,
        id: ContentId,
        assets: &AssetLocators,
    ) -> StoreResult<()>;

    /// Provider ids of every imported record of `kind`, newest first.
    /// Rows without a provider id contribute the id of a `tmdb:<id>`
    /// external id.
    async fn imported_provider_ids(&self, kind: ContentKind) -> StoreResult<Vec<i64>>;

    /// The subset of `provider_ids` that already has a record of `kind`,
    /// matched on the provider id column or the `tmdb:<id>` external id.
    async fn find_imported_provider_ids(
        &self,
        kind: ContentKind,
        provider_ids: &[i64],
    ) -> StoreResult<Vec<i64>>;

    async fn contents_missing_trailer(
        &self,
        kind: Option<ContentKind>,
        limit: u32,
    ) -> StoreResult<TrailerBacklog>;

    async fn update_trailer(&self, id: ContentId, trailer_url: &str) -> StoreResult<()>;
}
