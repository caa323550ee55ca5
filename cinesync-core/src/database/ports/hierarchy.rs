use async_trait::async_trait;

use cinesync_model::{ContentId, EpisodeDraft, EpisodeId, SeasonDraft, SeasonId};

use crate::error::StoreResult;

#[async_trait]
pub trait HierarchyRepository: Send + Sync {
    /// Upsert keyed by `(content_id, season_number)`.
    async fn upsert_season(
        &self,
        content_id: ContentId,
        season: &SeasonDraft,
    ) -> StoreResult<SeasonId>;

    /// Upsert keyed by `(season_id, episode_number)`.
    async fn upsert_episode(
        &self,
        season_id: SeasonId,
        episode: &EpisodeDraft,
    ) -> StoreResult<EpisodeId>;
}
