use async_trait::async_trait;

use cinesync_model::{ContentId, EpisodeDraft, EpisodeId, SeasonDraft, SeasonId};

use super::PostgresCatalogStore;
use crate::database::classify::classify;
use crate::database::ports::HierarchyRepository;
use crate::error::StoreResult;

#[async_trait]
impl HierarchyRepository for PostgresCatalogStore {
    async fn upsert_season(
        &self,
        content_id: ContentId,
        season: &SeasonDraft,
    ) -> StoreResult<SeasonId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO seasons (content_id, season_number, title, episode_count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (content_id, season_number) DO UPDATE SET
                title = EXCLUDED.title,
                episode_count = EXCLUDED.episode_count,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(content_id)
        .bind(season.season_number)
        .bind(&season.title)
        .bind(season.episode_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "upsert season"))?;

        Ok(SeasonId(id))
    }

    async fn upsert_episode(
        &self,
        season_id: SeasonId,
        episode: &EpisodeDraft,
    ) -> StoreResult<EpisodeId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO episodes (season_id, episode_number, title, external_id, air_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (season_id, episode_number) DO UPDATE SET
                title = EXCLUDED.title,
                external_id = EXCLUDED.external_id,
                air_date = EXCLUDED.air_date,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(season_id)
        .bind(episode.episode_number)
        .bind(&episode.title)
        .bind(&episode.external_id)
        .bind(episode.air_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "upsert episode"))?;

        Ok(EpisodeId(id))
    }
}
