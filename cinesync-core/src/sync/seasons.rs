use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use cinesync_model::{ContentId, EpisodeDraft, SeasonDraft};

use super::summary::{FailureScope, PartialFailure};
use super::within;
use crate::database::CatalogStore;
use crate::providers::{MetadataProvider, ProviderError, ProviderRef, UpstreamEpisode, UpstreamSeason};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonImportOutcome {
    pub seasons_imported: usize,
    pub episodes_imported: usize,
    /// Season numbers that could not be fetched.
    pub skipped: Vec<i32>,
    pub failures: Vec<PartialFailure>,
}

/// Walks seasons `1..=count` one at a time, upserting each season and its
/// episodes. Nothing in here aborts the import.
#[derive(Clone)]
pub struct SeasonImporter {
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn CatalogStore>,
    provider_timeout: Duration,
    store_timeout: Duration,
}

impl std::fmt::Debug for SeasonImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeasonImporter")
            .field("store", &self.store)
            .field("provider_timeout", &self.provider_timeout)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

impl SeasonImporter {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        store: Arc<dyn CatalogStore>,
        provider_timeout: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            provider_timeout,
            store_timeout,
        }
    }

    pub async fn import_all(
        &self,
        reference: &ProviderRef,
        content_id: ContentId,
        season_count: i32,
    ) -> SeasonImportOutcome {
        let mut outcome = SeasonImportOutcome::default();

        for season_number in 1..=season_count.max(0) {
            let Some(season) = self.fetch(reference, season_number, &mut outcome).await else {
                outcome.skipped.push(season_number);
                continue;
            };
            self.import_season(content_id, season_number, &season, &mut outcome)
                .await;
        }

        info!(
            reference = %reference,
            seasons = outcome.seasons_imported,
            episodes = outcome.episodes_imported,
            skipped = outcome.skipped.len(),
            "imported season hierarchy"
        );
        outcome
    }

    async fn fetch(
        &self,
        reference: &ProviderRef,
        season_number: i32,
        outcome: &mut SeasonImportOutcome,
    ) -> Option<UpstreamSeason> {
        let result = tokio::time::timeout(
            self.provider_timeout,
            self.provider.fetch_season(reference, season_number),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout));

        match result {
            Ok(season) => Some(season),
            Err(ProviderError::NotFound) => {
                info!(reference = %reference, season = season_number, "season not found upstream, skipping");
                None
            }
            Err(ProviderError::Timeout) => {
                warn!(reference = %reference, season = season_number, "season fetch timed out, skipping");
                None
            }
            Err(err) => {
                warn!(reference = %reference, season = season_number, error = %err, "season fetch failed, skipping");
                outcome.failures.push(PartialFailure::new(
                    FailureScope::Season,
                    format!("season {season_number}"),
                    err,
                ));
                None
            }
        }
    }

    async fn import_season(
        &self,
        content_id: ContentId,
        season_number: i32,
        season: &UpstreamSeason,
        outcome: &mut SeasonImportOutcome,
    ) {
        let draft = season_draft(season_number, season);
        let season_id = match within(
            self.store_timeout,
            "upsert season",
            self.store.upsert_season(content_id, &draft),
        )
        .await
        {
            Ok(id) => id,
            Err(err) => {
                warn!(content_id = %content_id, season = season_number, error = %err, "failed to store season");
                outcome.failures.push(PartialFailure::new(
                    FailureScope::Season,
                    format!("season {season_number}"),
                    err,
                ));
                return;
            }
        };
        outcome.seasons_imported += 1;

        for episode in &season.episodes {
            let draft = episode_draft(episode);
            match within(
                self.store_timeout,
                "upsert episode",
                self.store.upsert_episode(season_id, &draft),
            )
            .await
            {
                Ok(_) => outcome.episodes_imported += 1,
                Err(err) => {
                    let item = format!("S{season_number:02}E{:02}", episode.episode_number);
                    warn!(content_id = %content_id, episode = %item, error = %err, "failed to store episode");
                    outcome
                        .failures
                        .push(PartialFailure::new(FailureScope::Episode, item, err));
                }
            }
        }

        debug!(
            content_id = %content_id,
            season = season_number,
            episodes = season.episodes.len(),
            "stored season"
        );
    }
}

pub fn season_draft(season_number: i32, season: &UpstreamSeason) -> SeasonDraft {
    SeasonDraft {
        season_number,
        title: season
            .name
            .clone()
            .unwrap_or_else(|| format!("Season {season_number}")),
        episode_count: i32::try_from(season.episodes.len()).unwrap_or(i32::MAX),
    }
}

pub fn episode_draft(episode: &UpstreamEpisode) -> EpisodeDraft {
    EpisodeDraft {
        episode_number: episode.episode_number,
        title: episode
            .name
            .clone()
            .unwrap_or_else(|| format!("Episode {}", episode.episode_number)),
        external_id: episode.provider_id.map(|id| format!("tmdb:{id}")),
        air_date: episode.air_date,
    }
}
