use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use cinesync_model::{
    AssetLocators, CategoryLinks, ContentDraft, ContentKind, DimensionKind, LinkItem,
};

use super::gate::ImportGate;
use super::relationships::RelationshipSynchronizer;
use super::seasons::SeasonImporter;
use super::summary::{
    AssetReport, FailureScope, ImportPhase, ImportSummary, LinkTally, PartialFailure,
    PhaseTracker,
};
use super::upsert::{ContentUpsertEngine, UpsertOutcome};
use super::within;
use crate::assets::{AssetCategory, AssetLifecycle, AssetStorage, MaterializedAsset};
use crate::database::CatalogStore;
use crate::error::{ImportError, Result};
use crate::providers::mapping::format_runtime;
use crate::providers::{MetadataProvider, ProviderError, ProviderRef, UpstreamContent};

pub const DEFAULT_QUALITY: &str = "HD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    /// Cast members linked per record, by billing order.
    pub top_cast: usize,
    pub provider_timeout: Duration,
    pub store_timeout: Duration,
    pub asset_timeout: Duration,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            top_cast: 10,
            provider_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(15),
            asset_timeout: Duration::from_secs(30),
        }
    }
}

/// Inbound trigger: a provider URL or bare id, an optional declared kind
/// and a quality label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportRequest {
    #[serde(alias = "tmdb_input")]
    pub input: String,
    #[serde(default, alias = "content_type")]
    pub kind: Option<ContentKind>,
    #[serde(default)]
    pub quality: Option<String>,
}

impl ImportRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            kind: None,
            quality: None,
        }
    }

    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    fn quality_label(&self) -> String {
        self.quality
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUALITY)
            .to_string()
    }
}

/// Runs one import end to end:
/// fetch, upsert main record, assets, relationships, then seasons for
/// series.
///
/// Only a failed main fetch or a failed main write is returned as an error;
/// everything after the main write is isolated per item and reported in the
/// [`ImportSummary`].
#[derive(Clone)]
pub struct HierarchyImporter {
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn CatalogStore>,
    engine: ContentUpsertEngine,
    assets: AssetLifecycle,
    relationships: RelationshipSynchronizer,
    seasons: SeasonImporter,
    gate: ImportGate,
    settings: ImportSettings,
}

impl std::fmt::Debug for HierarchyImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyImporter")
            .field("engine", &self.engine)
            .field("assets", &self.assets)
            .field("gate", &self.gate)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl HierarchyImporter {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        store: Arc<dyn CatalogStore>,
        storage: Arc<dyn AssetStorage>,
        settings: ImportSettings,
    ) -> Self {
        Self {
            engine: ContentUpsertEngine::new(Arc::clone(&store), settings.store_timeout),
            assets: AssetLifecycle::new(storage, settings.asset_timeout),
            relationships: RelationshipSynchronizer::new(
                Arc::clone(&store),
                settings.store_timeout,
            ),
            seasons: SeasonImporter::new(
                Arc::clone(&provider),
                Arc::clone(&store),
                settings.provider_timeout,
                settings.store_timeout,
            ),
            store,
            provider,
            gate: ImportGate::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn gate(&self) -> &ImportGate {
        &self.gate
    }

    pub async fn import(&self, request: &ImportRequest) -> Result<ImportSummary> {
        let reference = ProviderRef::parse(&request.input, request.kind)?;
        self.import_reference(reference, &request.quality_label())
            .await
    }

    pub async fn import_reference(
        &self,
        reference: ProviderRef,
        quality: &str,
    ) -> Result<ImportSummary> {
        let _permit = self.gate.acquire(reference).await;
        let mut phase = PhaseTracker::new(reference.to_string());

        let upstream = match self.fetch(&reference).await {
            Ok(upstream) => upstream,
            Err(err) => {
                phase.advance(ImportPhase::Aborted);
                warn!(reference = %reference, error = %err, "import aborted while fetching");
                return Err(err);
            }
        };

        phase.advance(ImportPhase::UpsertingMain);
        let draft = content_draft(&upstream, reference.kind, quality);
        let outcome = match self.engine.upsert(&draft).await {
            Ok(outcome) => outcome,
            Err(err) => {
                phase.advance(ImportPhase::Aborted);
                warn!(
                    reference = %reference,
                    external_id = %draft.external_id,
                    error = %err,
                    "import aborted writing main record"
                );
                return Err(ImportError::MainWrite(err));
            }
        };
        let content_id = outcome.id();
        let mut failures = Vec::new();

        phase.advance(ImportPhase::SyncingAssets);
        let assets = self
            .sync_assets(&draft.external_id, &upstream, &outcome, &mut failures)
            .await;

        phase.advance(ImportPhase::SyncingRelationships);
        let links = self
            .sync_relationships(&upstream, &outcome, &mut failures)
            .await;

        let mut summary = ImportSummary {
            content_id,
            external_id: draft.external_id.clone(),
            title: draft.title.clone(),
            kind: reference.kind,
            outcome: outcome.kind(),
            seasons_imported: 0,
            episodes_imported: 0,
            seasons_skipped: Vec::new(),
            links,
            partial_failures: Vec::new(),
            assets,
        };

        if reference.kind.is_series() {
            phase.advance(ImportPhase::ImportingSeasons);
            let season_count = upstream.season_count.unwrap_or(0);
            let seasons = self
                .seasons
                .import_all(&reference, content_id, season_count)
                .await;
            summary.seasons_imported = seasons.seasons_imported;
            summary.episodes_imported = seasons.episodes_imported;
            summary.seasons_skipped = seasons.skipped;
            failures.extend(seasons.failures);
        }

        summary.partial_failures = failures;
        phase.advance(ImportPhase::Done);

        info!(
            reference = %reference,
            external_id = %summary.external_id,
            content_id = %summary.content_id,
            outcome = ?summary.outcome,
            seasons = summary.seasons_imported,
            episodes = summary.episodes_imported,
            partial_failures = summary.partial_failures.len(),
            "import finished"
        );
        Ok(summary)
    }

    async fn fetch(&self, reference: &ProviderRef) -> Result<UpstreamContent> {
        let fetched = tokio::time::timeout(
            self.settings.provider_timeout,
            self.provider.fetch_content(reference),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout));

        fetched.map_err(|err| err.into_import_error(reference))
    }

    async fn sync_assets(
        &self,
        key: &str,
        upstream: &UpstreamContent,
        outcome: &UpsertOutcome,
        failures: &mut Vec<PartialFailure>,
    ) -> AssetReport {
        let stored = outcome.stored_assets();

        let poster = self
            .assets
            .materialize(
                AssetCategory::Posters,
                key,
                upstream.poster_ref.as_deref(),
                stored.poster.as_deref(),
            )
            .await;
        let backdrop = self
            .assets
            .materialize(
                AssetCategory::Backdrops,
                key,
                upstream.backdrop_ref.as_deref(),
                stored.backdrop.as_deref(),
            )
            .await;
        record_asset_failure(FailureScope::Poster, key, &poster, failures);
        record_asset_failure(FailureScope::Backdrop, key, &backdrop, failures);

        let committed = AssetLocators {
            poster: poster.locator.clone(),
            backdrop: backdrop.locator.clone(),
        };
        if committed == stored {
            return AssetReport {
                poster: committed.poster,
                backdrop: committed.backdrop,
                ..AssetReport::default()
            };
        }

        match self.engine.commit_assets(outcome.id(), &committed).await {
            Ok(()) => {
                let superseded = match outcome {
                    UpsertOutcome::Updated { .. } => self.assets.superseded([
                        (stored.poster.as_deref(), committed.poster.as_deref()),
                        (stored.backdrop.as_deref(), committed.backdrop.as_deref()),
                    ]),
                    UpsertOutcome::Created { .. } => Vec::new(),
                };
                self.assets.remove(superseded.clone(), "superseded").await;
                AssetReport {
                    poster: committed.poster,
                    backdrop: committed.backdrop,
                    superseded,
                    discarded: Vec::new(),
                }
            }
            Err(err) => {
                warn!(external_id = key, error = %err, "failed to commit asset locators");
                failures.push(PartialFailure::new(FailureScope::AssetCommit, key, &err));
                let discarded: Vec<String> = [
                    poster.staged_over(stored.poster.as_deref()),
                    backdrop.staged_over(stored.backdrop.as_deref()),
                ]
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
                self.assets.remove(discarded.clone(), "uncommitted").await;
                AssetReport {
                    poster: stored.poster,
                    backdrop: stored.backdrop,
                    superseded: Vec::new(),
                    discarded,
                }
            }
        }
    }

    async fn sync_relationships(
        &self,
        upstream: &UpstreamContent,
        outcome: &UpsertOutcome,
        failures: &mut Vec<PartialFailure>,
    ) -> BTreeMap<DimensionKind, LinkTally> {
        let content_id = outcome.id();

        // Every link set, actor photos included, is ready before the old
        // links are dropped.
        let categories = [
            CategoryLinks::new(
                DimensionKind::Genre,
                upstream.genres.iter().map(LinkItem::named).collect(),
            ),
            CategoryLinks::new(
                DimensionKind::Country,
                upstream.countries.iter().map(LinkItem::named).collect(),
            ),
            CategoryLinks::new(
                DimensionKind::Tag,
                upstream.keywords.iter().map(LinkItem::tag).collect(),
            ),
            self.cast_links(upstream, failures).await,
        ];

        if let UpsertOutcome::Updated { .. } = outcome {
            if let Err(err) = self.relationships.purge(content_id).await {
                warn!(content_id = %content_id, error = %err, "failed to clear links before relinking");
                failures.push(PartialFailure::new(
                    FailureScope::LinkPurge,
                    content_id.to_string(),
                    err,
                ));
            }
        }

        let mut tallies = BTreeMap::new();
        for links in &categories {
            let result = self.relationships.resync(content_id, links).await;
            tallies.insert(links.kind, result.tally);
            failures.extend(result.failures);
        }
        tallies
    }

    /// Top-billed cast with photos stored locally where possible. Actors
    /// that already carry a photo are not downloaded again.
    async fn cast_links(
        &self,
        upstream: &UpstreamContent,
        failures: &mut Vec<PartialFailure>,
    ) -> CategoryLinks {
        let mut items = Vec::new();
        for credit in upstream.cast.iter().take(self.settings.top_cast) {
            let photo = match credit.photo_ref.as_deref() {
                Some(remote) => match self.stored_actor_photo(&credit.name).await {
                    Some(existing) => Some(existing),
                    None => {
                        let asset = self
                            .assets
                            .materialize(
                                AssetCategory::Actors,
                                &credit.person_id.to_string(),
                                Some(remote),
                                None,
                            )
                            .await;
                        record_asset_failure(
                            FailureScope::ActorPhoto,
                            &credit.name,
                            &asset,
                            failures,
                        );
                        asset.locator
                    }
                },
                None => None,
            };
            items.push(LinkItem::actor(
                credit.name.clone(),
                photo,
                credit.character.clone(),
            ));
        }
        CategoryLinks::new(DimensionKind::Actor, items)
    }

    /// A lookup failure counts as no photo; the resolver surfaces store
    /// trouble when the actor is linked.
    async fn stored_actor_photo(&self, name: &str) -> Option<String> {
        let found = within(
            self.settings.store_timeout,
            "find_dimension",
            self.store.find_dimension(DimensionKind::Actor, name),
        )
        .await;

        match found {
            Ok(row) => row
                .and_then(|row| row.photo)
                .filter(|photo| !photo.trim().is_empty()),
            Err(err) => {
                debug!(actor = name, error = %err, "actor photo lookup failed");
                None
            }
        }
    }
}

fn record_asset_failure(
    scope: FailureScope,
    item: &str,
    asset: &MaterializedAsset,
    failures: &mut Vec<PartialFailure>,
) {
    if let Some(error) = &asset.error {
        failures.push(PartialFailure::new(scope, item, error));
    }
}

/// The main-record draft. Asset locators start empty; they are committed
/// separately once materialized.
pub fn content_draft(upstream: &UpstreamContent, kind: ContentKind, quality: &str) -> ContentDraft {
    let countries: Vec<&str> = upstream
        .countries
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();

    ContentDraft {
        external_id: upstream.external_id(),
        provider_id: Some(upstream.provider_id),
        kind,
        title: upstream.title.clone(),
        synopsis: upstream.synopsis.clone(),
        release_date: upstream.release_date,
        rating: upstream.rating,
        duration: format_runtime(upstream.runtime_minutes),
        assets: AssetLocators::default(),
        trailer_url: upstream.trailer_url.clone(),
        quality: quality.to_string(),
        total_seasons: if kind.is_series() {
            upstream.season_count
        } else {
            None
        },
        country_summary: (!countries.is_empty()).then(|| countries.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_joins_countries_and_formats_runtime() {
        let upstream = UpstreamContent {
            provider_id: 100,
            title: "Heat".into(),
            runtime_minutes: Some(170),
            countries: vec!["United States".into(), " ".into(), "France".into()],
            season_count: Some(3),
            ..UpstreamContent::default()
        };

        let draft = content_draft(&upstream, ContentKind::Movie, "4K");

        assert_eq!(draft.external_id, "tmdb:100");
        assert_eq!(draft.duration.as_deref(), Some("170 min"));
        assert_eq!(draft.country_summary.as_deref(), Some("United States, France"));
        assert_eq!(draft.total_seasons, None);
        assert_eq!(draft.quality, "4K");
        assert_eq!(draft.assets, AssetLocators::default());
    }

    #[test]
    fn request_accepts_form_field_names() {
        let request: ImportRequest = serde_json::from_value(serde_json::json!({
            "tmdb_input": "https://www.themoviedb.org/tv/1399",
            "content_type": "tv",
            "quality": "  "
        }))
        .unwrap();

        assert_eq!(request.kind, Some(ContentKind::Series));
        assert_eq!(request.quality_label(), DEFAULT_QUALITY);
    }
}
