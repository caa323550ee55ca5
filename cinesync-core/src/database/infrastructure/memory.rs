//! In-memory implementation of every catalog port.
//!
//! Used by the `memory` database backend and throughout the test suite.
//! Faults can be injected per dimension name, per season or episode and for
//! the main content write, so failure isolation can be exercised without a
//! database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use cinesync_model::{
    AssetLocators, CatalogFilter, CatalogItem, CatalogPage, ContentDraft, ContentId, ContentKind,
    DimensionId, DimensionKind, EpisodeDraft, EpisodeId, EpisodeRecord, SeasonDraft,
    SeasonId, SeasonRecord, StoredContent,
};

use crate::database::filters::{ClauseSubject, FilterClause};
use crate::database::ports::{
    CatalogReader, ContentRepository, DimensionRepository, DimensionRow,
    HierarchyRepository, LinkInsert, LinkRepository, TrailerBacklog,
};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct DimensionEntry {
    id: DimensionId,
    slug: Option<String>,
    photo: Option<String>,
}

#[derive(Debug, Default)]
struct DimensionTable {
    last_id: i64,
    rows: BTreeMap<String, DimensionEntry>,
}

impl DimensionTable {
    fn name_of(&self, id: DimensionId) -> Option<&str> {
        self.rows
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Clone)]
struct LinkEntry {
    id: i64,
    content_id: ContentId,
    dimension_id: DimensionId,
    role: Option<String>,
}

#[derive(Debug)]
struct LinkTable {
    /// Next value the surrogate-key counter hands out.
    sequence: i64,
    rows: Vec<LinkEntry>,
}

impl Default for LinkTable {
    fn default() -> Self {
        Self {
            sequence: 1,
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    dimensions: HashSet<(DimensionKind, String)>,
    links: HashSet<(DimensionKind, String)>,
    stuck_sequences: HashSet<(DimensionKind, String)>,
    content_writes: bool,
    asset_commits: bool,
    purge: bool,
    seasons: HashSet<i32>,
    episodes: HashSet<(i32, i32)>,
}

#[derive(Debug, Default)]
struct Counters {
    link_attempts: HashMap<(DimensionKind, String), usize>,
    reseeds: HashMap<DimensionKind, usize>,
    content_writes: usize,
    purges: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_content_id: i64,
    contents: BTreeMap<ContentId, StoredContent>,
    dimensions: HashMap<DimensionKind, DimensionTable>,
    links: HashMap<DimensionKind, LinkTable>,
    last_season_id: i64,
    seasons: BTreeMap<(ContentId, i32), SeasonRecord>,
    last_episode_id: i64,
    episodes: BTreeMap<(SeasonId, i32), EpisodeRecord>,
    faults: Faults,
    counters: Counters,
}

impl MemoryState {
    fn dimension_name(&self, kind: DimensionKind, id: DimensionId) -> String {
        self.dimensions
            .get(&kind)
            .and_then(|table| table.name_of(id))
            .unwrap_or_default()
            .to_string()
    }

    fn linked_names(&self, kind: DimensionKind, content_id: ContentId) -> Vec<String> {
        let Some(links) = self.links.get(&kind) else {
            return Vec::new();
        };
        let mut names: Vec<String> = links
            .rows
            .iter()
            .filter(|link| link.content_id == content_id)
            .map(|link| self.dimension_name(kind, link.dimension_id))
            .collect();
        names.sort();
        names
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::other(format!("injected failure: {what}"))
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Fault injection

    pub async fn fail_dimension(&self, kind: DimensionKind, name: &str) {
        let mut state = self.state.lock().await;
        state.faults.dimensions.insert((kind, name.to_string()));
    }

    pub async fn fail_link(&self, kind: DimensionKind, name: &str) {
        let mut state = self.state.lock().await;
        state.faults.links.insert((kind, name.to_string()));
    }

    /// Every insert of this link reports a surrogate-key conflict, even
    /// after the sequence was reseeded.
    pub async fn stick_link_sequence(&self, kind: DimensionKind, name: &str) {
        let mut state = self.state.lock().await;
        state.faults.stuck_sequences.insert((kind, name.to_string()));
    }

    /// Move a join table's counter back, as an out-of-band insert would.
    pub async fn rewind_link_sequence(&self, kind: DimensionKind, next_value: i64) {
        let mut state = self.state.lock().await;
        state.links.entry(kind).or_default().sequence = next_value;
    }

    pub async fn fail_content_writes(&self, enabled: bool) {
        self.state.lock().await.faults.content_writes = enabled;
    }

    pub async fn fail_asset_commits(&self, enabled: bool) {
        self.state.lock().await.faults.asset_commits = enabled;
    }

    pub async fn fail_link_purge(&self, enabled: bool) {
        self.state.lock().await.faults.purge = enabled;
    }

    pub async fn fail_season(&self, season_number: i32) {
        self.state.lock().await.faults.seasons.insert(season_number);
    }

    pub async fn fail_episode(&self, season_number: i32, episode_number: i32) {
        let mut state = self.state.lock().await;
        state
            .faults
            .episodes
            .insert((season_number, episode_number));
    }

    // Inspection

    pub async fn content(&self, external_id: &str) -> Option<StoredContent> {
        let state = self.state.lock().await;
        state
            .contents
            .values()
            .find(|c| c.external_id == external_id)
            .cloned()
    }

    pub async fn content_count(&self) -> usize {
        self.state.lock().await.contents.len()
    }

    pub async fn link_count(&self, kind: DimensionKind, content_id: ContentId) -> usize {
        let state = self.state.lock().await;
        state
            .links
            .get(&kind)
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|link| link.content_id == content_id)
                    .count()
            })
            .unwrap_or_default()
    }

    /// Character recorded on an actor link.
    pub async fn actor_role(&self, content_id: ContentId, actor: &str) -> Option<String> {
        let state = self.state.lock().await;
        let actor_id = state
            .dimensions
            .get(&DimensionKind::Actor)
            .and_then(|table| table.rows.get(actor))
            .map(|entry| entry.id)?;
        state
            .links
            .get(&DimensionKind::Actor)?
            .rows
            .iter()
            .find(|link| link.content_id == content_id && link.dimension_id == actor_id)
            .and_then(|link| link.role.clone())
    }

    pub async fn dimension_count(&self, kind: DimensionKind) -> usize {
        let state = self.state.lock().await;
        state
            .dimensions
            .get(&kind)
            .map(|table| table.rows.len())
            .unwrap_or_default()
    }

    pub async fn actor_photo(&self, name: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .dimensions
            .get(&DimensionKind::Actor)
            .and_then(|table| table.rows.get(name))
            .and_then(|entry| entry.photo.clone())
    }

    pub async fn tag_slug(&self, name: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .dimensions
            .get(&DimensionKind::Tag)
            .and_then(|table| table.rows.get(name))
            .and_then(|entry| entry.slug.clone())
    }

    pub async fn seasons(&self, content_id: ContentId) -> Vec<SeasonRecord> {
        let state = self.state.lock().await;
        state
            .seasons
            .values()
            .filter(|season| season.content_id == content_id)
            .cloned()
            .collect()
    }

    pub async fn episodes(&self, season_id: SeasonId) -> Vec<EpisodeRecord> {
        let state = self.state.lock().await;
        state
            .episodes
            .values()
            .filter(|episode| episode.season_id == season_id)
            .cloned()
            .collect()
    }

    pub async fn link_insert_attempts(&self, kind: DimensionKind, name: &str) -> usize {
        let state = self.state.lock().await;
        state
            .counters
            .link_attempts
            .get(&(kind, name.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub async fn reseed_count(&self, kind: DimensionKind) -> usize {
        let state = self.state.lock().await;
        state.counters.reseeds.get(&kind).copied().unwrap_or_default()
    }

    pub async fn content_write_count(&self) -> usize {
        self.state.lock().await.counters.content_writes
    }

    pub async fn purge_count(&self) -> usize {
        self.state.lock().await.counters.purges
    }
}

#[async_trait]
impl ContentRepository for InMemoryCatalogStore {
    async fn find_content_by_external_id(
        &self,
        external_id: &str,
    ) -> StoreResult<Option<StoredContent>> {
        Ok(self.content(external_id).await)
    }

    async fn insert_content(&self, draft: &ContentDraft) -> StoreResult<ContentId> {
        let mut state = self.state.lock().await;
        if state.faults.content_writes {
            return Err(injected("insert content"));
        }
        if state
            .contents
            .values()
            .any(|c| c.external_id == draft.external_id)
        {
            return Err(StoreError::ConflictBenign {
                constraint: "contents_external_id_key".into(),
            });
        }

        state.last_content_id += 1;
        let id = ContentId(state.last_content_id);
        state
            .contents
            .insert(id, StoredContent::from_draft(id, draft, Utc::now()));
        state.counters.content_writes += 1;
        Ok(id)
    }

    async fn update_content(&self, id: ContentId, draft: &ContentDraft) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.faults.content_writes {
            return Err(injected("update content"));
        }
        let row = state
            .contents
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("content {id}")))?;
        row.apply_draft(draft, Utc::now());
        state.counters.content_writes += 1;
        Ok(())
    }

    async fn update_asset_locators(
        &self,
        id: ContentId,
        assets: &AssetLocators,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.faults.asset_commits {
            return Err(injected("update asset locators"));
        }
        let row = state
            .contents
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("content {id}")))?;
        row.assets = assets.clone();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn imported_provider_ids(&self, kind: ContentKind) -> StoreResult<Vec<i64>> {
        let state = self.state.lock().await;
        Ok(state
            .contents
            .values()
            .rev()
            .filter(|content| content.kind == kind)
            .filter_map(StoredContent::provider_key)
            .collect())
    }

    async fn find_imported_provider_ids(
        &self,
        kind: ContentKind,
        provider_ids: &[i64],
    ) -> StoreResult<Vec<i64>> {
        let wanted: HashSet<i64> = provider_ids.iter().copied().collect();
        let state = self.state.lock().await;
        Ok(state
            .contents
            .values()
            .filter(|content| content.kind == kind)
            .filter_map(StoredContent::provider_key)
            .filter(|id| wanted.contains(id))
            .collect())
    }

    async fn contents_missing_trailer(
        &self,
        kind: Option<ContentKind>,
        limit: u32,
    ) -> StoreResult<TrailerBacklog> {
        let state = self.state.lock().await;
        let missing: Vec<&StoredContent> = state
            .contents
            .values()
            .filter(|content| kind.is_none_or(|kind| content.kind == kind))
            .filter(|content| content.provider_key().is_some())
            .filter(|content| {
                content
                    .trailer_url
                    .as_deref()
                    .is_none_or(|url| url.trim().is_empty())
            })
            .collect();

        Ok(TrailerBacklog {
            total: missing.len() as u64,
            items: missing
                .into_iter()
                .take(limit as usize)
                .cloned()
                .collect(),
        })
    }

    async fn update_trailer(&self, id: ContentId, trailer_url: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.faults.content_writes {
            return Err(injected("update trailer"));
        }
        let row = state
            .contents
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("content {id}")))?;
        row.trailer_url = Some(trailer_url.to_string());
        row.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl DimensionRepository for InMemoryCatalogStore {
    async fn find_dimension(
        &self,
        kind: DimensionKind,
        name: &str,
    ) -> StoreResult<Option<DimensionRow>> {
        let state = self.state.lock().await;
        if state.faults.dimensions.contains(&(kind, name.to_string())) {
            return Err(injected(&format!("find {kind} '{name}'")));
        }
        Ok(state
            .dimensions
            .get(&kind)
            .and_then(|table| table.rows.get(name))
            .map(|entry| DimensionRow {
                id: entry.id,
                name: name.to_string(),
                photo: entry.photo.clone(),
            }))
    }

    async fn upsert_dimension(
        &self,
        kind: DimensionKind,
        name: &str,
        slug: Option<&str>,
    ) -> StoreResult<DimensionId> {
        let mut state = self.state.lock().await;
        if state.faults.dimensions.contains(&(kind, name.to_string())) {
            return Err(injected(&format!("upsert {kind} '{name}'")));
        }
        let table = state.dimensions.entry(kind).or_default();
        if let Some(entry) = table.rows.get(name) {
            return Ok(entry.id);
        }
        table.last_id += 1;
        let id = DimensionId(table.last_id);
        let slug = match kind {
            DimensionKind::Tag => Some(
                slug.map(str::to_string)
                    .unwrap_or_else(|| cinesync_model::slugify(name)),
            ),
            _ => None,
        };
        table.rows.insert(
            name.to_string(),
            DimensionEntry {
                id,
                slug,
                photo: None,
            },
        );
        Ok(id)
    }

    async fn upsert_actor(&self, name: &str, photo: Option<&str>) -> StoreResult<DimensionId> {
        let mut state = self.state.lock().await;
        if state
            .faults
            .dimensions
            .contains(&(DimensionKind::Actor, name.to_string()))
        {
            return Err(injected(&format!("upsert actor '{name}'")));
        }
        let table = state.dimensions.entry(DimensionKind::Actor).or_default();
        if let Some(entry) = table.rows.get_mut(name) {
            let stored_empty = entry.photo.as_deref().is_none_or(str::is_empty);
            if stored_empty && photo.is_some() {
                entry.photo = photo.map(str::to_string);
            }
            return Ok(entry.id);
        }
        table.last_id += 1;
        let id = DimensionId(table.last_id);
        table.rows.insert(
            name.to_string(),
            DimensionEntry {
                id,
                slug: None,
                photo: photo.map(str::to_string),
            },
        );
        Ok(id)
    }

    async fn backfill_actor_photo(&self, id: DimensionId, photo: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(table) = state.dimensions.get_mut(&DimensionKind::Actor) else {
            return Ok(false);
        };
        let Some(entry) = table.rows.values_mut().find(|entry| entry.id == id) else {
            return Ok(false);
        };
        if entry.photo.as_deref().is_none_or(str::is_empty) {
            entry.photo = Some(photo.to_string());
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl LinkRepository for InMemoryCatalogStore {
    async fn delete_all_links(&self, content_id: ContentId) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        state.counters.purges += 1;
        if state.faults.purge {
            return Err(injected("delete links"));
        }
        let mut removed = 0;
        for table in state.links.values_mut() {
            let before = table.rows.len();
            table.rows.retain(|link| link.content_id != content_id);
            removed += (before - table.rows.len()) as u64;
        }
        Ok(removed)
    }

    async fn insert_link(
        &self,
        kind: DimensionKind,
        content_id: ContentId,
        dimension_id: DimensionId,
        role: Option<&str>,
    ) -> StoreResult<LinkInsert> {
        let mut state = self.state.lock().await;
        let name = state.dimension_name(kind, dimension_id);
        let key = (kind, name);
        *state.counters.link_attempts.entry(key.clone()).or_default() += 1;

        if state.faults.links.contains(&key) {
            return Err(injected(&format!("link {kind} '{}'", key.1)));
        }

        let table = state.links.entry(kind).or_default();
        if table
            .rows
            .iter()
            .any(|link| link.content_id == content_id && link.dimension_id == dimension_id)
        {
            return Ok(LinkInsert::AlreadyPresent);
        }

        let surrogate = StoreError::ConflictSurrogateKey {
            table: kind.link_table().to_string(),
        };
        if state.faults.stuck_sequences.contains(&key) {
            return Err(surrogate);
        }

        let table = state.links.entry(kind).or_default();
        let id = table.sequence;
        table.sequence += 1;
        if table.rows.iter().any(|link| link.id == id) {
            return Err(surrogate);
        }
        table.rows.push(LinkEntry {
            id,
            content_id,
            dimension_id,
            role: role.map(str::to_string),
        });
        Ok(LinkInsert::Inserted)
    }

    async fn reseed_link_sequence(&self, kind: DimensionKind) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        *state.counters.reseeds.entry(kind).or_default() += 1;
        let table = state.links.entry(kind).or_default();
        table.sequence = table.rows.iter().map(|link| link.id).max().unwrap_or(0) + 1;
        Ok(())
    }

    async fn linked_names(
        &self,
        kind: DimensionKind,
        content_id: ContentId,
    ) -> StoreResult<Vec<String>> {
        Ok(self.state.lock().await.linked_names(kind, content_id))
    }
}

#[async_trait]
impl HierarchyRepository for InMemoryCatalogStore {
    async fn upsert_season(
        &self,
        content_id: ContentId,
        season: &SeasonDraft,
    ) -> StoreResult<SeasonId> {
        let mut state = self.state.lock().await;
        if state.faults.seasons.contains(&season.season_number) {
            return Err(injected(&format!("season {}", season.season_number)));
        }
        let key = (content_id, season.season_number);
        if let Some(existing) = state.seasons.get_mut(&key) {
            existing.title = season.title.clone();
            existing.episode_count = season.episode_count;
            return Ok(existing.id);
        }
        state.last_season_id += 1;
        let id = SeasonId(state.last_season_id);
        state.seasons.insert(
            key,
            SeasonRecord {
                id,
                content_id,
                season_number: season.season_number,
                title: season.title.clone(),
                episode_count: season.episode_count,
            },
        );
        Ok(id)
    }

    async fn upsert_episode(
        &self,
        season_id: SeasonId,
        episode: &EpisodeDraft,
    ) -> StoreResult<EpisodeId> {
        let mut state = self.state.lock().await;
        let season_number = state
            .seasons
            .values()
            .find(|season| season.id == season_id)
            .map(|season| season.season_number)
            .ok_or_else(|| StoreError::NotFound(format!("season {season_id}")))?;
        if state
            .faults
            .episodes
            .contains(&(season_number, episode.episode_number))
        {
            return Err(injected(&format!(
                "episode S{season_number}E{}",
                episode.episode_number
            )));
        }

        let key = (season_id, episode.episode_number);
        if let Some(existing) = state.episodes.get_mut(&key) {
            existing.title = episode.title.clone();
            existing.external_id = episode.external_id.clone();
            existing.air_date = episode.air_date;
            return Ok(existing.id);
        }
        state.last_episode_id += 1;
        let id = EpisodeId(state.last_episode_id);
        state.episodes.insert(
            key,
            EpisodeRecord {
                id,
                season_id,
                episode_number: episode.episode_number,
                title: episode.title.clone(),
                external_id: episode.external_id.clone(),
                air_date: episode.air_date,
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalogStore {
    async fn list_catalog(&self, filter: &CatalogFilter) -> StoreResult<CatalogPage> {
        let state = self.state.lock().await;
        let clauses = FilterClause::from_filter(filter);

        let mut matching: Vec<&StoredContent> = state
            .contents
            .values()
            .filter(|content| {
                let genres = state.linked_names(DimensionKind::Genre, content.id);
                let countries = state.linked_names(DimensionKind::Country, content.id);
                let subject = ClauseSubject {
                    kind: content.kind,
                    release_date: content.release_date,
                    genres: &genres,
                    countries: &countries,
                };
                clauses.iter().all(|clause| clause.matches(&subject))
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.limit() as usize)
            .map(|content| CatalogItem {
                id: content.id,
                external_id: content.external_id.clone(),
                kind: content.kind,
                title: content.title.clone(),
                release_date: content.release_date,
                rating: content.rating,
                poster: content.assets.poster.clone(),
                quality: content.quality.clone(),
                views: content.views,
            })
            .collect();

        Ok(CatalogPage::new(items, total, filter))
    }
}
