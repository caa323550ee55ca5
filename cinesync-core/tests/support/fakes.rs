use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use cinesync_core::assets::{AssetCategory, AssetError, AssetStorage};
use cinesync_core::database::InMemoryCatalogStore;
use cinesync_core::providers::{
    MetadataProvider, ProviderError, ProviderRef, UpstreamContent, UpstreamSeason,
};
use cinesync_model::{ContentId, DimensionKind};

pub const LOCAL_PREFIX: &str = "/uploads/";

#[derive(Debug, Default)]
struct ProviderState {
    contents: HashMap<ProviderRef, UpstreamContent>,
    seasons: HashMap<(ProviderRef, i32), UpstreamSeason>,
    trailers: HashMap<ProviderRef, Option<String>>,
    trailer_calls: Vec<ProviderRef>,
    transient_failures: usize,
    content_calls: usize,
    season_calls: Vec<i32>,
}

/// Provider backed by a fixture table. Unknown references and seasons are
/// reported as not found.
#[derive(Debug, Default)]
pub struct FakeProvider {
    state: Mutex<ProviderState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_content(&self, reference: ProviderRef, content: UpstreamContent) {
        self.state
            .lock()
            .unwrap()
            .contents
            .insert(reference, content);
    }

    pub fn put_season(&self, reference: ProviderRef, season: UpstreamSeason) {
        self.state
            .lock()
            .unwrap()
            .seasons
            .insert((reference, season.season_number), season);
    }

    /// `None` registers a reference whose videos hold nothing usable.
    pub fn put_trailer(&self, reference: ProviderRef, trailer: Option<&str>) {
        self.state
            .lock()
            .unwrap()
            .trailers
            .insert(reference, trailer.map(str::to_string));
    }

    pub fn trailer_calls(&self) -> Vec<ProviderRef> {
        self.state.lock().unwrap().trailer_calls.clone()
    }

    /// The next `count` content fetches fail as rate limited.
    pub fn fail_next_fetches(&self, count: usize) {
        self.state.lock().unwrap().transient_failures = count;
    }

    pub fn content_calls(&self) -> usize {
        self.state.lock().unwrap().content_calls
    }

    pub fn season_calls(&self) -> Vec<i32> {
        self.state.lock().unwrap().season_calls.clone()
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn fetch_content(
        &self,
        reference: &ProviderRef,
    ) -> Result<UpstreamContent, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.content_calls += 1;
        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(ProviderError::RateLimited);
        }
        state
            .contents
            .get(reference)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn fetch_season(
        &self,
        reference: &ProviderRef,
        season_number: i32,
    ) -> Result<UpstreamSeason, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.season_calls.push(season_number);
        state
            .seasons
            .get(&(*reference, season_number))
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn fetch_trailer(&self, reference: &ProviderRef) -> Result<Option<String>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.trailer_calls.push(*reference);
        state
            .trailers
            .get(reference)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }
}

#[derive(Debug, Default)]
struct StorageState {
    failing: HashSet<String>,
    files: HashSet<String>,
    stored: Vec<String>,
    deleted: Vec<String>,
    genre_links_at_actor_store: Vec<usize>,
}

/// Asset store that keeps locators in memory and fails on demand per
/// remote reference.
#[derive(Debug, Default)]
pub struct FakeStorage {
    state: Mutex<StorageState>,
    watched: Mutex<Option<(Arc<InMemoryCatalogStore>, ContentId)>>,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_remote(&self, remote: &str) {
        self.state.lock().unwrap().failing.insert(remote.to_string());
    }

    pub fn heal_remote(&self, remote: &str) {
        self.state.lock().unwrap().failing.remove(remote);
    }

    /// Every successful store, in order.
    pub fn stored(&self) -> Vec<String> {
        self.state.lock().unwrap().stored.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn exists(&self, locator: &str) -> bool {
        self.state.lock().unwrap().files.contains(locator)
    }

    /// Records the genre link count of `content_id` each time an actor
    /// photo is stored.
    pub fn watch_genre_links(&self, store: Arc<InMemoryCatalogStore>, content_id: ContentId) {
        *self.watched.lock().unwrap() = Some((store, content_id));
    }

    pub fn genre_links_at_actor_store(&self) -> Vec<usize> {
        self.state
            .lock()
            .unwrap()
            .genre_links_at_actor_store
            .clone()
    }
}

#[async_trait]
impl AssetStorage for FakeStorage {
    async fn store(
        &self,
        remote: &str,
        filename: &str,
        category: AssetCategory,
    ) -> Result<Option<String>, AssetError> {
        let watched = self.watched.lock().unwrap().clone();
        let genre_links = match watched {
            Some((store, content_id)) if category == AssetCategory::Actors => {
                Some(store.link_count(DimensionKind::Genre, content_id).await)
            }
            _ => None,
        };

        let mut state = self.state.lock().unwrap();
        state.genre_links_at_actor_store.extend(genre_links);
        if state.failing.contains(remote) {
            return Err(AssetError::Download {
                url: remote.to_string(),
                reason: "HTTP 503".into(),
            });
        }
        let locator = format!("{LOCAL_PREFIX}{category}/{filename}");
        state.files.insert(locator.clone());
        state.stored.push(locator.clone());
        Ok(Some(locator))
    }

    async fn delete(&self, locators: &[String]) -> Result<usize, AssetError> {
        let mut state = self.state.lock().unwrap();
        let mut removed = 0;
        for locator in locators.iter().filter(|l| l.starts_with(LOCAL_PREFIX)) {
            if state.files.remove(locator) {
                removed += 1;
            }
            state.deleted.push(locator.clone());
        }
        Ok(removed)
    }

    fn is_local(&self, locator: &str) -> bool {
        locator.starts_with(LOCAL_PREFIX)
    }
}
