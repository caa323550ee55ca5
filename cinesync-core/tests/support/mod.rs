#![allow(dead_code)]

pub mod fakes;

use std::sync::Arc;
use std::time::Duration;

use cinesync_core::database::{CatalogStore, InMemoryCatalogStore};
use cinesync_core::providers::{
    CastCredit, ProviderRef, UpstreamContent, UpstreamEpisode, UpstreamSeason,
};
use cinesync_core::sync::{HierarchyImporter, ImportSettings};
use cinesync_model::ContentKind;

use fakes::{FakeProvider, FakeStorage};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// One importer wired to in-memory collaborators the test can inspect.
pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub store: Arc<InMemoryCatalogStore>,
    pub storage: Arc<FakeStorage>,
    pub importer: HierarchyImporter,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: ImportSettings) -> Self {
        let provider = Arc::new(FakeProvider::new());
        let store = Arc::new(InMemoryCatalogStore::new());
        let storage = Arc::new(FakeStorage::new());
        let catalog: Arc<dyn CatalogStore> = store.clone();
        let importer =
            HierarchyImporter::new(provider.clone(), catalog, storage.clone(), settings);
        Self {
            provider,
            store,
            storage,
            importer,
        }
    }
}

pub fn test_settings() -> ImportSettings {
    ImportSettings {
        top_cast: 10,
        provider_timeout: Duration::from_secs(2),
        store_timeout: Duration::from_secs(2),
        asset_timeout: Duration::from_secs(2),
    }
}

pub fn movie_ref(id: i64) -> ProviderRef {
    ProviderRef::new(ContentKind::Movie, id)
}

pub fn series_ref(id: i64) -> ProviderRef {
    ProviderRef::new(ContentKind::Series, id)
}

pub fn movie(provider_id: i64, imdb_id: &str, title: &str) -> UpstreamContent {
    UpstreamContent {
        provider_id,
        kind: Some(ContentKind::Movie),
        imdb_id: Some(imdb_id.to_string()),
        title: title.to_string(),
        runtime_minutes: Some(120),
        ..UpstreamContent::default()
    }
}

pub fn series(provider_id: i64, title: &str, season_count: i32) -> UpstreamContent {
    UpstreamContent {
        provider_id,
        kind: Some(ContentKind::Series),
        title: title.to_string(),
        season_count: Some(season_count),
        ..UpstreamContent::default()
    }
}

pub fn poster(file: &str) -> String {
    format!("{IMAGE_BASE}/w500/{file}")
}

/// `count` billed cast members named `Actor 1`..`Actor n`.
pub fn cast(count: usize) -> Vec<CastCredit> {
    (1..=count)
        .map(|n| CastCredit {
            person_id: 1000 + n as i64,
            name: format!("Actor {n}"),
            character: Some(format!("Role {n}")),
            order: n as i32 - 1,
            photo_ref: None,
        })
        .collect()
}

pub fn season(season_number: i32, episodes: i32) -> UpstreamSeason {
    UpstreamSeason {
        season_number,
        name: None,
        episodes: (1..=episodes)
            .map(|n| UpstreamEpisode {
                provider_id: Some(i64::from(season_number * 100 + n)),
                episode_number: n,
                name: None,
                air_date: None,
            })
            .collect(),
    }
}

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
