use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use serde_json::Value;
use tempfile::TempDir;

use cinesync_core::assets::LocalAssetStorage;
use cinesync_core::cache::CacheFacade;
use cinesync_core::catalog::CatalogService;
use cinesync_core::database::{CatalogStore, InMemoryCatalogStore};
use cinesync_core::providers::{
    MetadataProvider, ProviderError, ProviderRef, UpstreamContent, UpstreamSeason,
};
use cinesync_core::sync::{
    BulkImporter, BulkSettings, HierarchyImporter, ImportSettings, TrailerRefresher,
};
use cinesync_model::ContentKind;
use cinesync_server::{AppState, create_app};

/// Fixture-table provider. Anything not registered is a 404 upstream.
#[derive(Debug, Default)]
pub struct StubProvider {
    contents: Mutex<HashMap<ProviderRef, UpstreamContent>>,
    trailers: Mutex<HashMap<ProviderRef, String>>,
}

impl StubProvider {
    pub fn put_movie(&self, id: i64, imdb_id: &str, title: &str, genres: &[&str]) {
        let content = UpstreamContent {
            provider_id: id,
            kind: Some(ContentKind::Movie),
            imdb_id: Some(imdb_id.to_string()),
            title: title.to_string(),
            runtime_minutes: Some(110),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..UpstreamContent::default()
        };
        self.contents
            .lock()
            .unwrap()
            .insert(ProviderRef::new(ContentKind::Movie, id), content);
    }

    pub fn put_trailer(&self, reference: ProviderRef, trailer: &str) {
        self.trailers
            .lock()
            .unwrap()
            .insert(reference, trailer.to_string());
    }
}

#[async_trait]
impl MetadataProvider for StubProvider {
    async fn fetch_content(
        &self,
        reference: &ProviderRef,
    ) -> Result<UpstreamContent, ProviderError> {
        self.contents
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn fetch_season(
        &self,
        _reference: &ProviderRef,
        _season_number: i32,
    ) -> Result<UpstreamSeason, ProviderError> {
        Err(ProviderError::NotFound)
    }

    async fn fetch_trailer(&self, reference: &ProviderRef) -> Result<Option<String>, ProviderError> {
        Ok(self.trailers.lock().unwrap().get(reference).cloned())
    }
}

#[allow(unused)]
#[derive(Debug)]
pub struct TestApp {
    pub router: Router,
    pub provider: Arc<StubProvider>,
    pub store: Arc<InMemoryCatalogStore>,
    _tempdir: TempDir,
}

pub fn build_test_app() -> TestApp {
    let tempdir = TempDir::new().unwrap();
    let provider = Arc::new(StubProvider::default());
    let store = Arc::new(InMemoryCatalogStore::new());
    let catalog_store: Arc<dyn CatalogStore> = store.clone();

    let storage = LocalAssetStorage::new(tempdir.path());
    let settings = ImportSettings {
        provider_timeout: Duration::from_secs(2),
        store_timeout: Duration::from_secs(2),
        asset_timeout: Duration::from_secs(2),
        ..ImportSettings::default()
    };
    let importer = Arc::new(HierarchyImporter::new(
        provider.clone(),
        Arc::clone(&catalog_store),
        Arc::new(storage),
        settings,
    ));
    let bulk = BulkImporter::new(
        Arc::clone(&importer),
        BulkSettings {
            max_items: 2,
            max_attempts: 1,
            retry_delay: Duration::ZERO,
        },
    );
    let trailers = TrailerRefresher::new(
        provider.clone(),
        Arc::clone(&catalog_store),
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .with_pause(Duration::ZERO);
    let catalog = CatalogService::new(
        catalog_store,
        CacheFacade::disabled(),
        Duration::from_secs(60),
    );

    TestApp {
        router: create_app(AppState::new(importer, bulk, catalog, trailers)),
        provider,
        store,
        _tempdir: tempdir,
    }
}

#[allow(unused)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(unused)]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
