//! Wires configuration into the store, provider, asset storage and cache
//! the handlers run against. The store backend is chosen here, once.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use cinesync_config::{Config, DatabaseBackend};
use cinesync_core::assets::LocalAssetStorage;
use cinesync_core::cache::CacheFacade;
use cinesync_core::catalog::CatalogService;
use cinesync_core::database::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use cinesync_core::providers::{MetadataProvider, TmdbProvider};
use cinesync_core::sync::{
    BulkImporter, BulkSettings, HierarchyImporter, ImportSettings, TrailerRefresher,
};

use super::app_state::AppState;

pub fn import_settings(config: &Config) -> ImportSettings {
    ImportSettings {
        top_cast: config.import.top_cast,
        provider_timeout: config.import.provider_timeout,
        store_timeout: config.import.store_timeout,
        asset_timeout: config.import.asset_timeout,
    }
}

pub fn bulk_settings(config: &Config) -> BulkSettings {
    BulkSettings {
        max_items: config.import.bulk_max_items,
        max_attempts: config.import.bulk_max_attempts,
        retry_delay: config.import.bulk_retry_delay,
    }
}

/// Opens the configured catalog store. Postgres stores are migrated before
/// they are handed out.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn CatalogStore>> {
    match config.database.backend {
        DatabaseBackend::Memory => {
            info!(backend = %config.database.backend, "using in-memory catalog store");
            Ok(Arc::new(InMemoryCatalogStore::new()))
        }
        DatabaseBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let store = PostgresCatalogStore::connect(url, config.database.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            store
                .migrate()
                .await
                .context("database migration failed")?;
            info!(backend = %config.database.backend, "connected to catalog store");
            Ok(Arc::new(store))
        }
    }
}

pub fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn MetadataProvider>> {
    let api_key = config.tmdb.api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        warn!("TMDB API key missing; imports will fail upstream");
    }
    let provider = TmdbProvider::with_request_timeout(api_key, config.import.provider_timeout)
        .context("failed to build TMDB client")?
        .with_api_base(config.tmdb.api_base.clone())
        .with_image_base(config.tmdb.image_base.clone());
    Ok(Arc::new(provider))
}

pub fn build_importer(
    config: &Config,
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn CatalogStore>,
) -> anyhow::Result<HierarchyImporter> {
    config
        .ensure_directories()
        .with_context(|| format!("failed to create asset root {}", config.assets.root.display()))?;
    let storage = LocalAssetStorage::new(config.assets.root.clone())
        .with_public_prefix(&config.assets.public_prefix)
        .with_download_timeout(config.import.asset_timeout)
        .context("failed to build asset download client")?;

    Ok(HierarchyImporter::new(
        provider,
        store,
        Arc::new(storage),
        import_settings(config),
    ))
}

/// Assembles handler state around an already opened store.
pub async fn build_state(config: &Config, store: Arc<dyn CatalogStore>) -> anyhow::Result<AppState> {
    let provider = build_provider(config)?;
    let importer = Arc::new(build_importer(
        config,
        Arc::clone(&provider),
        Arc::clone(&store),
    )?);
    let bulk = BulkImporter::new(Arc::clone(&importer), bulk_settings(config));
    let trailers = TrailerRefresher::new(
        provider,
        Arc::clone(&store),
        config.import.provider_timeout,
        config.import.store_timeout,
    );
    let cache = CacheFacade::connect(config.redis_url()).await;
    let catalog = CatalogService::new(store, cache, config.cache.catalog_ttl);

    Ok(AppState::new(importer, bulk, catalog, trailers))
}
