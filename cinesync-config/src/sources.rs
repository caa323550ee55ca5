use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::DatabaseBackend;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    pub redis: Option<FileRedisConfig>,
    #[serde(default)]
    pub tmdb: FileTmdbConfig,
    #[serde(default)]
    pub assets: FileAssetsConfig,
    #[serde(default)]
    pub import: FileImportConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<DatabaseBackend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRedisConfig {
    pub url: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAssetsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_prefix: Option<String>,
}

/// Durations are humantime strings such as `"30s"` or `"1m 30s"`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileImportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_cast: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_max_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_retry_delay: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_ttl: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_backend: Option<String>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub redis_url: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_base: Option<String>,
    pub tmdb_image_base: Option<String>,
    pub asset_root: Option<PathBuf>,
    pub asset_public_prefix: Option<String>,
    pub import_top_cast: Option<usize>,
    pub import_provider_timeout: Option<String>,
    pub import_store_timeout: Option<String>,
    pub import_asset_timeout: Option<String>,
    pub import_bulk_max_items: Option<usize>,
    pub import_bulk_max_attempts: Option<u32>,
    pub import_bulk_retry_delay: Option<String>,
    pub cache_catalog_ttl: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the environment view from any key lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            config_path: var("CINESYNC_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: parsed(var("SERVER_PORT")),
            database_backend: var("DATABASE_BACKEND"),
            database_url: var("DATABASE_URL"),
            database_max_connections: parsed(var("DATABASE_MAX_CONNECTIONS")),
            redis_url: var("REDIS_URL"),
            tmdb_api_key: var("TMDB_API_KEY"),
            tmdb_api_base: var("TMDB_API_BASE"),
            tmdb_image_base: var("TMDB_IMAGE_BASE"),
            asset_root: var("ASSET_ROOT").map(PathBuf::from),
            asset_public_prefix: var("ASSET_PUBLIC_PREFIX"),
            import_top_cast: parsed(var("IMPORT_TOP_CAST")),
            import_provider_timeout: var("IMPORT_PROVIDER_TIMEOUT"),
            import_store_timeout: var("IMPORT_STORE_TIMEOUT"),
            import_asset_timeout: var("IMPORT_ASSET_TIMEOUT"),
            import_bulk_max_items: parsed(var("IMPORT_BULK_MAX_ITEMS")),
            import_bulk_max_attempts: parsed(var("IMPORT_BULK_MAX_ATTEMPTS")),
            import_bulk_retry_delay: var("IMPORT_BULK_RETRY_DELAY"),
            cache_catalog_ttl: var("CACHE_CATALOG_TTL"),
        }
    }
}

fn parsed<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|raw| raw.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn blank_and_unparseable_values_are_unset() {
        let vars: HashMap<&str, &str> = [
            ("SERVER_PORT", "not-a-port"),
            ("REDIS_URL", "   "),
            ("IMPORT_TOP_CAST", " 5 "),
        ]
        .into_iter()
        .collect();

        let env = EnvConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env.server_port, None);
        assert_eq!(env.redis_url, None);
        assert_eq!(env.import_top_cast, Some(5));
    }

    #[test]
    fn file_config_parses_sections() {
        let file: FileConfig = toml::from_str(
            r#"
            [database]
            backend = "memory"

            [import]
            provider_timeout = "45s"
            bulk_max_items = 25

            [redis]
            url = "redis://localhost:6379"
            "#,
        )
        .unwrap();

        assert_eq!(file.database.backend, Some(DatabaseBackend::Memory));
        assert_eq!(file.import.provider_timeout.as_deref(), Some("45s"));
        assert_eq!(file.import.bulk_max_items, Some(25));
        assert_eq!(file.redis.unwrap().url, "redis://localhost:6379");
    }
}
