use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub tmdb: TmdbConfig,
    pub assets: AssetsConfig,
    pub import: ImportConfig,
    pub cache: CacheConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        self.assets.ensure_directories()
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.redis.as_ref().map(|r| r.url.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which catalog store the process runs against. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

impl DatabaseBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseBackend::Postgres => "postgres",
            DatabaseBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DatabaseBackend::Postgres),
            "memory" | "mem" | "in-memory" => Ok(DatabaseBackend::Memory),
            other => Err(format!("unknown database backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_base: String,
}

#[derive(Debug, Clone)]
pub struct AssetsConfig {
    pub root: PathBuf,
    pub public_prefix: String,
}

impl AssetsConfig {
    fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub top_cast: usize,
    pub provider_timeout: Duration,
    pub store_timeout: Duration,
    pub asset_timeout: Duration,
    pub bulk_max_items: usize,
    pub bulk_max_attempts: u32,
    pub bulk_retry_delay: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            top_cast: 10,
            provider_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(15),
            asset_timeout: Duration::from_secs(30),
            bulk_max_items: 10,
            bulk_max_attempts: 2,
            bulk_retry_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub catalog_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            catalog_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
