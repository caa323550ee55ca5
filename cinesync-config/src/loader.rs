use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::{
    AssetsConfig, CacheConfig, Config, ConfigMetadata, DEFAULT_PUBLIC_PREFIX,
    DEFAULT_TMDB_API_BASE, DEFAULT_TMDB_IMAGE_BASE, DatabaseBackend, DatabaseConfig,
    ImportConfig, RedisConfig, ServerConfig, TmdbConfig,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["cinesync.toml", "config/cinesync.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Do not read any `.env` file.
    pub skip_env_file: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
    env: Option<EnvConfig>,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options, env: None }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Use `env` instead of the process environment. Implies no `.env`
    /// file is read.
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env = Some(env);
        self.options.skip_env_file = true;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let env_config = self.env.clone().unwrap_or_else(EnvConfig::gather);

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) =
            self.compose_config(file_config, env_config, config_path, env_file_loaded)?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.options.skip_env_file {
            return Ok(false);
        }
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
            path: path.clone(),
            source: err,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No cinesync.toml detected; using environment variables and defaults",
                "Create cinesync.toml or set CINESYNC_CONFIG to point at one",
            );
        }

        let FileConfig {
            server: file_server,
            database: file_database,
            redis: file_redis,
            tmdb: file_tmdb,
            assets: file_assets,
            import: file_import,
            cache: file_cache,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .server_host
                .or(file_server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env.server_port.or(file_server.port).unwrap_or(3000),
        };

        let database_url = env
            .database_url
            .or(file_database.url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &database_url {
            validate_database_url(url)?;
        }
        let backend = match env.database_backend {
            Some(raw) => raw
                .parse::<DatabaseBackend>()
                .map_err(|reason| ConfigLoadError::InvalidBackend { reason })?,
            None => file_database.backend.unwrap_or(if database_url.is_some() {
                DatabaseBackend::Postgres
            } else {
                DatabaseBackend::Memory
            }),
        };
        let database = DatabaseConfig {
            backend,
            url: database_url,
            max_connections: env
                .database_max_connections
                .or(file_database.max_connections)
                .unwrap_or(10),
        };

        let redis = env
            .redis_url
            .or_else(|| file_redis.map(|r| r.url))
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .map(|url| RedisConfig { url });

        let tmdb = TmdbConfig {
            api_key: env
                .tmdb_api_key
                .or(file_tmdb.api_key)
                .filter(|key| !key.trim().is_empty()),
            api_base: env
                .tmdb_api_base
                .or(file_tmdb.api_base)
                .unwrap_or_else(|| DEFAULT_TMDB_API_BASE.to_string()),
            image_base: env
                .tmdb_image_base
                .or(file_tmdb.image_base)
                .unwrap_or_else(|| DEFAULT_TMDB_IMAGE_BASE.to_string()),
        };

        let assets = AssetsConfig {
            root: env
                .asset_root
                .or_else(|| {
                    file_assets
                        .root
                        .map(|root| relative_to_config(config_path.as_deref(), &root))
                })
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            public_prefix: env
                .asset_public_prefix
                .or(file_assets.public_prefix)
                .unwrap_or_else(|| DEFAULT_PUBLIC_PREFIX.to_string()),
        };

        let defaults = ImportConfig::default();
        let import = ImportConfig {
            top_cast: env
                .import_top_cast
                .or(file_import.top_cast)
                .unwrap_or(defaults.top_cast),
            provider_timeout: duration(
                "IMPORT_PROVIDER_TIMEOUT",
                env.import_provider_timeout.or(file_import.provider_timeout),
                defaults.provider_timeout,
            )?,
            store_timeout: duration(
                "IMPORT_STORE_TIMEOUT",
                env.import_store_timeout.or(file_import.store_timeout),
                defaults.store_timeout,
            )?,
            asset_timeout: duration(
                "IMPORT_ASSET_TIMEOUT",
                env.import_asset_timeout.or(file_import.asset_timeout),
                defaults.asset_timeout,
            )?,
            bulk_max_items: env
                .import_bulk_max_items
                .or(file_import.bulk_max_items)
                .unwrap_or(defaults.bulk_max_items),
            bulk_max_attempts: env
                .import_bulk_max_attempts
                .or(file_import.bulk_max_attempts)
                .unwrap_or(defaults.bulk_max_attempts),
            bulk_retry_delay: duration(
                "IMPORT_BULK_RETRY_DELAY",
                env.import_bulk_retry_delay.or(file_import.bulk_retry_delay),
                defaults.bulk_retry_delay,
            )?,
        };

        let cache = CacheConfig {
            catalog_ttl: duration(
                "CACHE_CATALOG_TTL",
                env.cache_catalog_ttl.or(file_cache.catalog_ttl),
                CacheConfig::default().catalog_ttl,
            )?,
        };

        let config = Config {
            server,
            database,
            redis,
            tmdb,
            assets,
            import,
            cache,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        let guard_warnings = validation::apply_guard_rails(&config)?;
        warnings.extend(guard_warnings);

        Ok((config, warnings))
    }
}

fn duration(
    field: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(value) => humantime::parse_duration(value.trim()).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                field,
                value,
                source,
            }
        }),
        None => Ok(default),
    }
}

fn validate_database_url(raw: &str) -> Result<(), ConfigLoadError> {
    let parsed = Url::parse(raw).map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    match parsed.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(ConfigLoadError::UnsupportedDatabaseScheme {
            scheme: other.to_string(),
        }),
    }
}

/// Resolve a path relative to the directory containing the config file.
pub fn relative_to_config(config_path: Option<&Path>, path: &Path) -> PathBuf {
    match config_path.and_then(Path::parent) {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported database URL scheme '{scheme}'")]
    UnsupportedDatabaseScheme { scheme: String },
    #[error("{reason}")]
    InvalidBackend { reason: String },
    #[error("invalid duration for {field}: '{value}'")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
