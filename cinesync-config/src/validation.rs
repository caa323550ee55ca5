use thiserror::Error;

use crate::models::{Config, DatabaseBackend};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("DATABASE_BACKEND is postgres but no DATABASE_URL is configured")]
    MissingDatabaseUrl,
    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    match config.database.backend {
        DatabaseBackend::Postgres if config.database.url.is_none() => {
            return Err(ConfigGuardRailError::MissingDatabaseUrl);
        }
        DatabaseBackend::Memory => warnings.push_with_hint(
            "Using the in-memory catalog store; imported data is lost on restart",
            "Set DATABASE_BACKEND=postgres and DATABASE_URL to persist the catalog",
        ),
        DatabaseBackend::Postgres => {}
    }

    if config.import.top_cast == 0 {
        return Err(ConfigGuardRailError::ZeroLimit {
            field: "IMPORT_TOP_CAST",
        });
    }
    if config.import.bulk_max_items == 0 {
        return Err(ConfigGuardRailError::ZeroLimit {
            field: "IMPORT_BULK_MAX_ITEMS",
        });
    }
    if config.import.bulk_max_attempts == 0 {
        return Err(ConfigGuardRailError::ZeroLimit {
            field: "IMPORT_BULK_MAX_ATTEMPTS",
        });
    }
    if config.database.max_connections == 0 {
        return Err(ConfigGuardRailError::ZeroLimit {
            field: "DATABASE_MAX_CONNECTIONS",
        });
    }

    if config.tmdb.api_key.is_none() {
        warnings.push_with_hint(
            "TMDB_API_KEY not configured; imports will be rejected upstream",
            "Create an API key at themoviedb.org and set TMDB_API_KEY",
        );
    }

    if config.redis.is_none() {
        warnings.push_with_hint(
            "REDIS_URL not configured; catalog responses are not cached",
            "Set REDIS_URL to enable the catalog cache",
        );
    }

    Ok(warnings)
}
