//! Configuration for the cinesync catalog service.
//!
//! Values are layered: an optional `.env` file feeds the process
//! environment, an optional `cinesync.toml` supplies file values, and
//! environment variables override both. Validation splits problems into
//! fatal guard-rail errors and non-fatal [`ConfigWarnings`].

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AssetsConfig, CacheConfig, Config, ConfigMetadata, DatabaseBackend, DatabaseConfig,
    ImportConfig, RedisConfig, ServerConfig, TmdbConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
