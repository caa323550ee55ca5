//! # cinesync-core
//!
//! The catalog synchronization pipeline. One import pulls a movie or series
//! from TMDB, writes the content record, materializes its image assets,
//! rebuilds its genre/country/tag/actor links and, for series, the
//! season/episode hierarchy underneath it.
//!
//! ## Layout
//!
//! - [`providers`]: upstream fetch and mapping into provider-neutral shapes
//! - [`database`]: store ports plus the Postgres and in-memory adapters
//! - [`assets`]: deterministic naming, local storage and asset lifecycle
//! - [`sync`]: the import orchestration itself, including bulk runs
//! - [`catalog`] and [`cache`]: the cached read path over the catalog view
//!
//! Every import returns an [`sync::ImportSummary`]; only failures that stop
//! the main record from being written surface as [`ImportError`].

pub mod assets;
pub mod cache;
pub mod catalog;
pub mod database;
pub mod error;
pub mod providers;
pub mod sync;

pub use error::{ImportError, Result, StoreError, StoreResult};

/// Embedded schema migrations for the Postgres store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
