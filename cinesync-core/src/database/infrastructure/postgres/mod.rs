//! PostgreSQL adapter for every catalog port.

mod catalog;
mod content;
mod dimensions;
mod hierarchy;
mod links;

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{fmt, time::Duration};
use tracing::info;

use crate::error::{StoreError, StoreResult};

#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresCatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresCatalogStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(url)
            .await
            .map_err(|e| StoreError::other(format!("Failed to connect to PostgreSQL: {e}")))?;

        info!(max_connections, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::other(format!("Failed to apply migrations: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
