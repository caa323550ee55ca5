use std::future::Future;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use super::{CacheError, RedisCache};

/// Best-effort read-through cache. Without Redis, or when Redis misbehaves,
/// every call computes directly; cache trouble is never returned to callers.
#[derive(Debug, Clone, Default)]
pub struct CacheFacade {
    redis: Option<RedisCache>,
}

impl CacheFacade {
    pub fn new(redis: Option<RedisCache>) -> Self {
        Self { redis }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Connects when a URL is configured. A failed connection disables the
    /// cache instead of failing startup.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let Some(url) = redis_url.map(str::trim).filter(|u| !u.is_empty()) else {
            info!("Redis not configured, catalog cache disabled");
            return Self::disabled();
        };
        match RedisCache::new(url).await {
            Ok(cache) => Self::new(Some(cache)),
            Err(err) => {
                warn!(error = %err, "Redis unavailable, catalog cache disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(redis) = &self.redis {
            let mut conn = redis.clone();
            match conn.get::<T>(key).await {
                Ok(Some(hit)) => return Ok(hit),
                Ok(None) => {}
                Err(CacheError::Codec(reason)) => {
                    debug!(key, reason, "undecodable cache entry, recomputing");
                }
                Err(err) => warn!(key, error = %err, "cache read failed, computing directly"),
            }
        }

        let value = compute().await?;

        if let Some(redis) = &self.redis {
            let mut conn = redis.clone();
            if let Err(err) = conn.set(key, &value, Some(ttl)).await {
                warn!(key, error = %err, "cache write failed");
            }
        }
        Ok(value)
    }

    /// Removes keys matching `pattern`; returns how many went away.
    pub async fn invalidate(&self, pattern: &str) -> usize {
        let Some(redis) = &self.redis else {
            return 0;
        };
        let mut conn = redis.clone();
        match conn.delete_pattern(pattern).await {
            Ok(removed) => {
                debug!(pattern, removed, "invalidated cache keys");
                removed
            }
            Err(err) => {
                warn!(pattern, error = %err, "cache invalidation failed");
                0
            }
        }
    }
}
