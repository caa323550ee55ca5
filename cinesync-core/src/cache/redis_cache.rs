use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use super::CacheError;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        info!("Connecting to Redis cache at {}", redis_url);

        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Connect(format!("Failed to create Redis client: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connect(format!("Failed to connect to Redis: {e}")))?;

        info!("Successfully connected to Redis cache");

        Ok(Self { conn })
    }

    pub async fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, CacheError> {
        debug!("Cache GET: {}", key);

        let data: Option<String> = self
            .conn
            .get(key)
            .await
            .map_err(|e| CacheError::Command(format!("Redis GET failed: {e}")))?;

        match data {
            Some(json) => {
                let value = serde_json::from_str(&json).map_err(|e| {
                    CacheError::Codec(format!("Failed to deserialize cache data: {e}"))
                })?;
                debug!("Cache HIT: {}", key);
                Ok(Some(value))
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);

        let json = serde_json::to_string(value)
            .map_err(|e| CacheError::Codec(format!("Failed to serialize cache data: {e}")))?;

        match ttl {
            Some(ttl) => self
                .conn
                .set_ex::<_, _, ()>(key, json, ttl.as_secs().max(1))
                .await
                .map_err(|e| CacheError::Command(format!("Redis SETEX failed: {e}")))?,
            None => self
                .conn
                .set::<_, _, ()>(key, json)
                .await
                .map_err(|e| CacheError::Command(format!("Redis SET failed: {e}")))?,
        }

        Ok(())
    }

    /// Deletes every key matching `pattern`. Returns how many were removed.
    pub async fn delete_pattern(&mut self, pattern: &str) -> Result<usize, CacheError> {
        debug!("Cache DELETE pattern: {}", pattern);

        let keys: Vec<String> = self
            .conn
            .keys(pattern)
            .await
            .map_err(|e| CacheError::Command(format!("Redis KEYS failed: {e}")))?;

        if keys.is_empty() {
            return Ok(0);
        }

        debug!("Deleting {} keys matching pattern: {}", keys.len(), pattern);
        let removed = keys.len();
        let _: () = self
            .conn
            .del(keys)
            .await
            .map_err(|e| CacheError::Command(format!("Redis DEL failed: {e}")))?;

        Ok(removed)
    }
}
