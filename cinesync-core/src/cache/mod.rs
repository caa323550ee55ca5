pub mod facade;
pub mod keys;
pub mod redis_cache;

use thiserror::Error;

pub use facade::CacheFacade;
pub use keys::CacheKeys;
pub use redis_cache::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Command(String),

    #[error("{0}")]
    Codec(String),
}
