//! Upstream metadata providers.

pub mod mapping;
pub mod reference;
pub mod tmdb_models;
pub mod tmdb_provider;
pub mod upstream;

use async_trait::async_trait;
use thiserror::Error;

pub use reference::ProviderRef;
pub use tmdb_provider::TmdbProvider;
pub use upstream::{CastCredit, UpstreamContent, UpstreamEpisode, UpstreamSeason};

use crate::error::ImportError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not found")]
    NotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider request timed out")]
    Timeout,
}

impl ProviderError {
    pub fn into_import_error(self, reference: &ProviderRef) -> ImportError {
        match self {
            ProviderError::NotFound => {
                ImportError::NotFoundUpstream(format!("{reference} was not found upstream"))
            }
            other => ImportError::Internal(format!("fetching {reference}: {other}")),
        }
    }
}

/// Source of content details and per-season episode lists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_content(&self, reference: &ProviderRef)
    -> Result<UpstreamContent, ProviderError>;

    async fn fetch_season(
        &self,
        reference: &ProviderRef,
        season_number: i32,
    ) -> Result<UpstreamSeason, ProviderError>;

    /// Best embeddable video for an already imported record, or `None` when
    /// the provider lists nothing suitable.
    async fn fetch_trailer(&self, reference: &ProviderRef) -> Result<Option<String>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinesync_model::ContentKind;

    #[test]
    fn not_found_maps_to_upstream_miss() {
        let reference = ProviderRef::new(ContentKind::Movie, 603);
        let err = ProviderError::NotFound.into_import_error(&reference);
        assert!(matches!(err, ImportError::NotFoundUpstream(_)));

        let err = ProviderError::RateLimited.into_import_error(&reference);
        assert!(matches!(err, ImportError::Internal(_)));
        assert!(err.is_retryable());
    }
}
