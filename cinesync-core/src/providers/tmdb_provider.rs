use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::mapping::{details_into_upstream, pick_refresh_trailer, season_into_upstream};
use super::tmdb_models::{TmdbDetails, TmdbErrorBody, TmdbSeason, TmdbVideos};
use super::{MetadataProvider, ProviderError, ProviderRef, UpstreamContent, UpstreamSeason};

pub const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

const MOVIE_APPEND: &str = "credits,keywords,videos";
const TV_APPEND: &str = "credits,external_ids,keywords,videos";

/// TMDB v3 client. Requests carry the API key as a query parameter.
#[derive(Clone)]
pub struct TmdbProvider {
    client: Client,
    api_key: String,
    api_base: String,
    image_base: String,
}

impl std::fmt::Debug for TmdbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbProvider")
            .field("api_base", &self.api_base)
            .field("image_base", &self.image_base)
            .finish_non_exhaustive()
    }
}

impl TmdbProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: TMDB_API_BASE.to_string(),
            image_base: TMDB_IMAGE_BASE.to_string(),
        }
    }

    pub fn with_request_timeout(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            ..Self::new(api_key)
        })
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_image_base(mut self, base: impl Into<String>) -> Self {
        self.image_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn image_base(&self) -> &str {
        &self.image_base
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        append: Option<&str>,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.api_base, path);
        debug!("TMDB request URL: {}", url);

        let mut params = vec![("api_key", self.api_key.as_str())];
        if let Some(append) = append {
            params.push(("append_to_response", append));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::NetworkError(e)
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound),
            StatusCode::UNAUTHORIZED => return Err(ProviderError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
            s if !s.is_success() => {
                let detail = response
                    .json::<TmdbErrorBody>()
                    .await
                    .ok()
                    .and_then(|body| body.status_message)
                    .unwrap_or_default();
                return Err(ProviderError::ApiError(format!(
                    "TMDB API returned status: {status} {detail}"
                )));
            }
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_content(
        &self,
        reference: &ProviderRef,
    ) -> Result<UpstreamContent, ProviderError> {
        let append = if reference.kind.is_series() {
            TV_APPEND
        } else {
            MOVIE_APPEND
        };
        let path = format!("{}/{}", reference.segment(), reference.id);
        let details: TmdbDetails = self.get_json(&path, Some(append)).await?;

        let content = details_into_upstream(details, reference.kind, &self.image_base);
        info!(
            reference = %reference,
            title = %content.title,
            cast = content.cast.len(),
            "fetched upstream details"
        );
        Ok(content)
    }

    async fn fetch_season(
        &self,
        reference: &ProviderRef,
        season_number: i32,
    ) -> Result<UpstreamSeason, ProviderError> {
        let path = format!("tv/{}/season/{season_number}", reference.id);
        let season: TmdbSeason = self.get_json(&path, None).await?;
        Ok(season_into_upstream(season))
    }

    async fn fetch_trailer(&self, reference: &ProviderRef) -> Result<Option<String>, ProviderError> {
        let path = format!("{}/{}/videos", reference.segment(), reference.id);
        let videos: TmdbVideos = self.get_json(&path, None).await?;
        let trailer = pick_refresh_trailer(&videos.results);
        debug!(
            reference = %reference,
            videos = videos.results.len(),
            found = trailer.is_some(),
            "fetched upstream videos"
        );
        Ok(trailer)
    }
}
