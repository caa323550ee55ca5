use chrono::NaiveDate;

use cinesync_model::{ContentKind, provider_external_id};

/// A content record as the provider describes it, already normalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpstreamContent {
    pub provider_id: i64,
    pub kind: Option<ContentKind>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub synopsis: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub runtime_minutes: Option<i32>,
    /// Fully qualified remote image references.
    pub poster_ref: Option<String>,
    pub backdrop_ref: Option<String>,
    pub trailer_url: Option<String>,
    pub countries: Vec<String>,
    pub genres: Vec<String>,
    /// Ordered by billing.
    pub cast: Vec<CastCredit>,
    pub keywords: Vec<String>,
    pub season_count: Option<i32>,
}

impl UpstreamContent {
    /// The idempotency key: the IMDb id when known, else `tmdb:<id>`.
    pub fn external_id(&self) -> String {
        match self.imdb_id.as_deref().map(str::trim) {
            Some(imdb) if !imdb.is_empty() => imdb.to_string(),
            _ => provider_external_id(self.provider_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CastCredit {
    pub person_id: i64,
    pub name: String,
    pub character: Option<String>,
    pub order: i32,
    pub photo_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpstreamSeason {
    pub season_number: i32,
    pub name: Option<String>,
    pub episodes: Vec<UpstreamEpisode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpstreamEpisode {
    pub provider_id: Option<i64>,
    pub episode_number: i32,
    pub name: Option<String>,
    pub air_date: Option<NaiveDate>,
}
