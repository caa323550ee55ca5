//! Wire DTOs for the TMDB v3 API. Only the fields the pipeline reads.

use serde::Deserialize;

/// Movie or TV details with `credits`, `keywords`, `videos` and (TV only)
/// `external_ids` appended.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbDetails {
    pub id: i64,
    /// Movies.
    #[serde(default)]
    pub title: Option<String>,
    /// TV.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub episode_run_time: Option<Vec<i32>>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub external_ids: Option<TmdbExternalIds>,
    #[serde(default)]
    pub genres: Option<Vec<TmdbGenre>>,
    #[serde(default)]
    pub production_countries: Option<Vec<TmdbProductionCountry>>,
    #[serde(default)]
    pub origin_country: Option<Vec<String>>,
    #[serde(default)]
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub keywords: Option<TmdbKeywords>,
    #[serde(default)]
    pub videos: Option<TmdbVideos>,
    #[serde(default)]
    pub number_of_seasons: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbProductionCountry {
    #[serde(default)]
    pub iso_3166_1: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Movies list keywords under `keywords`, TV under `results`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbKeywords {
    #[serde(default)]
    pub keywords: Option<Vec<TmdbKeyword>>,
    #[serde(default)]
    pub results: Option<Vec<TmdbKeyword>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbKeyword {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbSeason {
    pub season_number: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisode {
    #[serde(default)]
    pub id: Option<i64>,
    pub episode_number: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorBody {
    #[serde(default)]
    pub status_message: Option<String>,
}
