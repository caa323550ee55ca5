use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::ids::ContentId;

/// Movie or series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ContentKind {
    Movie,
    #[cfg_attr(feature = "serde", serde(alias = "tv"))]
    Series,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        }
    }

    pub fn is_series(self) -> bool {
        matches!(self, ContentKind::Series)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(ContentKind::Movie),
            "series" | "tv" | "show" => Ok(ContentKind::Series),
            other => Err(ModelError::InvalidValue {
                field: "kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Poster and backdrop locators as stored on a content row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetLocators {
    pub poster: Option<String>,
    pub backdrop: Option<String>,
}

/// A content record ready to be written, minus its store identity.
///
/// `external_id` is the idempotency key: two drafts with the same value
/// always land on the same row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentDraft {
    pub external_id: String,
    pub provider_id: Option<i64>,
    pub kind: ContentKind,
    pub title: String,
    pub synopsis: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub duration: Option<String>,
    pub assets: AssetLocators,
    pub trailer_url: Option<String>,
    pub quality: String,
    pub total_seasons: Option<i32>,
    pub country_summary: Option<String>,
}

/// A content row as read back from the store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredContent {
    pub id: ContentId,
    pub external_id: String,
    pub provider_id: Option<i64>,
    pub kind: ContentKind,
    pub title: String,
    pub synopsis: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub duration: Option<String>,
    pub assets: AssetLocators,
    pub trailer_url: Option<String>,
    pub quality: String,
    pub total_seasons: Option<i32>,
    pub country_summary: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredContent {
    /// Materialize a freshly inserted row from its draft.
    pub fn from_draft(id: ContentId, draft: &ContentDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            external_id: draft.external_id.clone(),
            provider_id: draft.provider_id,
            kind: draft.kind,
            title: draft.title.clone(),
            synopsis: draft.synopsis.clone(),
            release_date: draft.release_date,
            rating: draft.rating,
            duration: draft.duration.clone(),
            assets: draft.assets.clone(),
            trailer_url: draft.trailer_url.clone(),
            quality: draft.quality.clone(),
            total_seasons: draft.total_seasons,
            country_summary: draft.country_summary.clone(),
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every draft-owned field. Identity, view counter and
    /// creation time are left alone.
    pub fn apply_draft(&mut self, draft: &ContentDraft, now: DateTime<Utc>) {
        self.external_id = draft.external_id.clone();
        self.provider_id = draft.provider_id;
        self.kind = draft.kind;
        self.title = draft.title.clone();
        self.synopsis = draft.synopsis.clone();
        self.release_date = draft.release_date;
        self.rating = draft.rating;
        self.duration = draft.duration.clone();
        self.assets = draft.assets.clone();
        self.trailer_url = draft.trailer_url.clone();
        self.quality = draft.quality.clone();
        self.total_seasons = draft.total_seasons;
        self.country_summary = draft.country_summary.clone();
        self.updated_at = now;
    }

    /// The provider id, falling back to the one embedded in a
    /// `tmdb:<id>` external id.
    pub fn provider_key(&self) -> Option<i64> {
        self.provider_id
            .or_else(|| provider_id_from_external(&self.external_id))
    }
}

/// External-id prefix for records the provider knows no IMDb id for.
pub const PROVIDER_EXTERNAL_PREFIX: &str = "tmdb:";

pub fn provider_external_id(provider_id: i64) -> String {
    format!("{PROVIDER_EXTERNAL_PREFIX}{provider_id}")
}

pub fn provider_id_from_external(external_id: &str) -> Option<i64> {
    external_id
        .strip_prefix(PROVIDER_EXTERNAL_PREFIX)?
        .parse()
        .ok()
}
