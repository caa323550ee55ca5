use chrono::NaiveDate;

use crate::ids::{ContentId, EpisodeId, SeasonId};

/// A season keyed by `(content, season_number)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeasonDraft {
    pub season_number: i32,
    pub title: String,
    pub episode_count: i32,
}

/// An episode keyed by `(season, episode_number)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeDraft {
    pub episode_number: i32,
    pub title: String,
    pub external_id: Option<String>,
    pub air_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeasonRecord {
    pub id: SeasonId,
    pub content_id: ContentId,
    pub season_number: i32,
    pub title: String,
    pub episode_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeRecord {
    pub id: EpisodeId,
    pub season_id: SeasonId,
    pub episode_number: i32,
    pub title: String,
    pub external_id: Option<String>,
    pub air_date: Option<NaiveDate>,
}
