//! TMDB payload to [`UpstreamContent`] normalization.

use chrono::NaiveDate;

use cinesync_model::ContentKind;

use super::tmdb_models::{TmdbDetails, TmdbProductionCountry, TmdbSeason, TmdbVideo};
use super::upstream::{CastCredit, UpstreamContent, UpstreamEpisode, UpstreamSeason};

pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "original";
pub const PROFILE_SIZE: &str = "w185";

const YOUTUBE: &str = "YouTube";
const TRAILER: &str = "Trailer";

/// Origin-country fallback table. Codes outside it are kept verbatim.
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("CA", "Canada"),
    ("AU", "Australia"),
    ("FR", "France"),
    ("DE", "Germany"),
    ("IT", "Italy"),
    ("ES", "Spain"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("CN", "China"),
    ("IN", "India"),
    ("BR", "Brazil"),
    ("MX", "Mexico"),
    ("RU", "Russia"),
];

pub fn country_name(code: &str) -> Option<&'static str> {
    COUNTRY_NAMES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Production countries by name; when there are none, origin-country codes
/// mapped through [`country_name`].
pub fn resolve_countries(
    production: &[TmdbProductionCountry],
    origin_codes: &[String],
) -> Vec<String> {
    let named: Vec<String> = production
        .iter()
        .filter_map(|country| {
            country
                .name
                .as_deref()
                .or(country.iso_3166_1.as_deref())
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        })
        .collect();
    if !named.is_empty() {
        return named;
    }

    origin_codes
        .iter()
        .map(|code| code.trim())
        .filter(|code| code.len() > 1)
        .map(|code| {
            country_name(code)
                .map(str::to_string)
                .unwrap_or_else(|| code.to_string())
        })
        .collect()
}

/// A video preference: accepted types and whether it must be official.
type VideoPreference = (&'static [&'static str], bool);

const IMPORT_PREFERENCES: &[VideoPreference] = &[(&[TRAILER], true), (&[TRAILER], false)];

/// Used when backfilling records that imported without a trailer.
const REFRESH_PREFERENCES: &[VideoPreference] = &[
    (&[TRAILER], true),
    (&[TRAILER], false),
    (&["Teaser"], true),
    (&["Teaser"], false),
    (&["Featurette"], true),
    (&["Clip"], true),
    (&["Featurette", "Clip"], false),
];

/// An official YouTube trailer, else any YouTube trailer, as an embed URL.
pub fn pick_trailer(videos: &[TmdbVideo]) -> Option<String> {
    pick_video(videos, IMPORT_PREFERENCES)
}

/// Like [`pick_trailer`], then teasers, then featurettes and clips.
pub fn pick_refresh_trailer(videos: &[TmdbVideo]) -> Option<String> {
    pick_video(videos, REFRESH_PREFERENCES)
}

fn pick_video(videos: &[TmdbVideo], preferences: &[VideoPreference]) -> Option<String> {
    preferences
        .iter()
        .find_map(|(types, official_only)| {
            videos.iter().find(|v| {
                v.site == YOUTUBE
                    && !v.key.is_empty()
                    && types.contains(&v.video_type.as_str())
                    && (v.official || !official_only)
            })
        })
        .map(|v| format!("https://www.youtube.com/embed/{}", v.key))
}

pub fn format_runtime(minutes: Option<i32>) -> Option<String> {
    minutes.filter(|m| *m > 0).map(|m| format!("{m} min"))
}

pub fn image_url(base: &str, size: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let path = path.strip_prefix('/').unwrap_or(path);
    Some(format!("{}/{size}/{path}", base.trim_end_matches('/')))
}

/// `YYYY-MM-DD`; blanks and garbage become `None`.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn details_into_upstream(
    details: TmdbDetails,
    kind: ContentKind,
    image_base: &str,
) -> UpstreamContent {
    let is_series = kind.is_series();

    let title = if is_series {
        details.name.clone().or(details.title.clone())
    } else {
        details.title.clone().or(details.name.clone())
    }
    .unwrap_or_default();

    let release = if is_series {
        details.first_air_date.as_deref()
    } else {
        details.release_date.as_deref()
    };

    let runtime_minutes = if is_series {
        details
            .episode_run_time
            .as_ref()
            .and_then(|times| times.first().copied())
    } else {
        details.runtime
    };

    let imdb_id = non_blank(details.imdb_id.clone()).or_else(|| {
        details
            .external_ids
            .as_ref()
            .and_then(|ids| non_blank(ids.imdb_id.clone()))
    });

    let countries = resolve_countries(
        details.production_countries.as_deref().unwrap_or_default(),
        details.origin_country.as_deref().unwrap_or_default(),
    );

    let genres = details
        .genres
        .unwrap_or_default()
        .into_iter()
        .map(|g| g.name)
        .collect();

    let mut cast: Vec<CastCredit> = details
        .credits
        .map(|credits| credits.cast)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, member)| CastCredit {
            person_id: member.id,
            photo_ref: image_url(image_base, PROFILE_SIZE, member.profile_path.as_deref()),
            name: member.name,
            character: non_blank(member.character),
            order: member
                .order
                .unwrap_or_else(|| i32::try_from(index).unwrap_or(i32::MAX)),
        })
        .collect();
    cast.sort_by_key(|credit| credit.order);

    let keywords = details
        .keywords
        .map(|kw| {
            if is_series {
                kw.results.or(kw.keywords)
            } else {
                kw.keywords.or(kw.results)
            }
            .unwrap_or_default()
        })
        .unwrap_or_default()
        .into_iter()
        .map(|k| k.name)
        .collect();

    let trailer_url = details
        .videos
        .as_ref()
        .and_then(|videos| pick_trailer(&videos.results));

    UpstreamContent {
        provider_id: details.id,
        kind: Some(kind),
        imdb_id,
        title,
        synopsis: non_blank(details.overview),
        release_date: parse_date(release),
        rating: details.vote_average,
        runtime_minutes,
        poster_ref: image_url(image_base, POSTER_SIZE, details.poster_path.as_deref()),
        backdrop_ref: image_url(image_base, BACKDROP_SIZE, details.backdrop_path.as_deref()),
        trailer_url,
        countries,
        genres,
        cast,
        keywords,
        season_count: if is_series {
            details.number_of_seasons
        } else {
            None
        },
    }
}

pub fn season_into_upstream(season: TmdbSeason) -> UpstreamSeason {
    UpstreamSeason {
        season_number: season.season_number,
        name: non_blank(season.name),
        episodes: season
            .episodes
            .into_iter()
            .map(|episode| UpstreamEpisode {
                provider_id: episode.id,
                episode_number: episode.episode_number,
                name: non_blank(episode.name),
                air_date: parse_date(episode.air_date.as_deref()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::tmdb_models::TmdbDetails;

    fn video(key: &str, site: &str, kind: &str, official: bool) -> TmdbVideo {
        TmdbVideo {
            key: key.into(),
            site: site.into(),
            video_type: kind.into(),
            official,
        }
    }

    #[test]
    fn official_youtube_trailer_is_preferred() {
        let videos = vec![
            video("teaser", "YouTube", "Teaser", true),
            video("fan", "YouTube", "Trailer", false),
            video("vimeo", "Vimeo", "Trailer", true),
            video("real", "YouTube", "Trailer", true),
        ];
        assert_eq!(
            pick_trailer(&videos).as_deref(),
            Some("https://www.youtube.com/embed/real")
        );
    }

    #[test]
    fn any_youtube_trailer_is_the_fallback() {
        let videos = vec![
            video("vimeo", "Vimeo", "Trailer", true),
            video("fan", "YouTube", "Trailer", false),
        ];
        assert_eq!(
            pick_trailer(&videos).as_deref(),
            Some("https://www.youtube.com/embed/fan")
        );
        assert_eq!(pick_trailer(&[video("x", "Vimeo", "Trailer", true)]), None);
    }

    #[test]
    fn refresh_falls_back_to_teasers_then_extras() {
        let videos = vec![
            video("clip", "YouTube", "Clip", false),
            video("teaser", "YouTube", "Teaser", false),
        ];
        assert_eq!(pick_trailer(&videos), None);
        assert_eq!(
            pick_refresh_trailer(&videos).as_deref(),
            Some("https://www.youtube.com/embed/teaser")
        );

        let extras = vec![
            video("fan-clip", "YouTube", "Clip", false),
            video("official-clip", "YouTube", "Clip", true),
        ];
        assert_eq!(
            pick_refresh_trailer(&extras).as_deref(),
            Some("https://www.youtube.com/embed/official-clip")
        );
        assert_eq!(pick_refresh_trailer(&[video("bts", "YouTube", "Behind the Scenes", true)]), None);
    }

    #[test]
    fn production_countries_win_over_origin_codes() {
        let production = vec![TmdbProductionCountry {
            iso_3166_1: Some("NZ".into()),
            name: Some("New Zealand".into()),
        }];
        let origin = vec!["US".to_string()];
        assert_eq!(resolve_countries(&production, &origin), vec!["New Zealand"]);
    }

    #[test]
    fn origin_codes_map_through_table_and_keep_unknowns() {
        let origin = vec!["kr".to_string(), "NZ".to_string(), "X".to_string()];
        assert_eq!(resolve_countries(&[], &origin), vec!["South Korea", "NZ"]);
    }

    #[test]
    fn runtime_and_images_format() {
        assert_eq!(format_runtime(Some(136)).as_deref(), Some("136 min"));
        assert_eq!(format_runtime(Some(0)), None);
        assert_eq!(format_runtime(None), None);
        assert_eq!(
            image_url("https://image.tmdb.org/t/p/", POSTER_SIZE, Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(image_url("https://image.tmdb.org/t/p", POSTER_SIZE, Some("")), None);
    }

    #[test]
    fn series_payload_maps_tv_fields() {
        let details: TmdbDetails = serde_json::from_value(serde_json::json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "episode_run_time": [60, 55],
            "number_of_seasons": 8,
            "origin_country": ["US"],
            "production_countries": [],
            "external_ids": { "imdb_id": "tt0944947" },
            "keywords": { "results": [{ "name": "dragon" }] },
            "credits": { "cast": [
                { "id": 2, "name": "Second", "order": 1 },
                { "id": 1, "name": "First", "order": 0, "profile_path": "/p.jpg" }
            ] }
        }))
        .unwrap();

        let upstream = details_into_upstream(details, ContentKind::Series, "https://img");

        assert_eq!(upstream.title, "Game of Thrones");
        assert_eq!(upstream.external_id(), "tt0944947");
        assert_eq!(upstream.runtime_minutes, Some(60));
        assert_eq!(upstream.season_count, Some(8));
        assert_eq!(upstream.countries, vec!["United States"]);
        assert_eq!(upstream.keywords, vec!["dragon"]);
        assert_eq!(upstream.cast[0].name, "First");
        assert_eq!(upstream.cast[0].photo_ref.as_deref(), Some("https://img/w185/p.jpg"));
        assert_eq!(
            upstream.release_date,
            NaiveDate::from_ymd_opt(2011, 4, 17)
        );
    }

    #[test]
    fn movie_payload_ignores_season_count() {
        let details: TmdbDetails = serde_json::from_value(serde_json::json!({
            "id": 603,
            "title": "The Matrix",
            "release_date": "",
            "runtime": 136,
            "number_of_seasons": 3,
            "keywords": { "keywords": [{ "name": "simulation" }] }
        }))
        .unwrap();

        let upstream = details_into_upstream(details, ContentKind::Movie, "https://img");

        assert_eq!(upstream.external_id(), "tmdb:603");
        assert_eq!(upstream.release_date, None);
        assert_eq!(upstream.season_count, None);
        assert_eq!(upstream.keywords, vec!["simulation"]);
    }
}
