use std::fmt;
use url::Url;

use cinesync_model::ContentKind;

use crate::error::ImportError;

const TMDB_HOST: &str = "themoviedb.org";

/// What to ask the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderRef {
    pub kind: ContentKind,
    pub id: i64,
}

impl ProviderRef {
    pub fn new(kind: ContentKind, id: i64) -> Self {
        Self { kind, id }
    }

    /// Accepts a provider page URL (`.../movie/603-the-matrix`,
    /// `.../tv/1399`) or a bare numeric id. A URL carries its own kind;
    /// a bare id takes `declared`, defaulting to movie.
    pub fn parse(input: &str, declared: Option<ContentKind>) -> Result<Self, ImportError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImportError::Validation("a TMDB id or URL is required".into()));
        }

        if let Ok(id) = input.parse::<i64>() {
            return Self::checked(declared.unwrap_or(ContentKind::Movie), id, input);
        }

        if input.contains(TMDB_HOST) {
            return Self::from_url(input);
        }

        Err(ImportError::Validation(format!(
            "'{input}' is neither a TMDB id nor a TMDB URL"
        )))
    }

    fn from_url(input: &str) -> Result<Self, ImportError> {
        let invalid = || ImportError::Validation(format!("unrecognized TMDB URL '{input}'"));

        let url = Url::parse(input)
            .or_else(|_| Url::parse(&format!("https://{input}")))
            .map_err(|_| invalid())?;
        if !url.host_str().is_some_and(|host| host.ends_with(TMDB_HOST)) {
            return Err(invalid());
        }

        let mut segments = url.path_segments().ok_or_else(invalid)?;
        let kind = match segments.next() {
            Some("movie") => ContentKind::Movie,
            Some("tv") => ContentKind::Series,
            _ => return Err(invalid()),
        };
        let slug = segments.next().ok_or_else(invalid)?;
        let digits: String = slug.chars().take_while(char::is_ascii_digit).collect();
        let id = digits.parse::<i64>().map_err(|_| invalid())?;

        Self::checked(kind, id, input)
    }

    fn checked(kind: ContentKind, id: i64, input: &str) -> Result<Self, ImportError> {
        if id <= 0 {
            return Err(ImportError::Validation(format!("'{input}' is not a valid TMDB id")));
        }
        Ok(Self { kind, id })
    }

    /// Path segment the provider uses for this kind.
    pub fn segment(&self) -> &'static str {
        match self.kind {
            ContentKind::Movie => "movie",
            ContentKind::Series => "tv",
        }
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.segment(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_kind_wins_over_declared_kind() {
        let parsed = ProviderRef::parse(
            "https://www.themoviedb.org/tv/1399-game-of-thrones",
            Some(ContentKind::Movie),
        )
        .unwrap();
        assert_eq!(parsed, ProviderRef::new(ContentKind::Series, 1399));
    }

    #[test]
    fn bare_id_uses_declared_kind() {
        assert_eq!(
            ProviderRef::parse(" 603 ", None).unwrap(),
            ProviderRef::new(ContentKind::Movie, 603)
        );
        assert_eq!(
            ProviderRef::parse("1399", Some(ContentKind::Series)).unwrap(),
            ProviderRef::new(ContentKind::Series, 1399)
        );
    }

    #[test]
    fn scheme_is_optional() {
        assert_eq!(
            ProviderRef::parse("themoviedb.org/movie/27205", None).unwrap(),
            ProviderRef::new(ContentKind::Movie, 27205)
        );
    }

    #[test]
    fn malformed_input_is_a_validation_error() {
        for input in ["", "abc", "https://www.themoviedb.org/person/17419", "-4", "0"] {
            let err = ProviderRef::parse(input, None).unwrap_err();
            assert!(matches!(err, ImportError::Validation(_)), "{input}");
        }
    }
}
