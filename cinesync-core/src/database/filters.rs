//! Composable catalog predicates.
//!
//! A [`CatalogFilter`] folds into a list of [`FilterClause`]s. The same list
//! renders into SQL for Postgres and evaluates in memory for the test store,
//! so both backends agree on what a filter means.

use chrono::{Datelike, NaiveDate};
use sqlx::{Postgres, QueryBuilder};

use cinesync_model::{CatalogFilter, ContentKind};

const CATALOG_COLUMNS: &str = "c.id, c.external_id, c.kind, c.title, c.release_date, \
     c.rating, c.poster_url, c.quality, c.views";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    Kind(ContentKind),
    /// Case-insensitive substring match on any linked genre.
    GenreLike(String),
    /// Exact match on any linked country.
    Country(String),
    /// Release year.
    Year(i32),
}

/// The facts about one content row a clause can look at.
#[derive(Debug, Clone, Copy)]
pub struct ClauseSubject<'a> {
    pub kind: ContentKind,
    pub release_date: Option<NaiveDate>,
    pub genres: &'a [String],
    pub countries: &'a [String],
}

impl FilterClause {
    pub fn from_filter(filter: &CatalogFilter) -> Vec<FilterClause> {
        let mut clauses = Vec::new();
        if let Some(kind) = filter.kind {
            clauses.push(FilterClause::Kind(kind));
        }
        if let Some(genre) = non_blank(filter.genre.as_deref()) {
            clauses.push(FilterClause::GenreLike(genre));
        }
        if let Some(country) = non_blank(filter.country.as_deref()) {
            clauses.push(FilterClause::Country(country));
        }
        if let Some(year) = filter.year {
            clauses.push(FilterClause::Year(year));
        }
        clauses
    }

    fn push_sql(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        match self {
            FilterClause::Kind(kind) => {
                builder.push("c.kind = ");
                builder.push_bind(kind.as_str());
            }
            FilterClause::GenreLike(genre) => {
                builder.push(
                    "EXISTS (SELECT 1 FROM content_genres cg \
                     JOIN genres g ON g.id = cg.genre_id \
                     WHERE cg.content_id = c.id AND g.name ILIKE ",
                );
                builder.push_bind(like_pattern(genre));
                builder.push(")");
            }
            FilterClause::Country(country) => {
                builder.push(
                    "EXISTS (SELECT 1 FROM content_countries cc \
                     JOIN countries co ON co.id = cc.country_id \
                     WHERE cc.content_id = c.id AND co.name = ",
                );
                builder.push_bind(country.clone());
                builder.push(")");
            }
            FilterClause::Year(year) => {
                builder.push("EXTRACT(YEAR FROM c.release_date)::INT = ");
                builder.push_bind(*year);
            }
        }
    }

    pub fn matches(&self, subject: &ClauseSubject<'_>) -> bool {
        match self {
            FilterClause::Kind(kind) => subject.kind == *kind,
            FilterClause::GenreLike(genre) => {
                let needle = genre.to_lowercase();
                subject
                    .genres
                    .iter()
                    .any(|name| name.to_lowercase().contains(&needle))
            }
            FilterClause::Country(country) => {
                subject.countries.iter().any(|name| name == country)
            }
            FilterClause::Year(year) => subject
                .release_date
                .is_some_and(|date| date.year() == *year),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, clauses: &[FilterClause]) {
    for (index, clause) in clauses.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        clause.push_sql(builder);
    }
}

/// Page query, newest first.
pub fn catalog_page_query(
    clauses: &[FilterClause],
    filter: &CatalogFilter,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {CATALOG_COLUMNS} FROM contents c"));
    push_where(&mut builder, clauses);
    builder.push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ");
    builder.push_bind(i64::from(filter.limit()));
    builder.push(" OFFSET ");
    builder.push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));
    builder
}

/// Count query over the same clause list.
pub fn catalog_count_query(clauses: &[FilterClause]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM contents c");
    push_where(&mut builder, clauses);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> CatalogFilter {
        CatalogFilter {
            kind: Some(ContentKind::Series),
            genre: Some("dram".into()),
            country: Some("Japan".into()),
            year: Some(2019),
            page: Some(2),
            limit: Some(10),
        }
    }

    #[test]
    fn blank_fields_produce_no_clauses() {
        let empty = CatalogFilter {
            genre: Some("  ".into()),
            ..CatalogFilter::default()
        };
        assert!(FilterClause::from_filter(&empty).is_empty());
        assert_eq!(
            catalog_count_query(&[]).sql(),
            "SELECT COUNT(*) FROM contents c"
        );
    }

    #[test]
    fn page_and_count_share_predicates() {
        let filter = filter();
        let clauses = FilterClause::from_filter(&filter);
        assert_eq!(clauses.len(), 4);

        let page = catalog_page_query(&clauses, &filter);
        let count = catalog_count_query(&clauses);
        let page_sql = page.sql();
        let count_sql = count.sql();

        let page_where = &page_sql[page_sql.find(" WHERE ").unwrap()..page_sql.find(" ORDER BY").unwrap()];
        let count_where = &count_sql[count_sql.find(" WHERE ").unwrap()..];
        assert_eq!(page_where, count_where);
        assert!(page_sql.contains("g.name ILIKE $2"));
        assert!(page_sql.ends_with("LIMIT $5 OFFSET $6"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("sci_fi%"), "%sci\\_fi\\%%");
    }

    #[test]
    fn clauses_evaluate_in_memory() {
        let genres = vec!["Drama".to_string(), "Mystery".to_string()];
        let countries = vec!["Japan".to_string()];
        let subject = ClauseSubject {
            kind: ContentKind::Series,
            release_date: NaiveDate::from_ymd_opt(2019, 4, 1),
            genres: &genres,
            countries: &countries,
        };
        for clause in FilterClause::from_filter(&filter()) {
            assert!(clause.matches(&subject), "{clause:?} should match");
        }
        assert!(!FilterClause::Country("japan".into()).matches(&subject));
        assert!(!FilterClause::Year(2020).matches(&subject));
    }
}
