use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use cinesync_model::{
    AssetLocators, ContentDraft, ContentId, ContentKind, PROVIDER_EXTERNAL_PREFIX, StoredContent,
    provider_external_id, provider_id_from_external,
};

use super::PostgresCatalogStore;
use crate::database::classify::classify;
use crate::database::ports::{ContentRepository, TrailerBacklog};
use crate::error::{StoreError, StoreResult};

const CONTENT_COLUMNS: &str = "id, external_id, provider_id, kind, title, synopsis, release_date, \
     rating, duration, poster_url, backdrop_url, trailer_url, quality, total_seasons, country, \
     views, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProviderKeyRow {
    external_id: String,
    provider_id: Option<i64>,
}

impl ProviderKeyRow {
    fn provider_key(&self) -> Option<i64> {
        self.provider_id
            .or_else(|| provider_id_from_external(&self.external_id))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    id: i64,
    external_id: String,
    provider_id: Option<i64>,
    kind: String,
    title: String,
    synopsis: Option<String>,
    release_date: Option<NaiveDate>,
    rating: Option<f64>,
    duration: Option<String>,
    poster_url: Option<String>,
    backdrop_url: Option<String>,
    trailer_url: Option<String>,
    quality: String,
    total_seasons: Option<i32>,
    country: Option<String>,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentRow> for StoredContent {
    type Error = StoreError;

    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        let kind: ContentKind = row
            .kind
            .parse()
            .map_err(|e| StoreError::other(format!("corrupt content row {}: {e}", row.id)))?;

        Ok(StoredContent {
            id: ContentId(row.id),
            external_id: row.external_id,
            provider_id: row.provider_id,
            kind,
            title: row.title,
            synopsis: row.synopsis,
            release_date: row.release_date,
            rating: row.rating,
            duration: row.duration,
            assets: AssetLocators {
                poster: row.poster_url,
                backdrop: row.backdrop_url,
            },
            trailer_url: row.trailer_url,
            quality: row.quality,
            total_seasons: row.total_seasons,
            country_summary: row.country,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ContentRepository for PostgresCatalogStore {
    async fn find_content_by_external_id(
        &self,
        external_id: &str,
    ) -> StoreResult<Option<StoredContent>> {
        let row = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, external_id, provider_id, kind, title, synopsis, release_date,
                   rating, duration, poster_url, backdrop_url, trailer_url, quality,
                   total_seasons, country, views, created_at, updated_at
            FROM contents
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "look up content"))?;

        row.map(StoredContent::try_from).transpose()
    }

    async fn insert_content(&self, draft: &ContentDraft) -> StoreResult<ContentId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO contents (
                external_id, provider_id, kind, title, synopsis, release_date, rating,
                duration, poster_url, backdrop_url, trailer_url, quality, total_seasons,
                country, views
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 0)
            RETURNING id
            "#,
        )
        .bind(&draft.external_id)
        .bind(draft.provider_id)
        .bind(draft.kind.as_str())
        .bind(&draft.title)
        .bind(&draft.synopsis)
        .bind(draft.release_date)
        .bind(draft.rating)
        .bind(&draft.duration)
        .bind(&draft.assets.poster)
        .bind(&draft.assets.backdrop)
        .bind(&draft.trailer_url)
        .bind(&draft.quality)
        .bind(draft.total_seasons)
        .bind(&draft.country_summary)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "insert content"))?;

        Ok(ContentId(id))
    }

    async fn update_content(&self, id: ContentId, draft: &ContentDraft) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE contents SET
                external_id = $2,
                provider_id = $3,
                kind = $4,
                title = $5,
                synopsis = $6,
                release_date = $7,
                rating = $8,
                duration = $9,
                poster_url = $10,
                backdrop_url = $11,
                trailer_url = $12,
                quality = $13,
                total_seasons = $14,
                country = $15,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&draft.external_id)
        .bind(draft.provider_id)
        .bind(draft.kind.as_str())
        .bind(&draft.title)
        .bind(&draft.synopsis)
        .bind(draft.release_date)
        .bind(draft.rating)
        .bind(&draft.duration)
        .bind(&draft.assets.poster)
        .bind(&draft.assets.backdrop)
        .bind(&draft.trailer_url)
        .bind(&draft.quality)
        .bind(draft.total_seasons)
        .bind(&draft.country_summary)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "update content"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("content {id}")));
        }
        Ok(())
    }

    async fn update_asset_locators(
        &self,
        id: ContentId,
        assets: &AssetLocators,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE contents SET poster_url = $2, backdrop_url = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&assets.poster)
        .bind(&assets.backdrop)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "update asset locators"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("content {id}")));
        }
        Ok(())
    }

    async fn imported_provider_ids(&self, kind: ContentKind) -> StoreResult<Vec<i64>> {
        let rows = sqlx::query_as::<_, ProviderKeyRow>(
            r#"
            SELECT external_id, provider_id
            FROM contents
            WHERE kind = $1
              AND (provider_id IS NOT NULL OR external_id LIKE $2)
            ORDER BY id DESC
            "#,
        )
        .bind(kind.as_str())
        .bind(format!("{PROVIDER_EXTERNAL_PREFIX}%"))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, "list imported provider ids"))?;

        Ok(rows.iter().filter_map(ProviderKeyRow::provider_key).collect())
    }

    async fn find_imported_provider_ids(
        &self,
        kind: ContentKind,
        provider_ids: &[i64],
    ) -> StoreResult<Vec<i64>> {
        if provider_ids.is_empty() {
            return Ok(Vec::new());
        }
        let external_ids: Vec<String> = provider_ids
            .iter()
            .map(|id| provider_external_id(*id))
            .collect();

        let rows = sqlx::query_as::<_, ProviderKeyRow>(
            r#"
            SELECT external_id, provider_id
            FROM contents
            WHERE kind = $1
              AND (provider_id = ANY($2) OR external_id = ANY($3))
            "#,
        )
        .bind(kind.as_str())
        .bind(provider_ids)
        .bind(&external_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, "check imported provider ids"))?;

        Ok(rows
            .iter()
            .filter_map(ProviderKeyRow::provider_key)
            .filter(|id| provider_ids.contains(id))
            .collect())
    }

    async fn contents_missing_trailer(
        &self,
        kind: Option<ContentKind>,
        limit: u32,
    ) -> StoreResult<TrailerBacklog> {
        let kind = kind.map(ContentKind::as_str);
        let predicate = r#"
            (provider_id IS NOT NULL OR external_id LIKE $1)
            AND COALESCE(TRIM(trailer_url), '') = ''
            AND ($2::TEXT IS NULL OR kind = $2)
        "#;
        let prefix = format!("{PROVIDER_EXTERNAL_PREFIX}%");

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM contents WHERE {predicate}"))
                .bind(&prefix)
                .bind(kind)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| classify(e, "count missing trailers"))?;

        let rows = sqlx::query_as::<_, ContentRow>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM contents WHERE {predicate} ORDER BY id LIMIT $3"
        ))
        .bind(&prefix)
        .bind(kind)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, "list missing trailers"))?;

        Ok(TrailerBacklog {
            items: rows
                .into_iter()
                .map(StoredContent::try_from)
                .collect::<StoreResult<_>>()?,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn update_trailer(&self, id: ContentId, trailer_url: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE contents SET trailer_url = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(trailer_url)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "update trailer"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("content {id}")));
        }
        Ok(())
    }
}
