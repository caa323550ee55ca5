use async_trait::async_trait;
use chrono::NaiveDate;

use cinesync_model::{CatalogFilter, CatalogItem, CatalogPage, ContentId, ContentKind};

use super::PostgresCatalogStore;
use crate::database::classify::classify;
use crate::database::filters::{FilterClause, catalog_count_query, catalog_page_query};
use crate::database::ports::CatalogReader;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    id: i64,
    external_id: String,
    kind: String,
    title: String,
    release_date: Option<NaiveDate>,
    rating: Option<f64>,
    poster_url: Option<String>,
    quality: String,
    views: i64,
}

impl TryFrom<CatalogRow> for CatalogItem {
    type Error = StoreError;

    fn try_from(row: CatalogRow) -> Result<Self, Self::Error> {
        let kind: ContentKind = row
            .kind
            .parse()
            .map_err(|e| StoreError::other(format!("corrupt content row {}: {e}", row.id)))?;
        Ok(CatalogItem {
            id: ContentId(row.id),
            external_id: row.external_id,
            kind,
            title: row.title,
            release_date: row.release_date,
            rating: row.rating,
            poster: row.poster_url,
            quality: row.quality,
            views: row.views,
        })
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalogStore {
    async fn list_catalog(&self, filter: &CatalogFilter) -> StoreResult<CatalogPage> {
        let clauses = FilterClause::from_filter(filter);

        let mut page_query = catalog_page_query(&clauses, filter);
        let rows: Vec<CatalogRow> = page_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, "list catalog"))?;

        let mut count_query = catalog_count_query(&clauses);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "count catalog"))?;

        let items = rows
            .into_iter()
            .map(CatalogItem::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(CatalogPage::new(
            items,
            u64::try_from(total).unwrap_or_default(),
            filter,
        ))
    }
}
