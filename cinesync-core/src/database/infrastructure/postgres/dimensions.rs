use async_trait::async_trait;

use cinesync_model::{DimensionId, DimensionKind};

use super::PostgresCatalogStore;
use crate::database::classify::classify;
use crate::database::ports::{DimensionRepository, DimensionRow};
use crate::error::StoreResult;

#[derive(Debug, sqlx::FromRow)]
struct Row {
    id: i64,
    name: String,
    photo_url: Option<String>,
}

#[async_trait]
impl DimensionRepository for PostgresCatalogStore {
    async fn find_dimension(
        &self,
        kind: DimensionKind,
        name: &str,
    ) -> StoreResult<Option<DimensionRow>> {
        let sql = match kind {
            DimensionKind::Actor => "SELECT id, name, photo_url FROM actors WHERE name = $1".to_string(),
            other => format!(
                "SELECT id, name, NULL::TEXT AS photo_url FROM {} WHERE name = $1",
                other.table()
            ),
        };

        let row = sqlx::query_as::<_, Row>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, &format!("look up {kind}")))?;

        Ok(row.map(|r| DimensionRow {
            id: DimensionId(r.id),
            name: r.name,
            photo: r.photo_url,
        }))
    }

    async fn upsert_dimension(
        &self,
        kind: DimensionKind,
        name: &str,
        slug: Option<&str>,
    ) -> StoreResult<DimensionId> {
        let id: i64 = match kind {
            DimensionKind::Tag => {
                let slug = slug
                    .map(str::to_string)
                    .unwrap_or_else(|| cinesync_model::slugify(name));
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO tags (name, slug) VALUES ($1, $2)
                    ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                    RETURNING id
                    "#,
                )
                .bind(name)
                .bind(slug)
                .fetch_one(&self.pool)
                .await
            }
            DimensionKind::Actor => {
                return self.upsert_actor(name, None).await;
            }
            other => {
                let sql = format!(
                    "INSERT INTO {table} (name) VALUES ($1) \
                     ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
                     RETURNING id",
                    table = other.table()
                );
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| classify(e, &format!("upsert {kind}")))?;

        Ok(DimensionId(id))
    }

    async fn upsert_actor(&self, name: &str, photo: Option<&str>) -> StoreResult<DimensionId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO actors (name, photo_url) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET
                photo_url = COALESCE(NULLIF(actors.photo_url, ''), EXCLUDED.photo_url)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(photo)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "upsert actor"))?;

        Ok(DimensionId(id))
    }

    async fn backfill_actor_photo(&self, id: DimensionId, photo: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE actors SET photo_url = $2 WHERE id = $1 AND (photo_url IS NULL OR photo_url = '')",
        )
        .bind(id)
        .bind(photo)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "backfill actor photo"))?;

        Ok(result.rows_affected() > 0)
    }
}
