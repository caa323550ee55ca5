use async_trait::async_trait;
use tracing::debug;

use cinesync_model::{ContentId, DimensionId, DimensionKind};

use super::PostgresCatalogStore;
use crate::database::classify::classify;
use crate::database::ports::{LinkInsert, LinkRepository};
use crate::error::StoreResult;

#[async_trait]
impl LinkRepository for PostgresCatalogStore {
    async fn delete_all_links(&self, content_id: ContentId) -> StoreResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify(e, "begin link purge"))?;

        let mut removed = 0;
        for kind in DimensionKind::ALL {
            let sql = format!("DELETE FROM {} WHERE content_id = $1", kind.link_table());
            let result = sqlx::query(&sql)
                .bind(content_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(e, &format!("delete {kind} links")))?;
            removed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| classify(e, "commit link purge"))?;

        debug!(content_id = %content_id, removed, "purged relationship links");
        Ok(removed)
    }

    async fn insert_link(
        &self,
        kind: DimensionKind,
        content_id: ContentId,
        dimension_id: DimensionId,
        role: Option<&str>,
    ) -> StoreResult<LinkInsert> {
        let table = kind.link_table();
        let column = kind.link_column();

        let sql = match kind {
            DimensionKind::Actor => format!(
                "INSERT INTO {table} (content_id, {column}, character_name) VALUES ($1, $2, $3) \
                 ON CONFLICT (content_id, {column}) DO NOTHING"
            ),
            _ => format!(
                "INSERT INTO {table} (content_id, {column}) VALUES ($1, $2) \
                 ON CONFLICT (content_id, {column}) DO NOTHING"
            ),
        };

        let mut query = sqlx::query(&sql).bind(content_id).bind(dimension_id);
        if kind == DimensionKind::Actor {
            query = query.bind(role);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, &format!("link {kind}")))?;

        Ok(if result.rows_affected() == 0 {
            LinkInsert::AlreadyPresent
        } else {
            LinkInsert::Inserted
        })
    }

    async fn reseed_link_sequence(&self, kind: DimensionKind) -> StoreResult<()> {
        let table = kind.link_table();
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
             COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, &format!("reseed {table} sequence")))?;

        debug!(table, "reseeded surrogate key sequence");
        Ok(())
    }

    async fn linked_names(
        &self,
        kind: DimensionKind,
        content_id: ContentId,
    ) -> StoreResult<Vec<String>> {
        let sql = format!(
            "SELECT d.name FROM {link} l JOIN {dim} d ON d.id = l.{column} \
             WHERE l.content_id = $1 ORDER BY d.name",
            link = kind.link_table(),
            dim = kind.table(),
            column = kind.link_column(),
        );
        sqlx::query_scalar::<_, String>(&sql)
            .bind(content_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, &format!("list {kind} links")))
    }
}
