use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use cinesync_model::{DimensionId, DimensionKind};

use super::within;
use crate::database::CatalogStore;
use crate::error::{StoreError, StoreResult};

/// Name to id for genre, country, tag and actor rows, creating them on
/// first sight. The only writer of dimension rows.
#[derive(Debug, Clone)]
pub struct DimensionResolver {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl DimensionResolver {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn resolve(
        &self,
        kind: DimensionKind,
        name: &str,
        slug: Option<&str>,
    ) -> StoreResult<DimensionId> {
        if kind == DimensionKind::Actor {
            return self.resolve_actor(name, None).await;
        }
        let name = non_blank(kind, name)?;

        if let Some(row) = within(
            self.timeout,
            "find dimension",
            self.store.find_dimension(kind, name),
        )
        .await?
        {
            return Ok(row.id);
        }

        let id = within(
            self.timeout,
            "upsert dimension",
            self.store.upsert_dimension(kind, name, slug),
        )
        .await?;
        debug!(%kind, name, id = %id, "created dimension");
        Ok(id)
    }

    /// Like [`DimensionResolver::resolve`]; a supplied photo fills an empty
    /// stored one but never replaces it.
    pub async fn resolve_actor(&self, name: &str, photo: Option<&str>) -> StoreResult<DimensionId> {
        let name = non_blank(DimensionKind::Actor, name)?;
        let photo = photo.map(str::trim).filter(|p| !p.is_empty());

        let existing = within(
            self.timeout,
            "find actor",
            self.store.find_dimension(DimensionKind::Actor, name),
        )
        .await?;

        let Some(row) = existing else {
            return within(
                self.timeout,
                "upsert actor",
                self.store.upsert_actor(name, photo),
            )
            .await;
        };

        let stored_empty = row.photo.as_deref().is_none_or(|p| p.trim().is_empty());
        if let (Some(photo), true) = (photo, stored_empty) {
            match within(
                self.timeout,
                "backfill actor photo",
                self.store.backfill_actor_photo(row.id, photo),
            )
            .await
            {
                Ok(updated) => debug!(name, updated, "backfilled actor photo"),
                Err(err) => warn!(name, error = %err, "failed to backfill actor photo"),
            }
        }
        Ok(row.id)
    }
}

fn non_blank(kind: DimensionKind, name: &str) -> StoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::other(format!("blank {kind} name")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryCatalogStore;

    fn resolver(store: &InMemoryCatalogStore) -> DimensionResolver {
        DimensionResolver::new(Arc::new(store.clone()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn resolving_twice_yields_one_row() {
        let store = InMemoryCatalogStore::new();
        let resolver = resolver(&store);

        let first = resolver.resolve(DimensionKind::Genre, "Drama", None).await.unwrap();
        let second = resolver.resolve(DimensionKind::Genre, "Drama", None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.dimension_count(DimensionKind::Genre).await, 1);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = InMemoryCatalogStore::new();
        let resolver = resolver(&store);

        let upper = resolver.resolve(DimensionKind::Genre, "Drama", None).await.unwrap();
        let lower = resolver.resolve(DimensionKind::Genre, "drama", None).await.unwrap();

        assert_ne!(upper, lower);
    }

    #[tokio::test]
    async fn actor_photo_is_backfilled_but_never_replaced() {
        let store = InMemoryCatalogStore::new();
        let resolver = resolver(&store);

        let id = resolver.resolve_actor("Keanu Reeves", None).await.unwrap();
        assert_eq!(store.actor_photo("Keanu Reeves").await, None);

        let again = resolver
            .resolve_actor("Keanu Reeves", Some("/uploads/actors/actor-6384.jpg"))
            .await
            .unwrap();
        assert_eq!(id, again);
        assert_eq!(
            store.actor_photo("Keanu Reeves").await.as_deref(),
            Some("/uploads/actors/actor-6384.jpg")
        );

        resolver
            .resolve_actor("Keanu Reeves", Some("/uploads/actors/other.jpg"))
            .await
            .unwrap();
        assert_eq!(
            store.actor_photo("Keanu Reeves").await.as_deref(),
            Some("/uploads/actors/actor-6384.jpg")
        );
    }

    #[tokio::test]
    async fn blank_names_are_refused() {
        let store = InMemoryCatalogStore::new();
        let err = resolver(&store)
            .resolve(DimensionKind::Country, "   ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
        assert_eq!(store.dimension_count(DimensionKind::Country).await, 0);
    }
}
