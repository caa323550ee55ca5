use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use cinesync_model::{CategoryLinks, ContentId, DimensionKind, LinkItem};

use super::healer::insert_with_healing;
use super::resolver::DimensionResolver;
use super::summary::{LinkTally, PartialFailure};
use super::within;
use crate::database::{CatalogStore, LinkInsert};
use crate::error::StoreResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub tally: LinkTally,
    pub failures: Vec<PartialFailure>,
}

/// Sole writer of link rows. Each item is resolved and linked on its own;
/// one bad item never stops the rest of the category.
#[derive(Debug, Clone)]
pub struct RelationshipSynchronizer {
    store: Arc<dyn CatalogStore>,
    resolver: DimensionResolver,
    timeout: Duration,
}

impl RelationshipSynchronizer {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self {
            resolver: DimensionResolver::new(Arc::clone(&store), timeout),
            store,
            timeout,
        }
    }

    /// Drops every link of `content_id` in all categories. Run once on
    /// reimport, before any category is relinked.
    pub async fn purge(&self, content_id: ContentId) -> StoreResult<u64> {
        let removed = within(
            self.timeout,
            "delete links",
            self.store.delete_all_links(content_id),
        )
        .await?;
        debug!(content_id = %content_id, removed, "cleared relationship links");
        Ok(removed)
    }

    pub async fn resync(&self, content_id: ContentId, links: &CategoryLinks) -> CategoryOutcome {
        let kind = links.kind;
        let mut outcome = CategoryOutcome::default();

        for item in &links.items {
            let Some(name) = item.resolvable_name() else {
                debug!(%kind, content_id = %content_id, "skipping blank item");
                outcome.tally.skipped += 1;
                continue;
            };

            match self.link_one(kind, content_id, name, item).await {
                Ok(healed) => {
                    match healed.outcome {
                        LinkInsert::Inserted => outcome.tally.linked += 1,
                        LinkInsert::AlreadyPresent => outcome.tally.already_present += 1,
                    }
                    if healed.healed {
                        outcome.tally.healed += 1;
                    }
                }
                Err(err) => {
                    warn!(
                        %kind,
                        content_id = %content_id,
                        item = name,
                        error = %err,
                        "failed to link item"
                    );
                    outcome.tally.failed += 1;
                    outcome
                        .failures
                        .push(PartialFailure::new(kind.into(), name, err));
                }
            }
        }

        debug!(
            %kind,
            content_id = %content_id,
            linked = outcome.tally.linked,
            failed = outcome.tally.failed,
            "resynced category"
        );
        outcome
    }

    async fn link_one(
        &self,
        kind: DimensionKind,
        content_id: ContentId,
        name: &str,
        item: &LinkItem,
    ) -> StoreResult<super::HealedInsert> {
        let dimension_id = match kind {
            DimensionKind::Actor => {
                self.resolver
                    .resolve_actor(name, item.photo.as_deref())
                    .await?
            }
            _ => {
                self.resolver
                    .resolve(kind, name, item.slug.as_deref())
                    .await?
            }
        };

        let role = match kind {
            DimensionKind::Actor => item.role.as_deref(),
            _ => None,
        };

        insert_with_healing(
            self.store.as_ref(),
            kind,
            content_id,
            dimension_id,
            role,
            self.timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryCatalogStore;

    fn synchronizer(store: &InMemoryCatalogStore) -> RelationshipSynchronizer {
        RelationshipSynchronizer::new(Arc::new(store.clone()), Duration::from_secs(5))
    }

    fn genres(names: &[&str]) -> CategoryLinks {
        CategoryLinks::new(
            DimensionKind::Genre,
            names.iter().map(|n| LinkItem::named(*n)).collect(),
        )
    }

    #[tokio::test]
    async fn empty_category_links_nothing() {
        let store = InMemoryCatalogStore::new();
        let outcome = synchronizer(&store)
            .resync(ContentId(1), &CategoryLinks::new(DimensionKind::Country, vec![]))
            .await;

        assert_eq!(outcome, CategoryOutcome::default());
    }

    #[tokio::test]
    async fn blank_items_are_skipped() {
        let store = InMemoryCatalogStore::new();
        let outcome = synchronizer(&store)
            .resync(ContentId(1), &genres(&["Action", "  ", "Drama"]))
            .await;

        assert_eq!(outcome.tally.linked, 2);
        assert_eq!(outcome.tally.skipped, 1);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn a_failing_item_does_not_stop_the_batch() {
        let store = InMemoryCatalogStore::new();
        store.fail_dimension(DimensionKind::Genre, "Crime").await;
        store.fail_link(DimensionKind::Genre, "Drama").await;

        let outcome = synchronizer(&store)
            .resync(ContentId(1), &genres(&["Action", "Crime", "Drama", "Thriller"]))
            .await;

        assert_eq!(outcome.tally.linked, 2);
        assert_eq!(outcome.tally.failed, 2);
        let failed: Vec<_> = outcome.failures.iter().map(|f| f.item.as_str()).collect();
        assert_eq!(failed, vec!["Crime", "Drama"]);
        assert_eq!(store.link_count(DimensionKind::Genre, ContentId(1)).await, 2);
    }

    #[tokio::test]
    async fn duplicate_items_link_once() {
        let store = InMemoryCatalogStore::new();
        let outcome = synchronizer(&store)
            .resync(ContentId(1), &genres(&["Action", "Action"]))
            .await;

        assert_eq!(outcome.tally.linked, 1);
        assert_eq!(outcome.tally.already_present, 1);
        assert_eq!(store.link_count(DimensionKind::Genre, ContentId(1)).await, 1);
    }

    #[tokio::test]
    async fn actor_links_carry_character() {
        let store = InMemoryCatalogStore::new();
        let cast = CategoryLinks::new(
            DimensionKind::Actor,
            vec![LinkItem::actor("Keanu Reeves", None, Some("Neo".into()))],
        );

        synchronizer(&store).resync(ContentId(3), &cast).await;

        assert_eq!(
            store.actor_role(ContentId(3), "Keanu Reeves").await.as_deref(),
            Some("Neo")
        );
    }
}
