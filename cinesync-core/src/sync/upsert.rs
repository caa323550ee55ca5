use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use cinesync_model::{AssetLocators, ContentDraft, ContentId, StoredContent};

use super::summary::UpsertKind;
use super::within;
use crate::database::CatalogStore;
use crate::error::{StoreError, StoreResult};

/// Which branch the upsert took. The orchestrator branches on this to
/// decide whether relationship cleanup is needed.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created { id: ContentId },
    Updated { id: ContentId, prior: Box<StoredContent> },
}

impl UpsertOutcome {
    pub fn id(&self) -> ContentId {
        match self {
            UpsertOutcome::Created { id } | UpsertOutcome::Updated { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> UpsertKind {
        match self {
            UpsertOutcome::Created { .. } => UpsertKind::Created,
            UpsertOutcome::Updated { .. } => UpsertKind::Updated,
        }
    }

    /// The row as it was before this import touched it.
    pub fn prior(&self) -> Option<&StoredContent> {
        match self {
            UpsertOutcome::Created { .. } => None,
            UpsertOutcome::Updated { prior, .. } => Some(prior),
        }
    }

    /// Asset locators the stored row holds right after the upsert.
    pub fn stored_assets(&self) -> AssetLocators {
        self.prior()
            .map(|prior| prior.assets.clone())
            .unwrap_or_default()
    }
}

/// Incoming locators win when non-empty; otherwise the stored ones stay.
pub fn merge_assets(incoming: &AssetLocators, existing: &AssetLocators) -> AssetLocators {
    fn pick(incoming: &Option<String>, existing: &Option<String>) -> Option<String> {
        match incoming.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(value.to_string()),
            _ => existing.clone(),
        }
    }
    AssetLocators {
        poster: pick(&incoming.poster, &existing.poster),
        backdrop: pick(&incoming.backdrop, &existing.backdrop),
    }
}

/// Sole writer of content rows, keyed by external id.
#[derive(Debug, Clone)]
pub struct ContentUpsertEngine {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl ContentUpsertEngine {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn upsert(&self, draft: &ContentDraft) -> StoreResult<UpsertOutcome> {
        let existing = within(
            self.timeout,
            "find content",
            self.store.find_content_by_external_id(&draft.external_id),
        )
        .await?;

        if let Some(prior) = existing {
            return self.update_existing(prior, draft).await;
        }

        match within(self.timeout, "insert content", self.store.insert_content(draft)).await {
            Ok(id) => {
                debug!(external_id = %draft.external_id, id = %id, "inserted content");
                Ok(UpsertOutcome::Created { id })
            }
            // Another writer created the row between lookup and insert.
            Err(StoreError::ConflictBenign { constraint }) => {
                warn!(
                    external_id = %draft.external_id,
                    %constraint,
                    "content appeared concurrently, updating instead"
                );
                let prior = within(
                    self.timeout,
                    "find content",
                    self.store.find_content_by_external_id(&draft.external_id),
                )
                .await?
                .ok_or_else(|| StoreError::NotFound(draft.external_id.clone()))?;
                self.update_existing(prior, draft).await
            }
            Err(err) => Err(err),
        }
    }

    async fn update_existing(
        &self,
        prior: StoredContent,
        draft: &ContentDraft,
    ) -> StoreResult<UpsertOutcome> {
        let mut merged = draft.clone();
        merged.assets = merge_assets(&draft.assets, &prior.assets);

        within(
            self.timeout,
            "update content",
            self.store.update_content(prior.id, &merged),
        )
        .await?;

        debug!(external_id = %draft.external_id, id = %prior.id, "updated content");
        Ok(UpsertOutcome::Updated {
            id: prior.id,
            prior: Box::new(prior),
        })
    }

    pub async fn commit_assets(&self, id: ContentId, assets: &AssetLocators) -> StoreResult<()> {
        within(
            self.timeout,
            "update asset locators",
            self.store.update_asset_locators(id, assets),
        )
        .await
    }
}
