use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use cinesync_model::{ContentId, ContentKind, StoredContent};

use super::within;
use crate::database::CatalogStore;
use crate::error::StoreResult;
use crate::providers::{MetadataProvider, ProviderError, ProviderRef};

/// Records refreshed per run when the caller names no limit.
pub const DEFAULT_TRAILER_BATCH: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailerStatus {
    Updated,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailerOutcome {
    pub id: ContentId,
    pub title: String,
    pub status: TrailerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerReport {
    /// Records looked at in this run.
    pub total: usize,
    /// Backlog left after this run, skipped records included.
    pub total_remaining: u64,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub details: Vec<TrailerOutcome>,
}

impl TrailerReport {
    fn record(&mut self, outcome: TrailerOutcome) {
        match outcome.status {
            TrailerStatus::Updated => self.updated += 1,
            TrailerStatus::Skipped => self.skipped += 1,
            TrailerStatus::Failed => self.failed += 1,
        }
        self.details.push(outcome);
    }
}

/// Backfills trailers for imported records that have none, one record at a
/// time. A failure on one record never stops the run.
#[derive(Clone)]
pub struct TrailerRefresher {
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn CatalogStore>,
    provider_timeout: Duration,
    store_timeout: Duration,
    pause: Duration,
}

impl std::fmt::Debug for TrailerRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrailerRefresher")
            .field("provider_timeout", &self.provider_timeout)
            .field("store_timeout", &self.store_timeout)
            .field("pause", &self.pause)
            .finish_non_exhaustive()
    }
}

impl TrailerRefresher {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        store: Arc<dyn CatalogStore>,
        provider_timeout: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            provider_timeout,
            store_timeout,
            pause: Duration::from_millis(200),
        }
    }

    /// Delay after each successful update, keeping the provider under its
    /// rate limit.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// `kind: None` covers movies and series. Only reading the backlog can
    /// fail the run.
    pub async fn run(&self, kind: Option<ContentKind>, limit: u32) -> StoreResult<TrailerReport> {
        let backlog = within(
            self.store_timeout,
            "contents_missing_trailer",
            self.store.contents_missing_trailer(kind, limit),
        )
        .await?;

        info!(
            kind = kind.map(|k| k.as_str()).unwrap_or("all"),
            backlog = backlog.total,
            processing = backlog.items.len(),
            "refreshing trailers"
        );

        let mut report = TrailerReport {
            total: backlog.items.len(),
            total_remaining: backlog.total.saturating_sub(backlog.items.len() as u64),
            ..TrailerReport::default()
        };

        for content in &backlog.items {
            let outcome = self.refresh_one(content).await;
            let updated = outcome.status == TrailerStatus::Updated;
            report.record(outcome);
            if updated && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        info!(
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            remaining = report.total_remaining,
            "trailer refresh finished"
        );
        Ok(report)
    }

    async fn refresh_one(&self, content: &StoredContent) -> TrailerOutcome {
        let outcome = |status, trailer_url, reason| TrailerOutcome {
            id: content.id,
            title: content.title.clone(),
            status,
            trailer_url,
            reason,
        };

        let Some(provider_id) = content.provider_key() else {
            return outcome(
                TrailerStatus::Skipped,
                None,
                Some("no provider id".to_string()),
            );
        };
        let reference = ProviderRef::new(content.kind, provider_id);

        let fetched = tokio::time::timeout(
            self.provider_timeout,
            self.provider.fetch_trailer(&reference),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout));

        let trailer_url = match fetched {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!(reference = %reference, "no suitable video upstream");
                return outcome(
                    TrailerStatus::Skipped,
                    None,
                    Some("no suitable video available".to_string()),
                );
            }
            Err(err) => {
                warn!(reference = %reference, error = %err, "video lookup failed");
                return outcome(TrailerStatus::Failed, None, Some(err.to_string()));
            }
        };

        let written = within(
            self.store_timeout,
            "update_trailer",
            self.store.update_trailer(content.id, &trailer_url),
        )
        .await;

        match written {
            Ok(()) => {
                debug!(content_id = %content.id, trailer = %trailer_url, "trailer updated");
                outcome(TrailerStatus::Updated, Some(trailer_url), None)
            }
            Err(err) => {
                warn!(content_id = %content.id, error = %err, "trailer write failed");
                outcome(TrailerStatus::Failed, None, Some(err.to_string()))
            }
        }
    }
}
