use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{AssetCategory, AssetError, AssetStorage, asset_filename};

/// Where a materialized locator came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOrigin {
    /// Stored by this import.
    Fresh,
    /// The fetch failed or was unavailable; the previously stored locator
    /// is kept.
    Prior,
    /// Nothing usable.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedAsset {
    pub locator: Option<String>,
    pub origin: AssetOrigin,
    /// Set when a fetch was attempted and failed.
    pub error: Option<String>,
}

impl MaterializedAsset {
    /// A fresh locator that replaces something else. Its file must be
    /// discarded if the record never ends up pointing at it.
    pub fn staged_over(&self, prior: Option<&str>) -> Option<&str> {
        match (self.origin, self.locator.as_deref()) {
            (AssetOrigin::Fresh, Some(locator)) if Some(locator) != prior => Some(locator),
            _ => None,
        }
    }
}

/// Fetch-and-store with fallback to the prior locator.
#[derive(Clone)]
pub struct AssetLifecycle {
    storage: Arc<dyn AssetStorage>,
    timeout: Duration,
}

impl std::fmt::Debug for AssetLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLifecycle")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AssetLifecycle {
    pub fn new(storage: Arc<dyn AssetStorage>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    pub fn is_local(&self, locator: &str) -> bool {
        self.storage.is_local(locator)
    }

    /// Stores `remote` under a name derived from `key`. Falls back to
    /// `prior` when it is itself local, else to nothing. Never fails.
    pub async fn materialize(
        &self,
        category: AssetCategory,
        key: &str,
        remote: Option<&str>,
        prior: Option<&str>,
    ) -> MaterializedAsset {
        let Some(remote) = remote.map(str::trim).filter(|r| !r.is_empty()) else {
            return self.fallback(prior, None);
        };

        let filename = asset_filename(category, key, remote);
        let attempt = tokio::time::timeout(
            self.timeout,
            self.storage.store(remote, &filename, category),
        )
        .await;

        let error = match attempt {
            Ok(Ok(Some(locator))) if self.storage.is_local(&locator) => {
                debug!(%category, key, %locator, "materialized asset");
                return MaterializedAsset {
                    locator: Some(locator),
                    origin: AssetOrigin::Fresh,
                    error: None,
                };
            }
            Ok(Ok(Some(locator))) => AssetError::NotLocal(locator).to_string(),
            Ok(Ok(None)) => "storage returned no locator".to_string(),
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("asset fetch timed out after {:?}", self.timeout),
        };

        warn!(%category, key, remote, error = %error, "asset fetch failed, falling back");
        self.fallback(prior, Some(error))
    }

    fn fallback(&self, prior: Option<&str>, error: Option<String>) -> MaterializedAsset {
        match prior.filter(|p| self.storage.is_local(p)) {
            Some(prior) => MaterializedAsset {
                locator: Some(prior.to_string()),
                origin: AssetOrigin::Prior,
                error,
            },
            None => MaterializedAsset {
                locator: None,
                origin: AssetOrigin::Missing,
                error,
            },
        }
    }

    /// Prior local locators the committed record no longer references.
    pub fn superseded<'a>(
        &self,
        pairs: impl IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
    ) -> Vec<String> {
        pairs
            .into_iter()
            .filter_map(|(prior, committed)| {
                let prior = prior.filter(|p| self.storage.is_local(p))?;
                (Some(prior) != committed).then(|| prior.to_string())
            })
            .collect()
    }

    /// Best-effort delete; failures are logged and reported as zero.
    pub async fn remove(&self, locators: Vec<String>, reason: &str) -> usize {
        if locators.is_empty() {
            return 0;
        }
        match tokio::time::timeout(self.timeout, self.storage.delete(&locators)).await {
            Ok(Ok(removed)) => {
                debug!(removed, reason, "removed assets");
                removed
            }
            Ok(Err(AssetError::PartialDelete {
                removed,
                failed,
                first,
            })) => {
                warn!(removed, failed, reason, error = %first, "some assets were not removed");
                removed
            }
            Ok(Err(err)) => {
                warn!(?locators, reason, error = %err, "failed to remove assets");
                0
            }
            Err(_) => {
                warn!(?locators, reason, "asset removal timed out");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::storage::MockAssetStorage;

    fn local(locator: &str) -> bool {
        locator.starts_with("/uploads/")
    }

    fn lifecycle(mock: MockAssetStorage) -> AssetLifecycle {
        AssetLifecycle::new(Arc::new(mock), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn fresh_locator_is_used() {
        let mut mock = MockAssetStorage::new();
        mock.expect_is_local().returning(local);
        mock.expect_store()
            .withf(|remote, name, category| {
                remote.to_string() == "https://img/w500/a.png"
                    && name.to_string() == "poster-tt1.png"
                    && *category == AssetCategory::Posters
            })
            .times(1)
            .returning(|_, name, _| Ok(Some(format!("/uploads/posters/{name}"))));

        let asset = lifecycle(mock)
            .materialize(
                AssetCategory::Posters,
                "tt1",
                Some("https://img/w500/a.png"),
                None,
            )
            .await;

        assert_eq!(asset.origin, AssetOrigin::Fresh);
        assert_eq!(asset.locator.as_deref(), Some("/uploads/posters/poster-tt1.png"));
        assert_eq!(asset.error, None);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_prior_local_locator() {
        let mut mock = MockAssetStorage::new();
        mock.expect_is_local().returning(local);
        mock.expect_store().returning(|url, _, _| {
            Err(AssetError::Download {
                url: url.to_string(),
                reason: "status 500".into(),
            })
        });

        let asset = lifecycle(mock)
            .materialize(
                AssetCategory::Posters,
                "tt1",
                Some("https://img/a.jpg"),
                Some("/uploads/posters/poster-tt1.jpg"),
            )
            .await;

        assert_eq!(asset.origin, AssetOrigin::Prior);
        assert_eq!(asset.locator.as_deref(), Some("/uploads/posters/poster-tt1.jpg"));
        assert!(asset.error.is_some());
    }

    #[tokio::test]
    async fn remote_echo_is_not_accepted() {
        let mut mock = MockAssetStorage::new();
        mock.expect_is_local().returning(local);
        mock.expect_store()
            .returning(|url, _, _| Ok(Some(url.to_string())));

        let asset = lifecycle(mock)
            .materialize(
                AssetCategory::Backdrops,
                "tt1",
                Some("https://img/original/b.jpg"),
                Some("https://img/original/old.jpg"),
            )
            .await;

        assert_eq!(asset.origin, AssetOrigin::Missing);
        assert_eq!(asset.locator, None);
    }

    #[tokio::test]
    async fn missing_remote_skips_storage() {
        let mut mock = MockAssetStorage::new();
        mock.expect_is_local().returning(local);
        mock.expect_store().never();

        let asset = lifecycle(mock)
            .materialize(AssetCategory::Actors, "42", Some("  "), None)
            .await;

        assert_eq!(asset.origin, AssetOrigin::Missing);
        assert_eq!(asset.error, None);
    }

    #[test]
    fn superseded_only_lists_changed_local_priors() {
        let mut mock = MockAssetStorage::new();
        mock.expect_is_local().returning(local);
        let lifecycle = lifecycle(mock);

        let superseded = lifecycle.superseded([
            (Some("/uploads/posters/poster-a.jpg"), Some("/uploads/posters/poster-a.png")),
            (Some("/uploads/backdrops/backdrop-a.jpg"), Some("/uploads/backdrops/backdrop-a.jpg")),
            (Some("https://remote/x.jpg"), Some("/uploads/posters/poster-b.jpg")),
            (None, Some("/uploads/posters/poster-c.jpg")),
        ]);

        assert_eq!(superseded, vec!["/uploads/posters/poster-a.jpg".to_string()]);
    }

    #[test]
    fn staged_over_ignores_reused_locator() {
        let fresh = MaterializedAsset {
            locator: Some("/uploads/posters/poster-a.jpg".into()),
            origin: AssetOrigin::Fresh,
            error: None,
        };
        assert_eq!(fresh.staged_over(Some("/uploads/posters/poster-a.jpg")), None);
        assert_eq!(
            fresh.staged_over(None),
            Some("/uploads/posters/poster-a.jpg")
        );
    }

    #[tokio::test]
    async fn removal_failures_are_swallowed() {
        let mut mock = MockAssetStorage::new();
        mock.expect_delete()
            .returning(|_| Err(AssetError::Io(std::io::Error::other("disk gone"))));

        let removed = lifecycle(mock)
            .remove(vec!["/uploads/posters/poster-a.jpg".into()], "superseded")
            .await;
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn partial_removal_counts_what_was_deleted() {
        let mut mock = MockAssetStorage::new();
        mock.expect_delete().returning(|_| {
            Err(AssetError::PartialDelete {
                removed: 1,
                failed: 1,
                first: Box::new(AssetError::Io(std::io::Error::other("busy"))),
            })
        });

        let removed = lifecycle(mock)
            .remove(
                vec![
                    "/uploads/posters/poster-a.jpg".into(),
                    "/uploads/backdrops/backdrop-a.jpg".into(),
                ],
                "superseded",
            )
            .await;
        assert_eq!(removed, 1);
    }
}
