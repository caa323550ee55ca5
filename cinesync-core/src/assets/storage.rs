use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AssetCategory, AssetError};

pub const DEFAULT_PUBLIC_PREFIX: &str = "/uploads/";

/// The binary asset store the pipeline writes images into.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Fetch `remote` and store it as `filename` in `category`. Returns the
    /// locator of the stored copy, or `None` when nothing was stored.
    async fn store(
        &self,
        remote: &str,
        filename: &str,
        category: AssetCategory,
    ) -> Result<Option<String>, AssetError>;

    /// Remove stored assets. Locators outside the local namespace are
    /// ignored. Returns how many files were removed.
    async fn delete(&self, locators: &[String]) -> Result<usize, AssetError>;

    /// Whether `locator` names something inside the local namespace.
    fn is_local(&self, locator: &str) -> bool;
}

/// Filesystem-backed asset store. Files live at
/// `<root>/<category>/<filename>` and are addressed publicly as
/// `<public_prefix><category>/<filename>`.
#[derive(Clone, Debug)]
pub struct LocalAssetStorage {
    root: PathBuf,
    public_prefix: String,
    client: Client,
}

impl LocalAssetStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_public_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_matches('/');
        self.public_prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        };
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Result<Self, AssetError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssetError::Rejected(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    fn locator_for(&self, category: AssetCategory, filename: &str) -> String {
        format!("{}{}/{}", self.public_prefix, category.as_str(), filename)
    }

    fn validate_filename(filename: &str) -> Result<(), AssetError> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !filename.contains(['/', '\\']) => Ok(()),
            _ => Err(AssetError::Rejected(format!(
                "invalid asset filename: {filename:?}"
            ))),
        }
    }

    /// Maps a local locator back to its file, refusing anything that could
    /// escape the asset root.
    pub fn path_for_locator(&self, locator: &str) -> Result<PathBuf, AssetError> {
        let relative = locator
            .strip_prefix(&self.public_prefix)
            .ok_or_else(|| AssetError::NotLocal(locator.to_string()))?;
        let (dir, filename) = relative
            .split_once('/')
            .ok_or_else(|| AssetError::NotLocal(locator.to_string()))?;
        let category =
            AssetCategory::from_dir(dir).ok_or_else(|| AssetError::NotLocal(locator.to_string()))?;
        Self::validate_filename(filename)?;
        Ok(self.root.join(category.as_str()).join(filename))
    }

    /// Atomic write (tmp + rename) of an already downloaded asset.
    pub async fn write_bytes(
        &self,
        category: AssetCategory,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, AssetError> {
        Self::validate_filename(filename)?;

        let dir = self.root.join(category.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(filename);
        let tmp = dir.join(format!("{filename}.tmp-{}", Uuid::new_v4().simple()));

        let mut file = tokio::fs::File::create(&tmp).await?;
        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;
        drop(file);
        if let Err(err) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        Ok(self.locator_for(category, filename))
    }

    async fn download(&self, remote: &str) -> Result<Vec<u8>, AssetError> {
        let failed = |reason: String| AssetError::Download {
            url: remote.to_string(),
            reason,
        };

        let response = self
            .client
            .get(remote)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("status {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        if bytes.is_empty() {
            return Err(failed("empty body".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AssetStorage for LocalAssetStorage {
    async fn store(
        &self,
        remote: &str,
        filename: &str,
        category: AssetCategory,
    ) -> Result<Option<String>, AssetError> {
        if !(remote.starts_with("http://") || remote.starts_with("https://")) {
            return Err(AssetError::Rejected(format!(
                "remote reference is not an http(s) URL: {remote}"
            )));
        }
        Self::validate_filename(filename)?;

        let bytes = self.download(remote).await?;
        let locator = self.write_bytes(category, filename, &bytes).await?;
        debug!(%category, %locator, size = bytes.len(), "stored asset");
        Ok(Some(locator))
    }

    async fn delete(&self, locators: &[String]) -> Result<usize, AssetError> {
        let mut removed = 0;
        let mut failed = 0;
        let mut first_error = None;
        for locator in locators {
            let path = match self.path_for_locator(locator) {
                Ok(path) => path,
                Err(AssetError::NotLocal(_)) => {
                    debug!(%locator, "skipping deletion of non-local locator");
                    continue;
                }
                Err(err) => {
                    warn!(%locator, error = %err, "refusing to delete asset");
                    failed += 1;
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(%locator, error = %err, "failed to delete asset");
                    failed += 1;
                    first_error.get_or_insert(AssetError::Io(err));
                }
            }
        }

        match first_error {
            None => Ok(removed),
            Some(first) => Err(AssetError::PartialDelete {
                removed,
                failed,
                first: Box::new(first),
            }),
        }
    }

    fn is_local(&self, locator: &str) -> bool {
        self.path_for_locator(locator).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> LocalAssetStorage {
        LocalAssetStorage::new(dir.path())
    }

    #[tokio::test]
    async fn writes_land_under_category_directory() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let locator = storage
            .write_bytes(AssetCategory::Posters, "poster-tt1.jpg", b"img")
            .await
            .unwrap();

        assert_eq!(locator, "/uploads/posters/poster-tt1.jpg");
        let on_disk = std::fs::read(dir.path().join("posters/poster-tt1.jpg")).unwrap();
        assert_eq!(on_disk, b"img");
        assert!(storage.is_local(&locator));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("posters"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn rewrite_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        storage
            .write_bytes(AssetCategory::Actors, "actor-1.jpg", b"old")
            .await
            .unwrap();
        storage
            .write_bytes(AssetCategory::Actors, "actor-1.jpg", b"new")
            .await
            .unwrap();

        let on_disk = std::fs::read(dir.path().join("actors/actor-1.jpg")).unwrap();
        assert_eq!(on_disk, b"new");
    }

    #[tokio::test]
    async fn delete_skips_remote_and_missing_locators() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let locator = storage
            .write_bytes(AssetCategory::Backdrops, "backdrop-x.png", b"b")
            .await
            .unwrap();

        let removed = storage
            .delete(&[
                "https://image.tmdb.org/t/p/original/x.png".to_string(),
                "/uploads/backdrops/missing.png".to_string(),
                locator.clone(),
            ])
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(!dir.path().join("backdrops/backdrop-x.png").exists());
    }

    #[tokio::test]
    async fn delete_continues_past_a_failing_locator() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        std::fs::create_dir_all(dir.path().join("posters/poster-dir.jpg")).unwrap();
        let locator = storage
            .write_bytes(AssetCategory::Posters, "poster-ok.jpg", b"p")
            .await
            .unwrap();

        let err = storage
            .delete(&["/uploads/posters/poster-dir.jpg".to_string(), locator])
            .await
            .unwrap_err();

        match err {
            AssetError::PartialDelete {
                removed,
                failed,
                first,
            } => {
                assert_eq!((removed, failed), (1, 1));
                assert!(matches!(*first, AssetError::Io(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("posters/poster-ok.jpg").exists());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        assert!(!storage.is_local("/uploads/posters/../../etc/passwd"));
        assert!(!storage.is_local("/uploads/secrets/file.jpg"));
        assert!(!storage.is_local("https://image.tmdb.org/t/p/w500/a.jpg"));
        assert!(matches!(
            storage
                .write_bytes(AssetCategory::Posters, "../escape.jpg", b"x")
                .await,
            Err(AssetError::Rejected(_))
        ));
        assert!(matches!(
            storage
                .delete(&["/uploads/posters/..".to_string()])
                .await,
            Err(AssetError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn store_rejects_non_http_references() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let result = storage
            .store("file:///etc/passwd", "poster-x.jpg", AssetCategory::Posters)
            .await;
        assert!(matches!(result, Err(AssetError::Rejected(_))));
    }

    #[test]
    fn public_prefix_is_normalized() {
        let storage = LocalAssetStorage::new("/tmp").with_public_prefix("media");
        assert_eq!(storage.public_prefix(), "/media/");
        assert!(storage.is_local("/media/actors/actor-1.jpg"));
        assert!(!storage.is_local("/uploads/actors/actor-1.jpg"));
    }
}
