//! Image assets: deterministic naming, local storage and the
//! fetch/fallback/supersede lifecycle around it.

pub mod lifecycle;
pub mod naming;
pub mod storage;

use thiserror::Error;

pub use lifecycle::{AssetLifecycle, AssetOrigin, MaterializedAsset};
pub use naming::{AssetCategory, asset_filename, infer_extension, sanitize_key};
pub use storage::{AssetStorage, LocalAssetStorage};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("asset I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("locator {0} is outside the local asset namespace")]
    NotLocal(String),

    #[error("rejected asset request: {0}")]
    Rejected(String),

    /// Some deletions failed; `removed` files were still deleted.
    #[error("{failed} asset(s) could not be deleted, {removed} removed: {first}")]
    PartialDelete {
        removed: usize,
        failed: usize,
        #[source]
        first: Box<AssetError>,
    },
}
