//! The import pipeline: upstream fetch, main-record upsert, asset
//! lifecycle, relationship resync and the season/episode hierarchy.

pub mod bulk;
pub mod gate;
pub mod healer;
pub mod importer;
pub mod relationships;
pub mod resolver;
pub mod seasons;
pub mod summary;
pub mod trailers;
pub mod upsert;

use std::future::Future;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};

pub use bulk::{BulkFailure, BulkImporter, BulkReport, BulkSettings};
pub use gate::{ImportGate, ImportPermit};
pub use healer::{HealStep, HealedInsert, insert_with_healing};
pub use importer::{HierarchyImporter, ImportRequest, ImportSettings};
pub use relationships::{CategoryOutcome, RelationshipSynchronizer};
pub use resolver::DimensionResolver;
pub use seasons::{SeasonImportOutcome, SeasonImporter};
pub use summary::{
    AssetReport, FailureScope, ImportPhase, ImportSummary, LinkTally, PartialFailure, UpsertKind,
};
pub use trailers::{
    DEFAULT_TRAILER_BATCH, TrailerOutcome, TrailerRefresher, TrailerReport, TrailerStatus,
};
pub use upsert::{ContentUpsertEngine, UpsertOutcome};

/// Bounds a store call. Elapsed deadlines surface as [`StoreError::Timeout`].
pub(crate) async fn within<T, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { operation }),
    }
}
