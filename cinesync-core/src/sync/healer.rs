//! Bounded repair of join-table surrogate key sequences.
//!
//! A link insert can fail because the join table's id sequence lags behind
//! `max(id)`. That failure is tagged [`StoreError::ConflictSurrogateKey`] by
//! the store adapter. The healer reseeds the sequence and retries the insert
//! exactly once; a second failure is final.

use std::time::Duration;

use tracing::{info, warn};

use cinesync_model::{ContentId, DimensionId, DimensionKind};

use super::within;
use crate::database::{LinkInsert, LinkRepository};
use crate::error::{StoreError, StoreResult};

/// What to do with the result of insert attempt number `attempt` (0-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealStep {
    Linked(LinkInsert),
    ReseedAndRetry,
    Failed(StoreError),
}

pub fn decide(attempt: u8, result: StoreResult<LinkInsert>) -> HealStep {
    match result {
        Ok(outcome) => HealStep::Linked(outcome),
        Err(StoreError::ConflictBenign { .. }) => HealStep::Linked(LinkInsert::AlreadyPresent),
        Err(StoreError::ConflictSurrogateKey { .. }) if attempt == 0 => HealStep::ReseedAndRetry,
        Err(err) => HealStep::Failed(err),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealedInsert {
    pub outcome: LinkInsert,
    /// The insert only succeeded after a reseed.
    pub healed: bool,
}

pub async fn insert_with_healing<L: LinkRepository + ?Sized>(
    links: &L,
    kind: DimensionKind,
    content_id: ContentId,
    dimension_id: DimensionId,
    role: Option<&str>,
    timeout: Duration,
) -> StoreResult<HealedInsert> {
    let mut attempt = 0u8;
    loop {
        let result = within(
            timeout,
            "insert link",
            links.insert_link(kind, content_id, dimension_id, role),
        )
        .await;

        match decide(attempt, result) {
            HealStep::Linked(outcome) => {
                return Ok(HealedInsert {
                    outcome,
                    healed: attempt > 0,
                });
            }
            HealStep::ReseedAndRetry => {
                warn!(
                    %kind,
                    content_id = %content_id,
                    dimension_id = %dimension_id,
                    "link sequence out of sync, reseeding"
                );
                within(timeout, "reseed link sequence", links.reseed_link_sequence(kind)).await?;
                info!(table = kind.link_table(), "reseeded link sequence");
                attempt += 1;
            }
            HealStep::Failed(err) => return Err(err),
        }
    }
}
