use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use cinesync_model::{ContentId, ContentKind, DimensionKind};

/// Importer state. `Aborted` is reachable only before the main record has
/// been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Fetching,
    UpsertingMain,
    SyncingAssets,
    SyncingRelationships,
    ImportingSeasons,
    Done,
    Aborted,
}

impl ImportPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportPhase::Done | ImportPhase::Aborted)
    }

    pub fn can_advance_to(self, next: ImportPhase) -> bool {
        use ImportPhase::*;
        matches!(
            (self, next),
            (Fetching, UpsertingMain)
                | (Fetching, Aborted)
                | (UpsertingMain, SyncingAssets)
                | (UpsertingMain, Aborted)
                | (SyncingAssets, SyncingRelationships)
                | (SyncingRelationships, ImportingSeasons)
                | (SyncingRelationships, Done)
                | (ImportingSeasons, Done)
        )
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportPhase::Fetching => "fetching",
            ImportPhase::UpsertingMain => "upserting_main",
            ImportPhase::SyncingAssets => "syncing_assets",
            ImportPhase::SyncingRelationships => "syncing_relationships",
            ImportPhase::ImportingSeasons => "importing_seasons",
            ImportPhase::Done => "done",
            ImportPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub(crate) struct PhaseTracker {
    reference: String,
    phase: ImportPhase,
}

impl PhaseTracker {
    pub(crate) fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            phase: ImportPhase::Fetching,
        }
    }

    pub(crate) fn advance(&mut self, next: ImportPhase) {
        if !self.phase.can_advance_to(next) {
            warn!(
                target: "cinesync::import",
                reference = %self.reference,
                from = %self.phase,
                to = %next,
                "unexpected import phase transition"
            );
            debug_assert!(false, "illegal transition {} -> {}", self.phase, next);
        }
        debug!(
            target: "cinesync::import",
            reference = %self.reference,
            from = %self.phase,
            to = %next,
            "import phase"
        );
        self.phase = next;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertKind {
    Created,
    Updated,
}

/// Per-category link counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LinkTally {
    pub linked: usize,
    /// Inserts that found the pair already linked.
    pub already_present: usize,
    pub failed: usize,
    /// Blank names.
    pub skipped: usize,
    /// Links that only went through after a sequence reseed.
    pub healed: usize,
}

impl LinkTally {
    /// Links the content holds in this category after the resync.
    pub fn present(&self) -> usize {
        self.linked + self.already_present
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureScope {
    Genre,
    Country,
    Tag,
    Actor,
    Poster,
    Backdrop,
    ActorPhoto,
    AssetCommit,
    LinkPurge,
    Season,
    Episode,
}

impl From<DimensionKind> for FailureScope {
    fn from(kind: DimensionKind) -> Self {
        match kind {
            DimensionKind::Genre => FailureScope::Genre,
            DimensionKind::Country => FailureScope::Country,
            DimensionKind::Tag => FailureScope::Tag,
            DimensionKind::Actor => FailureScope::Actor,
        }
    }
}

/// An isolated failure that did not abort the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialFailure {
    pub scope: FailureScope,
    pub item: String,
    pub reason: String,
}

impl PartialFailure {
    pub fn new(scope: FailureScope, item: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            scope,
            item: item.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AssetReport {
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    /// Prior locators deleted after the new ones were committed.
    pub superseded: Vec<String>,
    /// Freshly stored files removed because their commit failed.
    pub discarded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub content_id: ContentId,
    pub external_id: String,
    pub title: String,
    pub kind: ContentKind,
    pub outcome: UpsertKind,
    pub seasons_imported: usize,
    pub episodes_imported: usize,
    pub seasons_skipped: Vec<i32>,
    pub links: BTreeMap<DimensionKind, LinkTally>,
    pub partial_failures: Vec<PartialFailure>,
    pub assets: AssetReport,
}

impl ImportSummary {
    pub fn links_for(&self, kind: DimensionKind) -> LinkTally {
        self.links.get(&kind).copied().unwrap_or_default()
    }

    pub fn failures_in(&self, scope: FailureScope) -> impl Iterator<Item = &PartialFailure> {
        self.partial_failures.iter().filter(move |f| f.scope == scope)
    }

    /// No isolated failures were recorded.
    pub fn is_complete(&self) -> bool {
        self.partial_failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_is_only_reachable_before_the_main_write_lands() {
        assert!(ImportPhase::Fetching.can_advance_to(ImportPhase::Aborted));
        assert!(ImportPhase::UpsertingMain.can_advance_to(ImportPhase::Aborted));
        assert!(!ImportPhase::SyncingAssets.can_advance_to(ImportPhase::Aborted));
        assert!(!ImportPhase::ImportingSeasons.can_advance_to(ImportPhase::Aborted));
    }

    #[test]
    fn movies_skip_the_season_phase() {
        assert!(ImportPhase::SyncingRelationships.can_advance_to(ImportPhase::Done));
        assert!(!ImportPhase::SyncingAssets.can_advance_to(ImportPhase::ImportingSeasons));
        assert!(ImportPhase::Done.is_terminal());
    }

    #[test]
    fn summary_serializes_category_keys() {
        let mut links = BTreeMap::new();
        links.insert(
            DimensionKind::Genre,
            LinkTally {
                linked: 2,
                ..LinkTally::default()
            },
        );
        let summary = ImportSummary {
            content_id: ContentId(7),
            external_id: "ext:100".into(),
            title: "Heat".into(),
            kind: ContentKind::Movie,
            outcome: UpsertKind::Created,
            seasons_imported: 0,
            episodes_imported: 0,
            seasons_skipped: Vec::new(),
            links,
            partial_failures: Vec::new(),
            assets: AssetReport::default(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["outcome"], "created");
        assert_eq!(json["links"]["genre"]["linked"], 2);
        assert_eq!(summary.links_for(DimensionKind::Actor), LinkTally::default());
    }
}
