use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use cinesync_model::ContentKind;

use super::importer::{HierarchyImporter, ImportRequest};
use super::summary::ImportSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkSettings {
    pub max_items: usize,
    /// Total tries per reference, first one included.
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            max_items: 10,
            max_attempts: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub input: String,
    pub code: &'static str,
    pub message: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BulkReport {
    pub succeeded: Vec<ImportSummary>,
    pub failed: Vec<BulkFailure>,
    /// Inputs beyond the per-run limit, not attempted.
    pub skipped: Vec<String>,
}

/// Sequential import of a list of references with bounded retries.
#[derive(Debug, Clone)]
pub struct BulkImporter {
    importer: Arc<HierarchyImporter>,
    settings: BulkSettings,
}

impl BulkImporter {
    pub fn new(importer: Arc<HierarchyImporter>, settings: BulkSettings) -> Self {
        Self { importer, settings }
    }

    pub async fn run(
        &self,
        inputs: &[String],
        kind: Option<ContentKind>,
        quality: Option<&str>,
    ) -> BulkReport {
        let limit = self.settings.max_items;
        let mut report = BulkReport {
            skipped: inputs.iter().skip(limit).cloned().collect(),
            ..BulkReport::default()
        };
        if !report.skipped.is_empty() {
            warn!(limit, skipped = report.skipped.len(), "bulk import over limit");
        }

        for input in inputs.iter().take(limit) {
            let request = ImportRequest {
                input: input.clone(),
                kind,
                quality: quality.map(str::to_string),
            };

            let mut attempts = 0;
            loop {
                attempts += 1;
                match self.importer.import(&request).await {
                    Ok(summary) => {
                        report.succeeded.push(summary);
                        break;
                    }
                    Err(err) if err.is_retryable() && attempts < self.settings.max_attempts => {
                        warn!(input = %input, attempt = attempts, error = %err, "bulk item failed, retrying");
                        if !self.settings.retry_delay.is_zero() {
                            tokio::time::sleep(self.settings.retry_delay).await;
                        }
                    }
                    Err(err) => {
                        warn!(input = %input, attempts, error = %err, "bulk item failed");
                        report.failed.push(BulkFailure {
                            input: input.clone(),
                            code: err.code(),
                            message: err.to_string(),
                            attempts,
                        });
                        break;
                    }
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "bulk import finished"
        );
        report
    }
}
