use thiserror::Error;
use tracing::info;

use crate::progress::ProgressError;
use crate::snapshot::SnapshotError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Category '{category}' unreachable: {reason}")]
    CategoryUnreachable { category: String, reason: String },
}

/// What stage two did with one category.
#[derive(Debug, Clone, Default)]
pub struct CategoryReport {
    pub category: String,
    /// Records pushed through the pipeline this run, resumed ones excluded.
    pub processed: usize,
    pub saved: usize,
    pub updated: usize,
    pub skipped_no_links: usize,
    /// Records that passed through unenriched after fetch or parse failure.
    pub enrich_failures: usize,
    /// The category stopped early on a persistence or checkpoint error.
    pub failed: bool,
}

impl CategoryReport {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Default::default()
        }
    }
}

/// Aggregate outcome of one stage-two run.
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub categories: Vec<CategoryReport>,
}

impl HarvestReport {
    pub fn total_processed(&self) -> usize {
        self.categories.iter().map(|c| c.processed).sum()
    }

    pub fn total_saved(&self) -> usize {
        self.categories.iter().map(|c| c.saved).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.categories.iter().map(|c| c.updated).sum()
    }

    pub fn failed_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| c.failed)
            .map(|c| c.category.as_str())
            .collect()
    }

    pub fn log_summary(&self) {
        for report in &self.categories {
            info!(
                category = %report.category,
                processed = report.processed,
                saved = report.saved,
                updated = report.updated,
                skipped = report.skipped_no_links,
                enrich_failures = report.enrich_failures,
                failed = report.failed,
                "category summary"
            );
        }
        info!(
            categories = self.categories.len(),
            processed = self.total_processed(),
            saved = self.total_saved(),
            updated = self.total_updated(),
            failed = self.failed_categories().len(),
            "harvest summary"
        );
    }
}
