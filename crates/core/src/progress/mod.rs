//! Per-category progress checkpoints for resumable enrichment.

mod file;

pub use file::FileProgressStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A durable checkpoint: how far enrichment got through one category.
///
/// `processed_count` only ever covers records whose persistence has already
/// committed, so resuming from it can repeat work but never skip any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryProgress {
    pub category: String,
    pub processed_count: usize,
    pub total_count: usize,
    pub timestamp: DateTime<Utc>,
    pub percentage: f64,
}

impl CategoryProgress {
    pub fn new(category: impl Into<String>, processed_count: usize, total_count: usize) -> Self {
        let percentage = if total_count == 0 {
            100.0
        } else {
            processed_count as f64 / total_count as f64 * 100.0
        };
        Self {
            category: category.into(),
            processed_count,
            total_count,
            timestamp: Utc::now(),
            percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed_count >= self.total_count
    }
}

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Saves and loads per-category checkpoints.
pub trait ProgressStore: Send + Sync {
    fn save(&self, progress: &CategoryProgress) -> Result<(), ProgressError>;

    /// `Ok(None)` when no checkpoint exists for the category.
    fn load(&self, category: &str) -> Result<Option<CategoryProgress>, ProgressError>;

    fn clear(&self, category: &str) -> Result<(), ProgressError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        let p = CategoryProgress::new("action", 5, 20);
        assert!((p.percentage - 25.0).abs() < f64::EPSILON);
        assert!(!p.is_complete());
    }

    #[test]
    fn test_empty_category_is_complete() {
        let p = CategoryProgress::new("action", 0, 0);
        assert!((p.percentage - 100.0).abs() < f64::EPSILON);
        assert!(p.is_complete());
    }
}
