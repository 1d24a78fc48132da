//! Listing snapshots: the durable hand-off between the two harvest stages.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::extract::ListingRecord;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Everything stage one learned, keyed by category, written as one JSON file.
///
/// Stage two reads a snapshot back instead of re-walking the listing pages,
/// so the stages can run hours or days apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub timestamp: String,
    pub total_categories: usize,
    pub total_movies: usize,
    pub categories: BTreeMap<String, Vec<ListingRecord>>,
}

impl ListingSnapshot {
    pub fn new(categories: BTreeMap<String, Vec<ListingRecord>>) -> Self {
        let total_movies = categories.values().map(Vec::len).sum();
        Self {
            timestamp: Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            total_categories: categories.len(),
            total_movies,
            categories,
        }
    }

    /// Write the snapshot to `dir` and return the file path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, SnapshotError> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(format!("movie_lists_{}.json", self.timestamp));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        info!(
            path = %path.display(),
            categories = self.total_categories,
            movies = self.total_movies,
            "saved listing snapshot"
        );
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
