use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Outcome of one transactional batch upsert.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertReport {
    /// Records inserted for the first time.
    pub saved: usize,
    /// Records that already existed and were rewritten.
    pub updated: usize,
    /// Records dropped because they carried no download links.
    pub skipped_no_links: usize,
}

/// Aggregate view over the stored catalog.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_movies: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_link_kind: BTreeMap<String, u64>,
}
