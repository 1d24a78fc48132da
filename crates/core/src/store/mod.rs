//! Durable movie storage with transactional batch upserts.

mod sqlite;
mod types;

pub use sqlite::SqliteMovieStore;
pub use types::{StoreError, StoreStats, UpsertReport};

use crate::extract::EnrichedRecord;

/// Persists enriched records and answers aggregate questions about them.
///
/// `upsert_batch` is all-or-nothing: either every record in the batch lands
/// or none do, so a checkpoint written after it never overstates progress.
pub trait MovieStore: Send + Sync {
    fn upsert_batch(&self, records: &[EnrichedRecord]) -> Result<UpsertReport, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}
