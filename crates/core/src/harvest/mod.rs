//! Two-stage harvest orchestration.
//!
//! Stage one walks every configured category's listing pages and freezes the
//! result into a [`crate::snapshot::ListingSnapshot`]. Stage two replays a
//! snapshot through the enrichment pipeline into the store, checkpointing
//! per category so an interrupted run resumes where it left off.

mod config;
mod runner;
mod types;

pub use config::HarvestConfig;
pub use runner::HarvestRunner;
pub use types::{CategoryReport, HarvestError, HarvestReport};
