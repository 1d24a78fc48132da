//! Stage-two enrichment: fetch detail pages and merge parsed fragments into
//! listing records, with bounded concurrency and per-item parse retries.

mod config;
mod pipeline;
mod retry;

pub use config::EnrichConfig;
pub use pipeline::{BatchStats, EnrichmentPipeline};
pub use retry::RetryPolicy;
