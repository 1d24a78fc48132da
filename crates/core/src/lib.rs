pub mod config;
pub mod enrich;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod progress;
pub mod snapshot;
pub mod store;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use enrich::{EnrichConfig, EnrichmentPipeline};
pub use extract::{
    DetailExtractor, EnrichedRecord, ListingExtractor, ListingRecord, PiaohuaExtractor,
};
pub use fetch::{HttpFetcher, PageFetcher};
pub use harvest::{HarvestConfig, HarvestError, HarvestReport, HarvestRunner};
pub use progress::{CategoryProgress, FileProgressStore, ProgressStore};
pub use snapshot::ListingSnapshot;
pub use store::{MovieStore, SqliteMovieStore, StoreStats};
