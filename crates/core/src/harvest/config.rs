use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Records enriched and persisted per checkpoint.
    pub batch_size: usize,
    /// Cap on listing pages walked per category. `None` walks them all.
    pub max_pages: Option<u32>,
    /// Categories enriched at once in stage two.
    pub category_workers: usize,
    /// Resume from existing checkpoints instead of starting over.
    pub resume: bool,
    pub page_delay_ms: u64,
    pub batch_delay_ms: u64,
    /// Pause between categories while walking listings in stage one.
    pub listing_category_delay_ms: u64,
    /// Pause between categories while enriching sequentially in stage two.
    pub category_delay_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_pages: None,
            category_workers: 1,
            resume: true,
            page_delay_ms: 1000,
            batch_delay_ms: 3000,
            listing_category_delay_ms: 2000,
            category_delay_ms: 5000,
        }
    }
}
