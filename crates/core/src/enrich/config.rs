use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Cap on detail pages in flight at once.
    pub worker_count: usize,
    /// Parse retries after the first attempt, against the already-fetched body.
    pub parse_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_delay_increment_ms: u64,
    /// Courtesy pause after every detail fetch, success or not.
    pub fetch_delay_ms: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            parse_retries: 2,
            retry_base_delay_ms: 2000,
            retry_delay_increment_ms: 1000,
            fetch_delay_ms: 1000,
        }
    }
}
