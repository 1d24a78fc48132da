use std::time::Duration;

use super::EnrichConfig;

/// Linear backoff schedule for re-parsing a detail page.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    base_delay: Duration,
    increment: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EnrichConfig) -> Self {
        Self {
            max_attempts: config.parse_retries + 1,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            increment: Duration::from_millis(config.retry_delay_increment_ms),
        }
    }

    /// Delay to wait after the given failed attempt (0-based) before the next.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay + self.increment * attempt
    }
}
