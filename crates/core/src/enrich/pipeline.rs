use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::extract::{absolute_url, DetailExtractor, EnrichedRecord, ListingRecord};
use crate::fetch::PageFetcher;

use super::{EnrichConfig, RetryPolicy};

/// Aggregate outcome counts for one enriched batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub enriched: usize,
    pub passthrough_fetch_failed: usize,
    pub passthrough_parse_failed: usize,
}

enum Outcome {
    Enriched,
    FetchFailed,
    ParseFailed,
}

/// Fetches and parses detail pages for listing records.
///
/// Each record costs exactly one fetch; parse retries reuse the body already
/// in hand. Records whose fetch or parse ultimately fails pass through with
/// their listing fields only, so a bad detail page never loses the record.
pub struct EnrichmentPipeline {
    fetcher: Arc<dyn PageFetcher>,
    detail: Arc<dyn DetailExtractor>,
    policy: RetryPolicy,
    config: EnrichConfig,
    base_url: String,
}

impl EnrichmentPipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        detail: Arc<dyn DetailExtractor>,
        config: EnrichConfig,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            detail,
            policy: RetryPolicy::from_config(&config),
            config,
            base_url: base_url.into(),
        }
    }

    /// Enrich a batch with at most `worker_count` detail pages in flight.
    pub async fn enrich_batch(
        &self,
        records: Vec<ListingRecord>,
    ) -> (Vec<EnrichedRecord>, BatchStats) {
        let outcomes: Vec<(EnrichedRecord, Outcome)> = stream::iter(records)
            .map(|record| self.enrich_one(record))
            .buffer_unordered(self.config.worker_count.max(1))
            .collect()
            .await;

        let mut stats = BatchStats::default();
        let mut enriched = Vec::with_capacity(outcomes.len());
        for (record, outcome) in outcomes {
            match outcome {
                Outcome::Enriched => stats.enriched += 1,
                Outcome::FetchFailed => stats.passthrough_fetch_failed += 1,
                Outcome::ParseFailed => stats.passthrough_parse_failed += 1,
            }
            enriched.push(record);
        }
        (enriched, stats)
    }

    async fn enrich_one(&self, record: ListingRecord) -> (EnrichedRecord, Outcome) {
        let url = absolute_url(&self.base_url, &record.relative_link);

        let fetched = self.fetcher.fetch(&url).await;
        // Courtesy pause counts against the site whether the fetch worked or not.
        sleep_ms(self.config.fetch_delay_ms).await;

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                warn!(id = %record.id, url, error = %e, "detail fetch failed, passing record through");
                return (EnrichedRecord::from_listing(record), Outcome::FetchFailed);
            }
        };

        let mut enriched = EnrichedRecord::from_listing(record);
        for attempt in 0..self.policy.max_attempts {
            if let Some(fragment) = self.detail.extract(&page.body).await {
                enriched.movie_url = Some(url.clone());
                enriched.apply_fragment(fragment);
                if enriched.has_links() {
                    debug!(id = %enriched.listing.id, attempt, "detail parse succeeded");
                    return (enriched, Outcome::Enriched);
                }
            }
            if attempt + 1 < self.policy.max_attempts {
                sleep_ms(self.policy.backoff_delay(attempt).as_millis() as u64).await;
            }
        }

        warn!(
            id = %enriched.listing.id,
            attempts = self.policy.max_attempts,
            "detail parse yielded no download links, passing record through"
        );
        (enriched, Outcome::ParseFailed)
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
