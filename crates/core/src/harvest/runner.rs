use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::config::{CategorySpec, SiteConfig};
use crate::enrich::EnrichmentPipeline;
use crate::extract::{ListingExtractor, ListingRecord};
use crate::fetch::PageFetcher;
use crate::progress::{CategoryProgress, ProgressStore};
use crate::snapshot::ListingSnapshot;
use crate::store::MovieStore;

use super::{CategoryReport, HarvestConfig, HarvestError, HarvestReport};

/// Drives both harvest stages against one configured site.
pub struct HarvestRunner {
    fetcher: Arc<dyn PageFetcher>,
    listing: Arc<dyn ListingExtractor>,
    pipeline: Arc<EnrichmentPipeline>,
    store: Arc<dyn MovieStore>,
    progress: Arc<dyn ProgressStore>,
    site: SiteConfig,
    config: HarvestConfig,
}

impl HarvestRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        listing: Arc<dyn ListingExtractor>,
        pipeline: Arc<EnrichmentPipeline>,
        store: Arc<dyn MovieStore>,
        progress: Arc<dyn ProgressStore>,
        site: SiteConfig,
        config: HarvestConfig,
    ) -> Self {
        Self {
            fetcher,
            listing,
            pipeline,
            store,
            progress,
            site,
            config,
        }
    }

    /// Walk one category's listing pages in order.
    ///
    /// An unreachable first page fails the category; a failure on a later
    /// page truncates it, keeping what was already collected. An empty page
    /// before the reported count also truncates, trusting the content over
    /// the pagination widget.
    pub async fn collect_category(
        &self,
        category: &CategorySpec,
    ) -> Result<Vec<ListingRecord>, HarvestError> {
        let url = self.listing.page_url(&self.site.base_url, &category.path, 1);
        let page = self.fetcher.fetch(&url).await.map_err(|e| {
            HarvestError::CategoryUnreachable {
                category: category.key.clone(),
                reason: e.to_string(),
            }
        })?;

        let parsed = self.listing.extract(&page.body, &url);
        let mut total_pages = parsed.total_pages.max(1);
        if let Some(cap) = self.config.max_pages {
            total_pages = total_pages.min(cap.max(1));
        }

        let mut records = tag_category(parsed.records, &category.key);
        if records.is_empty() {
            warn!(category = %category.key, "empty first listing page, stopping early");
            return Ok(records);
        }
        info!(
            category = %category.key,
            total_pages,
            first_page = records.len(),
            "walking listing pages"
        );

        for page_no in 2..=total_pages {
            sleep_ms(self.config.page_delay_ms).await;
            let url = self
                .listing
                .page_url(&self.site.base_url, &category.path, page_no);
            match self.fetcher.fetch(&url).await {
                Ok(page) => {
                    let parsed = self.listing.extract(&page.body, &url);
                    if parsed.records.is_empty() {
                        warn!(category = %category.key, page_no, "empty listing page, stopping early");
                        break;
                    }
                    records.extend(tag_category(parsed.records, &category.key));
                }
                Err(e) => {
                    warn!(
                        category = %category.key,
                        page_no,
                        error = %e,
                        "listing page fetch failed, keeping what was collected"
                    );
                    break;
                }
            }
        }

        Ok(records)
    }

    /// Walk every configured category. Unreachable categories are logged and
    /// skipped; the others still make it into the result.
    pub async fn collect_listings(&self) -> BTreeMap<String, Vec<ListingRecord>> {
        let mut categories = BTreeMap::new();
        for (i, category) in self.site.categories.iter().enumerate() {
            if i > 0 {
                sleep_ms(self.config.listing_category_delay_ms).await;
            }
            match self.collect_category(category).await {
                Ok(records) => {
                    info!(category = %category.key, records = records.len(), "category collected");
                    categories.insert(category.key.clone(), records);
                }
                Err(e) => {
                    error!(category = %category.key, error = %e, "skipping category");
                }
            }
        }
        categories
    }

    /// Stage one: collect listings and freeze them into a snapshot file.
    pub async fn run_stage1(&self, data_dir: &Path) -> Result<PathBuf, HarvestError> {
        let categories = self.collect_listings().await;
        let snapshot = ListingSnapshot::new(categories);
        Ok(snapshot.save(data_dir)?)
    }

    /// Enrich and persist one category's records, checkpointing after every
    /// committed batch. Persistence always commits before the checkpoint
    /// advances, so a crash between the two repeats a batch instead of
    /// losing one.
    pub async fn enrich_category(&self, category: &str, records: &[ListingRecord]) -> CategoryReport {
        let mut report = CategoryReport::new(category);
        let total = records.len();

        let start = if self.config.resume {
            match self.progress.load(category) {
                Ok(Some(p)) => {
                    let start = p.processed_count.min(total);
                    if start > 0 {
                        info!(category, start, total, "resuming from checkpoint");
                    }
                    start
                }
                Ok(None) => 0,
                Err(e) => {
                    warn!(category, error = %e, "unreadable checkpoint, starting over");
                    0
                }
            }
        } else {
            if let Err(e) = self.progress.clear(category) {
                warn!(category, error = %e, "failed to clear checkpoint");
            }
            0
        };

        if start >= total {
            info!(category, total, "category already complete");
            return report;
        }

        let mut processed = start;
        for (i, chunk) in records[start..].chunks(self.config.batch_size.max(1)).enumerate() {
            if i > 0 {
                sleep_ms(self.config.batch_delay_ms).await;
            }

            let (enriched, stats) = self.pipeline.enrich_batch(chunk.to_vec()).await;
            report.enrich_failures +=
                stats.passthrough_fetch_failed + stats.passthrough_parse_failed;

            match self.store.upsert_batch(&enriched) {
                Ok(r) => {
                    report.saved += r.saved;
                    report.updated += r.updated;
                    report.skipped_no_links += r.skipped_no_links;
                }
                Err(e) => {
                    error!(category, error = %e, "batch persistence failed, stopping category");
                    report.failed = true;
                    break;
                }
            }

            processed += chunk.len();
            report.processed += chunk.len();

            let checkpoint = CategoryProgress::new(category, processed, total);
            info!(
                category,
                processed,
                total,
                percentage = format!("{:.1}", checkpoint.percentage),
                "batch committed"
            );
            if let Err(e) = self.progress.save(&checkpoint) {
                error!(category, error = %e, "checkpoint write failed, stopping category");
                report.failed = true;
                break;
            }
        }

        report
    }

    /// Stage two: replay a snapshot through enrichment into the store.
    ///
    /// `categories` filters by key when given. With `category_workers` above
    /// one, categories run concurrently and the inter-category delay does
    /// not apply.
    pub async fn run_stage2(
        &self,
        snapshot: &ListingSnapshot,
        categories: Option<&[String]>,
    ) -> HarvestReport {
        let selected: Vec<(&String, &Vec<ListingRecord>)> = snapshot
            .categories
            .iter()
            .filter(|(key, _)| categories.map_or(true, |keys| keys.iter().any(|k| k == *key)))
            .collect();

        let mut report = HarvestReport::default();
        if self.config.category_workers > 1 {
            report.categories = stream::iter(selected)
                .map(|(key, records)| self.enrich_category(key, records))
                .buffer_unordered(self.config.category_workers)
                .collect()
                .await;
        } else {
            for (i, (key, records)) in selected.into_iter().enumerate() {
                if i > 0 {
                    sleep_ms(self.config.category_delay_ms).await;
                }
                report.categories.push(self.enrich_category(key, records).await);
            }
        }

        report.log_summary();
        report
    }

    /// Both stages back to back on a fresh snapshot.
    pub async fn run_full(
        &self,
        data_dir: &Path,
        categories: Option<&[String]>,
    ) -> Result<HarvestReport, HarvestError> {
        let path = self.run_stage1(data_dir).await?;
        let snapshot = ListingSnapshot::load(&path)?;
        Ok(self.run_stage2(&snapshot, categories).await)
    }
}

fn tag_category(records: Vec<ListingRecord>, key: &str) -> Vec<ListingRecord> {
    records
        .into_iter()
        .map(|mut r| {
            r.category = key.to_string();
            r
        })
        .collect()
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
