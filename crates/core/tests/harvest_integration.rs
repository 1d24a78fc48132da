//! Full harvest integration tests.
//!
//! These tests run both stages against canned site pages through the real
//! extractor, pipeline and SQLite store:
//! - Listing collection across paginated categories
//! - Batch enrichment with checkpointing after every committed batch
//! - Resume from a checkpoint without refetching processed records
//! - Idempotent re-runs through the dedup upsert

use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use reelharvest_core::{
    config::{CategorySpec, SiteConfig},
    progress::{CategoryProgress, ProgressError, ProgressStore},
    testing::MockFetcher,
    EnrichConfig, EnrichmentPipeline, FileProgressStore, HarvestConfig, HarvestRunner,
    ListingRecord, ListingSnapshot, MovieStore, PiaohuaExtractor, SqliteMovieStore,
};

const BASE: &str = "https://example.com";

/// Progress store that also records every checkpoint it was asked to write.
struct RecordingProgress {
    inner: FileProgressStore,
    saves: Mutex<Vec<(String, usize)>>,
}

impl RecordingProgress {
    fn new(inner: FileProgressStore) -> Self {
        Self {
            inner,
            saves: Mutex::new(Vec::new()),
        }
    }

    fn saves_for(&self, category: &str) -> Vec<usize> {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == category)
            .map(|(_, n)| *n)
            .collect()
    }
}

impl ProgressStore for RecordingProgress {
    fn save(&self, progress: &CategoryProgress) -> Result<(), ProgressError> {
        self.saves
            .lock()
            .unwrap()
            .push((progress.category.clone(), progress.processed_count));
        self.inner.save(progress)
    }

    fn load(&self, category: &str) -> Result<Option<CategoryProgress>, ProgressError> {
        self.inner.load(category)
    }

    fn clear(&self, category: &str) -> Result<(), ProgressError> {
        self.inner.clear(category)
    }
}

/// A listing page in the site's real markup, with a last-page link.
fn listing_html(path: &str, ids: &[&str], total_pages: u32) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="col-md-6">
                    <div class="pic"><a href="/html/{path}/{id}.html"><img src="/p/{id}.jpg" alt="Movie {id}"></a></div>
                    <div class="txt"><h3>Movie {id}<em>HD</em></h3><p>Blurb for {id}.</p></div>
                </li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <ul class="ul-imgtxt2 row">{items}</ul>
        <div class="pages"><a href="list_{total_pages}.html">尾页</a></div>
        </body></html>"#
    )
}

/// A detail page carrying attributes and one magnet link derived from the id.
fn detail_html(id: &str) -> String {
    format!(
        r#"<html><body><div class="m-text1">
        <h1>Movie {id} BD1080p</h1>
        <div class="info"><span>发布时间：2024-05-01</span></div>
        <div class="txt">
            <img src="/hd/{id}.jpg">
            ◎年代　2024<br>
            ◎产地　美国<br>
        </div>
        <div class="bot"><a href="magnet:?xt=urn:btih:{id}">1080p</a></div>
        </div></body></html>"#
    )
}

struct TestHarness {
    fetcher: Arc<MockFetcher>,
    store: Arc<SqliteMovieStore>,
    progress: Arc<RecordingProgress>,
    runner: HarvestRunner,
    data_dir: TempDir,
}

impl TestHarness {
    fn new(categories: Vec<CategorySpec>, config: HarvestConfig) -> Self {
        let data_dir = TempDir::new().expect("Failed to create temp dir");
        let fetcher = Arc::new(MockFetcher::new());
        let store = Arc::new(SqliteMovieStore::in_memory().expect("Failed to create store"));
        let progress = Arc::new(RecordingProgress::new(FileProgressStore::new(
            data_dir.path(),
        )));

        let enrich_config = EnrichConfig {
            worker_count: 2,
            parse_retries: 1,
            retry_base_delay_ms: 0,
            retry_delay_increment_ms: 0,
            fetch_delay_ms: 0,
        };
        let pipeline = Arc::new(EnrichmentPipeline::new(
            fetcher.clone(),
            Arc::new(PiaohuaExtractor::new()),
            enrich_config,
            BASE,
        ));

        let site = SiteConfig {
            base_url: BASE.to_string(),
            categories,
        };
        let runner = HarvestRunner::new(
            fetcher.clone(),
            Arc::new(PiaohuaExtractor::new()),
            pipeline,
            store.clone(),
            progress.clone(),
            site,
            config,
        );

        Self {
            fetcher,
            store,
            progress,
            runner,
            data_dir,
        }
    }

    /// Seed listing pages plus the matching detail pages for one category.
    fn seed_category(&self, path: &str, pages: &[Vec<String>]) {
        let total = pages.len() as u32;
        for (i, ids) in pages.iter().enumerate() {
            let page_no = i + 1;
            let url = if page_no == 1 {
                format!("{BASE}/html/{path}/index.html")
            } else {
                format!("{BASE}/html/{path}/list_{page_no}.html")
            };
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            self.fetcher.respond(url, listing_html(path, &id_refs, total));
            for id in ids {
                self.fetcher
                    .respond(format!("{BASE}/html/{path}/{id}.html"), detail_html(id));
            }
        }
    }
}

fn quiet_config() -> HarvestConfig {
    HarvestConfig {
        page_delay_ms: 0,
        batch_delay_ms: 0,
        listing_category_delay_ms: 0,
        category_delay_ms: 0,
        ..Default::default()
    }
}

fn ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{prefix}{i}")).collect()
}

fn record(path: &str, id: &str, category: &str) -> ListingRecord {
    let mut r = ListingRecord::new(id, format!("Movie {id}"), format!("/html/{path}/{id}.html"));
    r.category = category.to_string();
    r
}

#[tokio::test]
async fn test_full_harvest_end_to_end() {
    let harness = TestHarness::new(
        vec![
            CategorySpec::new("action", "dongzuo"),
            CategorySpec::new("comedy", "xiju"),
        ],
        quiet_config(),
    );
    // Two listing pages for action (10 + 8), one for comedy (3).
    harness.seed_category("dongzuo", &[ids("a", 0..10), ids("a", 10..18)]);
    harness.seed_category("xiju", &[ids("c", 0..3)]);

    let report = harness
        .runner
        .run_full(harness.data_dir.path(), None)
        .await
        .expect("harvest failed");

    assert_eq!(report.total_processed(), 21);
    assert_eq!(report.total_saved(), 21);
    assert!(report.failed_categories().is_empty());

    let stats = harness.store.stats().unwrap();
    assert_eq!(stats.total_movies, 21);
    assert_eq!(stats.by_category.get("action"), Some(&18));
    assert_eq!(stats.by_category.get("comedy"), Some(&3));
    assert_eq!(stats.by_link_kind.get("magnet"), Some(&21));

    // With the default batch size of 10, action checkpoints at 10 then 18.
    assert_eq!(harness.progress.saves_for("action"), vec![10, 18]);
    assert_eq!(harness.progress.saves_for("comedy"), vec![3]);
}

#[tokio::test]
async fn test_stage2_resumes_from_checkpoint() {
    let harness = TestHarness::new(vec![], quiet_config());
    let all = ids("m", 0..5);
    for id in &all {
        harness
            .fetcher
            .respond(format!("{BASE}/html/dongzuo/{id}.html"), detail_html(id));
    }

    let mut categories = std::collections::BTreeMap::new();
    categories.insert(
        "action".to_string(),
        all.iter()
            .map(|id| record("dongzuo", id, "action"))
            .collect::<Vec<_>>(),
    );
    let snapshot = ListingSnapshot::new(categories);

    harness
        .progress
        .save(&CategoryProgress::new("action", 3, 5))
        .unwrap();

    let report = harness.runner.run_stage2(&snapshot, None).await;
    assert_eq!(report.total_processed(), 2);
    // The three already-processed records are never fetched again.
    assert_eq!(harness.fetcher.fetch_count(), 2);
    let fetched = harness.fetcher.fetched_urls();
    assert!(fetched.contains(&format!("{BASE}/html/dongzuo/m3.html")));
    assert!(fetched.contains(&format!("{BASE}/html/dongzuo/m4.html")));
}

#[tokio::test]
async fn test_rerun_updates_instead_of_duplicating() {
    let harness = TestHarness::new(
        vec![CategorySpec::new("action", "dongzuo")],
        quiet_config(),
    );
    harness.seed_category("dongzuo", &[ids("a", 0..4)]);

    let first = harness
        .runner
        .run_full(harness.data_dir.path(), None)
        .await
        .unwrap();
    assert_eq!(first.total_saved(), 4);

    // Second run repeats everything; the completed checkpoint belongs to the
    // finished first run, so start fresh.
    let mut config = quiet_config();
    config.resume = false;
    let harness2 = TestHarness::new(
        vec![CategorySpec::new("action", "dongzuo")],
        config,
    );
    harness2.seed_category("dongzuo", &[ids("a", 0..4)]);

    let snapshot_path = harness2
        .runner
        .run_stage1(harness2.data_dir.path())
        .await
        .unwrap();
    let snapshot = ListingSnapshot::load(&snapshot_path).unwrap();

    let second = harness2.runner.run_stage2(&snapshot, None).await;
    assert_eq!(second.total_saved(), 4);

    let third = harness2.runner.run_stage2(&snapshot, None).await;
    assert_eq!(third.total_saved(), 0);
    assert_eq!(third.total_updated(), 4);
    assert_eq!(harness2.store.stats().unwrap().total_movies, 4);
}

#[tokio::test]
async fn test_failed_detail_pages_pass_through_without_losing_batch() {
    let harness = TestHarness::new(vec![], quiet_config());
    let all = ids("m", 0..4);
    for id in &all[..3] {
        harness
            .fetcher
            .respond(format!("{BASE}/html/dongzuo/{id}.html"), detail_html(id));
    }
    // m3's detail page stays unseeded and 404s.

    let mut categories = std::collections::BTreeMap::new();
    categories.insert(
        "action".to_string(),
        all.iter()
            .map(|id| record("dongzuo", id, "action"))
            .collect::<Vec<_>>(),
    );
    let snapshot = ListingSnapshot::new(categories);

    let report = harness.runner.run_stage2(&snapshot, None).await;
    assert_eq!(report.total_processed(), 4);
    assert_eq!(report.total_saved(), 3);
    assert_eq!(report.categories[0].enrich_failures, 1);
    assert_eq!(report.categories[0].skipped_no_links, 1);
    assert!(!report.categories[0].failed);

    // The checkpoint still covers the whole category.
    let progress = harness.progress.load("action").unwrap().unwrap();
    assert_eq!(progress.processed_count, 4);
    assert!(progress.is_complete());
}

#[tokio::test]
async fn test_snapshot_survives_between_stages() {
    let harness = TestHarness::new(
        vec![CategorySpec::new("action", "dongzuo")],
        quiet_config(),
    );
    harness.seed_category("dongzuo", &[ids("a", 0..2)]);

    let path = harness
        .runner
        .run_stage1(harness.data_dir.path())
        .await
        .unwrap();

    let snapshot = ListingSnapshot::load(&path).unwrap();
    assert_eq!(snapshot.total_categories, 1);
    assert_eq!(snapshot.total_movies, 2);
    let records = &snapshot.categories["action"];
    assert_eq!(records[0].id, "a0");
    assert_eq!(records[0].category, "action");
    assert_eq!(records[0].quality.as_deref(), Some("HD"));
}
