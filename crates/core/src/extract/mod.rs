//! Extraction seams: listing pages to records, detail pages to fragments.
//!
//! The traits here isolate site-specific parsing from the pipeline. The
//! bundled [`PiaohuaExtractor`] is CSS/regex glue for one site; an LLM-backed
//! detail extractor is a drop-in replacement for [`DetailExtractor`].

mod piaohua;
mod types;

pub use piaohua::PiaohuaExtractor;
pub use types::*;

use async_trait::async_trait;

/// Turns one catalog page's raw content into listing records plus the page
/// count the site reports.
///
/// Implementations must tolerate missing sub-elements by omitting the
/// corresponding field, and drop a record only when it lacks both an id and
/// a title. Extraction never fails: a hopeless page yields zero records.
pub trait ListingExtractor: Send + Sync {
    fn extract(&self, html: &str, source_url: &str) -> ListingPage;

    /// Build the URL of the nth listing page (1-based) for a category.
    fn page_url(&self, base_url: &str, category_path: &str, page: u32) -> String;
}

/// Turns one item's detail-page content into a structured fragment.
///
/// `None` is the soft "no structured data recognized" outcome, a normal and
/// reportable result; malformed input must never panic. Implementations may
/// be remote and unreliable, which is why the pipeline retries them.
#[async_trait]
pub trait DetailExtractor: Send + Sync {
    async fn extract(&self, html: &str) -> Option<DetailFragment>;
}

/// Resolve a possibly-relative link against the site base URL.
pub fn absolute_url(base_url: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            link.trim_start_matches('/')
        )
    }
}
