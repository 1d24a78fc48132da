//! Testing utilities and mock implementations for pipeline tests.
//!
//! This module provides mock implementations of the fetching and extraction
//! traits, allowing full harvest runs without network access or a real site.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelharvest_core::testing::{MockFetcher, MockDetailExtractor, MockParse};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.respond("https://example.com/html/m1.html", "m1-body");
//!
//! let detail = MockDetailExtractor::new(MockParse::WithLinks);
//!
//! // Use in an EnrichmentPipeline...
//! ```

mod mock_detail;
mod mock_fetcher;

pub use mock_detail::{MockDetailExtractor, MockParse};
pub use mock_fetcher::MockFetcher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::extract::{DetailFragment, DownloadLink, ListingRecord, MovieAttributes};

    /// Create a listing record with reasonable defaults.
    pub fn listing_record(id: &str, category: &str) -> ListingRecord {
        let mut record = ListingRecord::new(
            id,
            format!("Movie {}", id),
            format!("/html/{}/{}.html", category, id),
        );
        record.category = category.to_string();
        record.quality = Some("HD".to_string());
        record
    }

    /// Create a detail fragment carrying one magnet link.
    pub fn fragment_with_magnet(info_hash: &str) -> DetailFragment {
        DetailFragment {
            attributes: MovieAttributes {
                year: Some("2024".to_string()),
                country: Some("US".to_string()),
                ..Default::default()
            },
            download_links: vec![DownloadLink::new(
                "1080p",
                format!("magnet:?xt=urn:btih:{}", info_hash),
            )],
        }
    }

    /// Create a fragment with metadata but no download links.
    pub fn fragment_without_links() -> DetailFragment {
        DetailFragment {
            attributes: MovieAttributes {
                year: Some("2024".to_string()),
                ..Default::default()
            },
            download_links: Vec::new(),
        }
    }
}
