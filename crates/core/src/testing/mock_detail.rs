//! Mock detail extractor for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::extract::{DetailExtractor, DetailFragment, DownloadLink, MovieAttributes};

/// What one parse attempt should yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockParse {
    /// No recognizable structure at all.
    NoStructure,
    /// Attributes but no download links.
    MetadataOnly,
    /// A full fragment with a magnet link derived from the page body.
    WithLinks,
}

/// Mock implementation of the [`DetailExtractor`] trait.
///
/// Either repeats one behavior forever or plays a script of per-attempt
/// behaviors, which is how retry sequences are exercised. The magnet URI is
/// derived from the page body, so re-running the same input produces the
/// same link.
pub struct MockDetailExtractor {
    default: MockParse,
    script: Mutex<Vec<MockParse>>,
    calls: AtomicUsize,
}

impl MockDetailExtractor {
    pub fn new(default: MockParse) -> Self {
        Self {
            default,
            script: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Play the given outcomes in order, then repeat the last one.
    pub fn scripted(script: Vec<MockParse>) -> Self {
        let default = script.last().copied().unwrap_or(MockParse::NoStructure);
        Self {
            default,
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of parse attempts made.
    pub fn parse_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_behavior(&self, attempt: usize) -> MockParse {
        let script = self.script.lock().unwrap();
        script.get(attempt).copied().unwrap_or(self.default)
    }
}

#[async_trait]
impl DetailExtractor for MockDetailExtractor {
    async fn extract(&self, html: &str) -> Option<DetailFragment> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);

        match self.next_behavior(attempt) {
            MockParse::NoStructure => None,
            MockParse::MetadataOnly => Some(DetailFragment {
                attributes: MovieAttributes {
                    year: Some("2024".to_string()),
                    ..Default::default()
                },
                download_links: Vec::new(),
            }),
            MockParse::WithLinks => Some(DetailFragment {
                attributes: MovieAttributes {
                    year: Some("2024".to_string()),
                    country: Some("US".to_string()),
                    ..Default::default()
                },
                download_links: vec![DownloadLink::new(
                    "1080p",
                    format!("magnet:?xt=urn:btih:{}", html.trim()),
                )],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_default() {
        let detail =
            MockDetailExtractor::scripted(vec![MockParse::NoStructure, MockParse::WithLinks]);

        assert!(detail.extract("body").await.is_none());
        assert!(detail.extract("body").await.is_some());
        // Past the script the last behavior repeats.
        assert!(detail.extract("body").await.is_some());
        assert_eq!(detail.parse_count(), 3);
    }

    #[tokio::test]
    async fn test_deterministic_magnet() {
        let detail = MockDetailExtractor::new(MockParse::WithLinks);
        let a = detail.extract("same-body").await.unwrap();
        let b = detail.extract("same-body").await.unwrap();
        assert_eq!(a.download_links[0].uri, b.download_links[0].uri);
    }
}
