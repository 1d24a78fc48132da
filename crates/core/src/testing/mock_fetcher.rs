//! Mock page fetcher for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::fetch::{FetchError, FetchedPage, PageFetcher};

/// Mock implementation of the [`PageFetcher`] trait.
///
/// Provides controllable behavior for testing:
/// - Serve canned bodies per URL
/// - Fail specific URLs with a connection error
/// - Count fetches and track the peak number in flight
pub struct MockFetcher {
    responses: Mutex<HashMap<String, String>>,
    failures: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Hold every fetch open for the given duration, making concurrency
    /// observable through [`MockFetcher::max_in_flight`].
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    /// Serve `body` for `url`.
    pub fn respond(&self, url: impl Into<String>, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), body.into());
    }

    /// Fail `url` with a connection error.
    pub fn fail(&self, url: impl Into<String>) {
        self.failures.lock().unwrap().insert(url.into());
    }

    /// Stop failing `url`; subsequent fetches use the canned body again.
    pub fn recover(&self, url: &str) {
        self.failures.lock().unwrap().remove(url);
    }

    /// Total fetches performed, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// URLs fetched, in call order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Peak number of fetches that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.failures.lock().unwrap().contains(url) {
            Err(FetchError::Connection(format!("mock failure for {url}")))
        } else {
            match self.responses.lock().unwrap().get(url) {
                Some(body) => Ok(FetchedPage {
                    status: 200,
                    body: body.clone(),
                }),
                None => Err(FetchError::Status(404)),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_response() {
        let fetcher = MockFetcher::new();
        fetcher.respond("u1", "body");

        let page = fetcher.fetch("u1").await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "body");
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_url_is_404() {
        let fetcher = MockFetcher::new();
        assert!(matches!(
            fetcher.fetch("missing").await,
            Err(FetchError::Status(404))
        ));
    }

    #[tokio::test]
    async fn test_failure_and_recovery() {
        let fetcher = MockFetcher::new();
        fetcher.respond("u1", "body");
        fetcher.fail("u1");

        assert!(fetcher.fetch("u1").await.is_err());

        fetcher.recover("u1");
        assert!(fetcher.fetch("u1").await.is_ok());
        assert_eq!(fetcher.fetched_urls(), vec!["u1", "u1"]);
    }
}
