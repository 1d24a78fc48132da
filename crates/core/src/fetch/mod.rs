//! Page fetching abstraction over the HTTP client.

mod http;

pub use http::{FetcherConfig, HttpFetcher};

use async_trait::async_trait;
use thiserror::Error;

/// A fetched page body with the status it arrived under.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unexpected status code: {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Fetches one page by URL. Implementations own their transport details;
/// the pipeline only sees the body or a classified error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}
