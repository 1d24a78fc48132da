use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FetchError, FetchedPage, PageFetcher};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Forced charset for body decoding, e.g. "gb2312" for legacy Chinese
    /// sites that mislabel their encoding. `None` trusts the response headers.
    pub charset: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            charset: None,
        }
    }
}

/// reqwest-backed [`PageFetcher`].
pub struct HttpFetcher {
    client: Client,
    charset: Option<String>,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            charset: config.charset.clone(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        debug!(url, "fetching page");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = match &self.charset {
            Some(charset) => response
                .text_with_charset(charset)
                .await
                .map_err(|e| FetchError::Body(e.to_string()))?,
            None => response
                .text()
                .await
                .map_err(|e| FetchError::Body(e.to_string()))?,
        };

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}
