use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::errors::{AppError, AppResult};

const USER_AGENT: &str = "gator";

// See: https://stackoverflow.com/a/7001617/5155484
const ACCEPT: &str = "application/rss+xml, application/rdf+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8";

/// Retrieves the raw bytes of a feed document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Resolves to `NetworkError` on transport failure, non-success status, or cancellation.
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> AppResult<Vec<u8>>;
}

pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header("Accept", ACCEPT)
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!(
                "Got non-success response for feed {}: {}",
                url,
                response.status()
            );
            return Err(AppError::NetworkError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> AppResult<Vec<u8>> {
        tracing::debug!(url, "Fetching feed");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::NetworkError(format!("fetch of {url} was cancelled"))),
            body = self.get(url) => body,
        }
    }
}
