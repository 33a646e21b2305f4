use crate::config::RegistryConfig;
use crate::constants::{SORT_ORDER, STUDIES_ENDPOINT};
use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Continuation cursor for the paginated studies endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// First page of results.
    Start,
    /// Opaque cursor returned by the API for the next page.
    Next(String),
    /// The API reported no further pages. Never sent on the wire.
    Exhausted,
}

impl PageToken {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PageToken::Exhausted)
    }
}

/// Source of raw study pages. The pipeline is written against this seam
/// so tests can drive it with scripted pages instead of the live API.
#[async_trait]
pub trait StudyFetcher: Send + Sync {
    /// Fetch the page addressed by `token`. `Ok(None)` means there is
    /// nothing to fetch; an error means the page stayed unavailable
    /// after all retries.
    async fn fetch_page(&self, token: &PageToken) -> Result<Option<Value>>;
}

/// HTTP client for the ClinicalTrials.gov v2 studies endpoint with a
/// bounded retry loop around each page request.
pub struct RegistryClient {
    client: reqwest::Client,
    config: RegistryConfig,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn page_url(&self, token: &PageToken) -> Option<String> {
        let base = format!(
            "{}?sort={}&pageSize={}",
            STUDIES_ENDPOINT, SORT_ORDER, self.config.page_size
        );
        match token {
            PageToken::Start => Some(base),
            PageToken::Next(token) => Some(format!("{base}&pageToken={token}")),
            PageToken::Exhausted => None,
        }
    }
}

#[async_trait]
impl StudyFetcher for RegistryClient {
    #[instrument(skip(self))]
    async fn fetch_page(&self, token: &PageToken) -> Result<Option<Value>> {
        let url = match self.page_url(token) {
            Some(url) => url,
            None => return Ok(None),
        };

        let mut attempt = 0u32;
        loop {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    let body = response.json::<Value>().await?;
                    return Ok(Some(body));
                }
                Ok(response) => {
                    warn!("Registry returned HTTP {} for page request", response.status());
                }
                Err(err) => {
                    warn!("Registry request failed: {}", err);
                }
            }

            if attempt >= self.config.max_retries {
                return Err(ScraperError::Api {
                    message: format!(
                        "page unavailable after {} retries",
                        self.config.max_retries
                    ),
                });
            }
            attempt += 1;
            debug!(
                "Retrying page request (attempt {}/{})",
                attempt, self.config.max_retries
            );
            tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
        }
    }
}
