//! Polymarket CLOB client for the public `/markets` listing.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::FetchError;
use crate::metrics;

/// Cursor for the first page of the listing.
pub const FIRST_CURSOR: &str = "MA==";

/// Cursor the CLOB returns once the listing is exhausted.
pub const END_CURSOR: &str = "LTE=";

/// Source of raw, untrusted market records.
#[async_trait]
pub trait MarketFetcher: Send + Sync {
    /// Fetch up to `limit` raw market records (`None` = everything reachable).
    async fn fetch_markets(&self, limit: Option<usize>) -> Result<Vec<Value>, FetchError>;
}

/// One page of the `/markets` response.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsPage {
    /// Raw market records.
    #[serde(default)]
    pub data: Vec<Value>,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl MarketsPage {
    /// Cursor to request next, if the listing continues.
    pub fn continuation(&self) -> Option<&str> {
        match self.next_cursor.as_deref() {
            None | Some("") | Some(END_CURSOR) => None,
            Some(cursor) => Some(cursor),
        }
    }
}

/// Retry timing for upstream page requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first failure.
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff multiplier (e.g., 2.0 for exponential).
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create from config values.
    pub fn from_config(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Calculate next delay with exponential backoff.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let clamped_ms = delay_ms.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(clamped_ms)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retries are used up.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.max_retries => {
                    if attempt == 0 {
                        return Err(e);
                    }
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.next_delay(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Markets request failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Polymarket CLOB API client.
#[derive(Debug, Clone)]
pub struct ClobClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL for CLOB API.
    clob_url: String,
    /// Retry timing.
    retry: RetryPolicy,
    /// Maximum cursor pages per fetch.
    max_pages: u32,
}

impl ClobClient {
    /// Create a new client from configuration.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            clob_url: config.clob_api_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from_config(config.max_retries),
            max_pages: config.fetch_max_pages,
        })
    }

    /// Get the CLOB base URL.
    pub fn clob_url(&self) -> &str {
        &self.clob_url
    }

    /// URL of the markets listing at the given cursor.
    pub fn markets_url(&self, cursor: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/markets", self.clob_url))?;
        url.query_pairs_mut().append_pair("next_cursor", cursor);
        Ok(url)
    }

    /// Fetch one page, retrying transient failures.
    #[instrument(skip(self))]
    async fn fetch_page(&self, cursor: &str) -> Result<MarketsPage, FetchError> {
        let url = self.markets_url(cursor)?;
        self.retry.run(|| self.request_page(&url)).await
    }

    async fn request_page(&self, url: &Url) -> Result<MarketsPage, FetchError> {
        let response = self.http.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<MarketsPage>()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MarketFetcher for ClobClient {
    #[instrument(skip(self))]
    async fn fetch_markets(&self, limit: Option<usize>) -> Result<Vec<Value>, FetchError> {
        let start = Instant::now();
        let mut markets = Vec::new();
        let mut cursor = FIRST_CURSOR.to_string();

        for page_no in 1..=self.max_pages {
            let page = match self.fetch_page(&cursor).await {
                Ok(page) => page,
                Err(e) => {
                    metrics::inc_fetch_failures();
                    return Err(e);
                }
            };
            debug!(page = page_no, count = page.data.len(), "Fetched markets page");

            let next = page.continuation().map(str::to_string);
            markets.extend(page.data);

            if limit.is_some_and(|l| markets.len() >= l) {
                break;
            }
            match next {
                Some(c) => cursor = c,
                None => break,
            }
        }

        if let Some(limit) = limit {
            markets.truncate(limit);
        }

        metrics::record_fetch_latency(start);
        metrics::add_markets_fetched(markets.len() as u64);
        info!(count = markets.len(), "Fetched markets from CLOB");

        Ok(markets)
    }
}
