//! Fetch-then-normalize pipeline shared by the API and the CLI.

use std::sync::Arc;

use tracing::{instrument, warn};

use super::client::MarketFetcher;
use super::normalize::try_normalize_value;
use super::types::MarketInfo;
use crate::error::FetchError;
use crate::metrics;

/// Loads canonical markets from a fetcher.
#[derive(Clone)]
pub struct MarketService {
    fetcher: Arc<dyn MarketFetcher>,
}

impl std::fmt::Debug for MarketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketService").finish_non_exhaustive()
    }
}

impl MarketService {
    /// Wrap a fetcher.
    pub fn new(fetcher: Arc<dyn MarketFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch and normalize markets; an upstream failure yields an empty list.
    #[instrument(skip(self))]
    pub async fn load(&self, limit: Option<usize>) -> Vec<MarketInfo> {
        match self.try_load(limit).await {
            Ok(markets) => markets,
            Err(e) => {
                warn!(error = %e, "Failed to fetch markets, serving empty set");
                Vec::new()
            }
        }
    }

    /// Fetch and normalize markets, surfacing upstream failures.
    pub async fn try_load(&self, limit: Option<usize>) -> Result<Vec<MarketInfo>, FetchError> {
        let raw = self.fetcher.fetch_markets(limit).await?;
        Ok(raw
            .iter()
            .map(|value| {
                try_normalize_value(value).unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to extract market info");
                    metrics::inc_normalize_failures();
                    MarketInfo::parse_error()
                })
            })
            .collect())
    }

    /// Whether the upstream answers with at least one market.
    pub async fn probe(&self) -> bool {
        matches!(self.fetcher.fetch_markets(Some(1)).await, Ok(m) if !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::mock::{MockConfig, MockMarketFetcher};
    use crate::market::normalize::PARSE_ERROR_TITLE;
    use serde_json::json;

    #[tokio::test]
    async fn load_normalizes_every_record() {
        let fetcher = MockMarketFetcher::with_markets(vec![
            json!({"question": "Bitcoin above 100k?"}),
            json!("not a market"),
        ]);
        let service = MarketService::new(Arc::new(fetcher));

        let markets = service.load(None).await;
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0].category, "crypto");
        assert_eq!(markets[1].title, PARSE_ERROR_TITLE);
    }

    #[tokio::test]
    async fn load_degrades_to_empty_on_fetch_failure() {
        let fetcher = MockMarketFetcher::with_config(MockConfig {
            fail_fetch: true,
            ..Default::default()
        });
        let service = MarketService::new(Arc::new(fetcher));

        assert!(service.load(None).await.is_empty());
        assert!(service.try_load(None).await.is_err());
        assert!(!service.probe().await);
    }

    #[tokio::test]
    async fn probe_requires_data() {
        let service = MarketService::new(Arc::new(MockMarketFetcher::new()));
        assert!(!service.probe().await);

        let service = MarketService::new(Arc::new(MockMarketFetcher::with_markets(vec![
            json!({}),
        ])));
        assert!(service.probe().await);
    }
}
