//! Mock market fetcher for unit testing.
//!
//! This module provides a fetcher that serves canned records without
//! making real network requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::MarketFetcher;
use crate::error::FetchError;

/// Configuration for mock fetcher behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether every fetch should fail.
    pub fail_fetch: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// Mock market fetcher for testing.
#[derive(Debug, Clone, Default)]
pub struct MockMarketFetcher {
    /// Mock configuration.
    config: MockConfig,
    /// Raw records served by every fetch.
    markets: Arc<Mutex<Vec<Value>>>,
    /// Number of fetch calls made.
    calls: Arc<AtomicUsize>,
}

impl MockMarketFetcher {
    /// Create an empty mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock fetcher serving the given records.
    pub fn with_markets(markets: Vec<Value>) -> Self {
        Self {
            markets: Arc::new(Mutex::new(markets)),
            ..Self::default()
        }
    }

    /// Create a mock fetcher with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Append a raw record.
    pub fn add_market(&self, market: Value) {
        if let Ok(mut markets) = self.markets.lock() {
            markets.push(market);
        }
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketFetcher for MockMarketFetcher {
    async fn fetch_markets(&self, limit: Option<usize>) -> Result<Vec<Value>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if self.config.fail_fetch {
            return Err(FetchError::Status {
                status: 503,
                url: "mock://markets".to_string(),
            });
        }

        let markets = self
            .markets
            .lock()
            .map_err(|_| FetchError::Parse("mock market store poisoned".to_string()))?;
        let take = limit.unwrap_or(markets.len());
        Ok(markets.iter().take(take).cloned().collect())
    }
}

/// Builder for raw market records with common shapes.
#[derive(Debug, Clone)]
pub struct MockMarketBuilder {
    record: serde_json::Map<String, Value>,
    tokens: Vec<Value>,
}

impl MockMarketBuilder {
    /// Start a record with the given question and condition ID.
    pub fn new(question: impl Into<String>, condition_id: impl Into<String>) -> Self {
        let mut record = serde_json::Map::new();
        record.insert("question".to_string(), Value::String(question.into()));
        record.insert("condition_id".to_string(), Value::String(condition_id.into()));
        Self {
            record,
            tokens: Vec::new(),
        }
    }

    /// Set an arbitrary field.
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.record.insert(key.to_string(), value);
        self
    }

    /// Mark active and accepting orders.
    pub fn active(self) -> Self {
        self.field("active", json!(true))
            .field("accepting_orders", json!(true))
    }

    /// Mark closed.
    pub fn closed(self) -> Self {
        self.field("active", json!(false)).field("closed", json!(true))
    }

    /// Add an outcome token.
    pub fn token(mut self, outcome: &str, price: Value, winner: bool) -> Self {
        self.tokens.push(json!({
            "outcome": outcome,
            "price": price,
            "token_id": format!("token-{}", self.tokens.len() + 1),
            "winner": winner,
        }));
        self
    }

    /// Build the raw JSON record.
    pub fn build(mut self) -> Value {
        if !self.tokens.is_empty() {
            self.record
                .insert("tokens".to_string(), Value::Array(self.tokens));
        }
        Value::Object(self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_fetcher_serves_markets() {
        let fetcher = MockMarketFetcher::with_markets(vec![json!({"question": "A"})]);
        fetcher.add_market(json!({"question": "B"}));

        let all = fetcher.fetch_markets(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let one = fetcher.fetch_markets(Some(1)).await.unwrap();
        assert_eq!(one, vec![json!({"question": "A"})]);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn mock_fetcher_failure_mode() {
        let fetcher = MockMarketFetcher::with_config(MockConfig {
            fail_fetch: true,
            ..Default::default()
        });

        assert!(fetcher.fetch_markets(None).await.is_err());
    }

    #[tokio::test]
    async fn mock_fetcher_simulates_latency() {
        let fetcher = MockMarketFetcher::with_config(MockConfig {
            latency_ms: 20,
            ..Default::default()
        });
        fetcher.add_market(json!({"question": "A"}));

        let start = std::time::Instant::now();
        let markets = fetcher.fetch_markets(None).await.unwrap();

        assert!(start.elapsed() >= std::time::Duration::from_millis(20));
        assert_eq!(markets.len(), 1);
    }

    #[test]
    fn mock_market_builder() {
        let market = MockMarketBuilder::new("Will BTC hit 100k?", "0xabc")
            .active()
            .token("Yes", json!("0.7"), false)
            .token("No", json!(0.3), false)
            .build();

        assert_eq!(market["question"], "Will BTC hit 100k?");
        assert_eq!(market["active"], true);
        assert_eq!(market["tokens"][1]["token_id"], "token-2");
    }
}
