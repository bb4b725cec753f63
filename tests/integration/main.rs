//! End-to-end tests for the fetch, normalize and query pipeline.
//!
//! The live test talks to the real CLOB API.
//! Run with: cargo test --test integration -- --ignored

use std::sync::Arc;

use serde_json::json;

use polymarket_markets::config::Config;
use polymarket_markets::market::mock::MockMarketFetcher;
use polymarket_markets::market::normalize::{NO_DATA, PARSE_ERROR_TITLE, UNDETERMINED};
use polymarket_markets::market::{ClobClient, MarketService, MockMarketBuilder};
use polymarket_markets::query::{categories, find_market, stats, QueryEngine, QueryOptions};

fn upstream() -> MockMarketFetcher {
    MockMarketFetcher::with_markets(vec![
        MockMarketBuilder::new("Will the Lakers win the NBA title?", "0xsports")
            .active()
            .token("Yes", json!("0.35"), false)
            .token("No", json!(0.65), false)
            .build(),
        MockMarketBuilder::new("Will BTC close above 100k?", "0xcrypto")
            .closed()
            .field("end_date_iso", json!("2024-12-31T23:59:59Z"))
            .token("Yes", json!(1), true)
            .token("No", json!(0), false)
            .build(),
        MockMarketBuilder::new("Who wins the election?", "0xpolitics")
            .active()
            .field("category", json!("US-Politics"))
            .build(),
        json!("not a market"),
    ])
}

#[tokio::test]
async fn pipeline_normalizes_every_record() {
    let service = MarketService::new(Arc::new(upstream()));
    let markets = service.load(None).await;

    assert_eq!(markets.len(), 4);

    let sports = &markets[0];
    assert_eq!(sports.category, "sports");
    assert_eq!(sports.current_price, 0.35);
    assert_eq!(sports.price_range, "0.3500 - 0.6500");
    assert_eq!(sports.winning_outcome, UNDETERMINED);
    assert_eq!(sports.total_tokens, 2);

    let crypto = &markets[1];
    assert_eq!(crypto.category, "crypto");
    assert_eq!(crypto.winning_outcome, "Yes");
    assert_eq!(crypto.end_date_formatted, "2024-12-31 23:59:59");
    assert!(crypto.closed);

    let politics = &markets[2];
    assert_eq!(politics.category, "US-Politics");
    assert_eq!(politics.price_range, NO_DATA);

    assert_eq!(markets[3].title, PARSE_ERROR_TITLE);
}

#[tokio::test]
async fn pipeline_queries_and_aggregates() {
    let service = MarketService::new(Arc::new(upstream()));
    let markets = service.load(None).await;
    let engine = QueryEngine::default();

    let page = engine.query(&markets, &QueryOptions::new().active_only(true));
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|m| m.active));

    let page = engine.query(&markets, &QueryOptions::new().category("CRYPTO"));
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].condition_id, "0xcrypto");

    let page = engine.query(&markets, &QueryOptions::new().limit(1).page(2));
    assert_eq!(page.total_pages, 4);
    assert!(page.has_more);
    assert_eq!(page.items[0].condition_id, "0xcrypto");

    let totals = stats(&markets);
    assert_eq!(totals.total, 4);
    assert_eq!(totals.active_count, 2);
    assert_eq!(totals.closed_count, 1);

    let listing = categories(&markets);
    assert_eq!(listing.len(), 4);
    assert_eq!(listing.iter().map(|c| c.count).sum::<usize>(), 4);

    assert!(find_market(&markets, "0xpolitics").is_some());
    assert!(find_market(&markets, "missing").is_none());
}

/// Fetch real listings from the public CLOB API.
#[tokio::test]
#[ignore = "requires network access"]
async fn live_clob_listing_normalizes() {
    dotenvy::dotenv().ok();
    let config = Config::load().unwrap_or_default();

    let client = ClobClient::new(&config).expect("client should build");
    let service = MarketService::new(Arc::new(client));

    let markets = service.try_load(Some(20)).await.expect("fetch should succeed");
    println!("Fetched {} markets", markets.len());
    assert!(markets.len() <= 20);

    for market in &markets {
        assert!(!market.title.is_empty());
        assert!(market.current_price.is_finite());
        println!("  {} [{}] {}", market.condition_id, market.category, market.status_label());
    }
}
