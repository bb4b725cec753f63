//! Market module for Polymarket CLOB listings.
//!
//! This module handles:
//! - Raw and canonical market types
//! - Normalization of untrusted upstream records
//! - The CLOB listing client
//! - Mock fetcher for testing

pub mod client;
pub mod mock;
pub mod normalize;
pub mod service;
pub mod types;

pub use client::{ClobClient, MarketFetcher};
pub use mock::{MockMarketBuilder, MockMarketFetcher};
pub use normalize::{coerce_price, extract_category, normalize, normalize_value};
pub use service::MarketService;
pub use types::{KnownCategory, MarketInfo, RawMarket, RawToken};
