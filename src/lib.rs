//! Polymarket CLOB market listings: fetch, normalize, query.
//!
//! Upstream records are loosely typed and frequently incomplete. Every record is
//! normalized into a [`market::MarketInfo`] with fixed sentinel values for missing
//! data, so the query layer and the HTTP API never deal with optional fields.
//!
//! ```text
//! CLOB /markets ──► MarketFetcher ──► normalize ──► QueryEngine ──► CLI / HTTP
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Market types, normalization and the CLOB client
//! - [`query`]: Filtering, pagination and statistics
//! - [`api`]: HTTP API
//! - [`export`]: JSON export
//! - [`render`]: CLI table output
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod market;
pub mod metrics;
pub mod query;
pub mod render;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
