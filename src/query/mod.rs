//! Query engine over canonical market lists.
//!
//! Filtering, pagination, aggregate statistics and the category listing.
//! Everything here is pure and synchronous; callers validate request bounds.

pub mod engine;
pub mod stats;

pub use engine::{find_market, validate_limit, Page, QueryConfig, QueryEngine, QueryOptions};
pub use stats::{categories, stats, CategorySummary, MarketStats};
