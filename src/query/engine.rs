//! Filtering and pagination over canonical market lists.

use serde::{Deserialize, Serialize};

use crate::config::MAX_LIMIT;
use crate::error::{AppError, Result};
use crate::market::MarketInfo;

/// Engine settings taken from the application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Page size used when the request gives none.
    pub default_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

/// Per-request query options, already validated by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Page size; `None` uses the default, `-1` means everything.
    pub limit: Option<i64>,
    /// 1-based page number.
    pub page: u32,
    /// Case-insensitive category filter.
    pub category: Option<String>,
    /// Keep only active markets.
    pub active_only: bool,
}

impl QueryOptions {
    /// First page with default limit and no filters.
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    /// Set the page size.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Filter by category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Keep only active markets.
    pub fn active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Markets on this page.
    pub items: Vec<MarketInfo>,
    /// 1-based page number.
    pub page: u32,
    /// Effective page size.
    pub limit: usize,
    /// Markets matching the filters.
    pub total: usize,
    /// Number of pages.
    pub total_pages: usize,
    /// Whether later pages exist.
    pub has_more: bool,
}

/// Stateless query engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine {
    config: QueryConfig,
}

impl QueryEngine {
    /// Create an engine with the given settings.
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Engine settings.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Filter and paginate `items`.
    pub fn query(&self, items: &[MarketInfo], opts: &QueryOptions) -> Page {
        let filtered: Vec<&MarketInfo> = items
            .iter()
            .filter(|m| match &opts.category {
                Some(category) => m.category.to_lowercase() == category.to_lowercase(),
                None => true,
            })
            .filter(|m| !opts.active_only || m.active)
            .collect();

        let total = filtered.len();
        let limit = opts
            .limit
            .unwrap_or(self.config.default_limit as i64);
        // Non-positive limits collapse to a single page holding everything,
        // whatever page was asked for.
        let unlimited = limit <= 0;
        let page_size = if unlimited { total } else { limit as usize };

        let total_pages = if page_size > 0 {
            total.div_ceil(page_size)
        } else {
            1
        };

        let page = if unlimited { 1 } else { opts.page.max(1) };
        let start = (page as usize - 1).saturating_mul(page_size);
        let end = start.saturating_add(page_size);

        let items = filtered
            .iter()
            .skip(start)
            .take(page_size)
            .map(|m| (*m).clone())
            .collect();

        Page {
            items,
            page,
            limit: page_size,
            total,
            total_pages,
            has_more: end < total,
        }
    }
}

/// Accept `-1` (everything) or a page size in `1..=MAX_LIMIT`.
pub fn validate_limit(limit: i64) -> Result<i64> {
    if limit == -1 || (1..=MAX_LIMIT as i64).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::InvalidQuery(format!(
            "limit must be between 1 and {}, or -1 for all",
            MAX_LIMIT
        )))
    }
}

/// Find a market by market ID or condition ID.
pub fn find_market<'a>(items: &'a [MarketInfo], id: &str) -> Option<&'a MarketInfo> {
    items.iter().find(|m| m.matches_id(id))
}
