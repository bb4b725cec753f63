//! HTTP API handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::response::{ok, timestamp, ApiError};
use crate::config::{Config, PublicConfig};
use crate::market::{MarketFetcher, MarketInfo, MarketService};
use crate::metrics::LatencyTimer;
use crate::query::{
    categories, find_market, stats, validate_limit, CategorySummary, MarketStats, QueryEngine,
    QueryOptions,
};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Fetch-and-normalize pipeline.
    pub service: MarketService,
    /// Query engine built from the config.
    pub engine: QueryEngine,
    /// Prometheus handle when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(config: Config, fetcher: Arc<dyn MarketFetcher>) -> Self {
        Self {
            engine: QueryEngine::new(config.query_config()),
            config: Arc::new(config),
            service: MarketService::new(fetcher),
            metrics: None,
        }
    }

    /// Serve Prometheus metrics from the given handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Upstream health response.
#[derive(Debug, Serialize)]
pub struct ApiHealthResponse {
    /// Status: "healthy".
    pub status: &'static str,
    /// Whether the CLOB returned data.
    pub clob_api_connected: bool,
    /// Check time.
    pub timestamp: String,
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Application name.
    pub application: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// CLOB API base URL.
    pub clob_api_url: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Retry attempts.
    pub max_retries: u32,
    /// Default page size.
    pub default_limit: usize,
}

/// Raw `/markets` query parameters.
///
/// Kept as strings so that unparsable numbers read as absent.
#[derive(Debug, Default, Deserialize)]
pub struct MarketsParams {
    /// Page size.
    pub limit: Option<String>,
    /// 1-based page.
    pub page: Option<String>,
    /// Category filter.
    pub category: Option<String>,
    /// "true" to keep only active markets.
    pub active_only: Option<String>,
}

impl MarketsParams {
    /// Validate and convert into engine options.
    pub fn into_options(self) -> Result<QueryOptions, ApiError> {
        let limit = self.limit.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        if let Some(limit) = limit {
            validate_limit(limit)
                .map_err(|e| ApiError::bad_request("INVALID_LIMIT", e.to_string()))?;
        }

        let page = self
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(1);
        if page < 1 {
            return Err(ApiError::bad_request("INVALID_PAGE", "page must be greater than 0"));
        }

        Ok(QueryOptions {
            limit,
            page: u32::try_from(page).unwrap_or(u32::MAX),
            category: self.category.filter(|c| !c.is_empty()),
            active_only: self
                .active_only
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        })
    }
}

/// Pagination block of the markets response.
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// 1-based page.
    pub page: u32,
    /// Effective page size.
    pub limit: usize,
    /// Matching markets.
    pub total: usize,
    /// Number of pages.
    pub total_pages: usize,
    /// Whether later pages exist.
    pub has_more: bool,
}

/// Filters echoed back to the client.
#[derive(Debug, Serialize)]
pub struct FiltersApplied {
    /// Category filter.
    pub category: Option<String>,
    /// Active filter.
    pub active_only: bool,
}

/// Markets listing response.
#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    /// Markets on this page.
    pub markets: Vec<MarketInfo>,
    /// Pagination info.
    pub pagination: Pagination,
    /// Filters used.
    pub filters_applied: FiltersApplied,
}

/// Category listing response.
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    /// Categories by count.
    pub categories: Vec<CategorySummary>,
    /// Number of categories.
    pub total_categories: usize,
}

/// Statistics response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Counts.
    #[serde(flatten)]
    pub stats: MarketStats,
    /// Computation time.
    pub last_updated: String,
}

/// Liveness handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Health handler that probes the upstream.
#[instrument(skip(state))]
pub async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    let _timer = LatencyTimer::new("/api/v1/health");
    let connected = state.service.probe().await;

    ok(
        ApiHealthResponse {
            status: "healthy",
            clob_api_connected: connected,
            timestamp: timestamp(),
        },
        "service is running",
    )
}

/// Status handler - application and upstream settings.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let _timer = LatencyTimer::new("/api/v1/status");
    let config = &state.config;

    ok(
        StatusResponse {
            application: "Polymarket Markets",
            version: env!("CARGO_PKG_VERSION"),
            clob_api_url: config.clob_api_url.clone(),
            request_timeout: config.request_timeout,
            max_retries: config.max_retries,
            default_limit: config.default_limit,
        },
        "status retrieved",
    )
}

/// Non-sensitive configuration.
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let view: PublicConfig = state.config.public_view();
    ok(view, "configuration retrieved")
}

/// Paginated, filterable market listing.
#[instrument(skip(state))]
pub async fn list_markets(
    State(state): State<AppState>,
    Query(params): Query<MarketsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let _timer = LatencyTimer::new("/api/v1/markets");
    let opts = params.into_options()?;

    let markets = state.service.load(None).await;
    let page = state.engine.query(&markets, &opts);
    debug!(total = page.total, returned = page.items.len(), "Markets query served");

    let message = if markets.is_empty() {
        "no market data available".to_string()
    } else {
        format!("fetched {} markets", page.items.len())
    };

    Ok(ok(
        MarketsResponse {
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total: page.total,
                total_pages: page.total_pages,
                has_more: page.has_more,
            },
            markets: page.items,
            filters_applied: FiltersApplied {
                category: opts.category,
                active_only: opts.active_only,
            },
        },
        message,
    ))
}

/// Single market by market or condition ID.
#[instrument(skip(state))]
pub async fn market_detail(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let _timer = LatencyTimer::new("/api/v1/markets/:market_id");
    let markets = state.service.load(None).await;

    if markets.is_empty() {
        return Err(ApiError::not_found("NO_MARKETS_DATA", "no market data available"));
    }

    let market = find_market(&markets, &market_id).cloned().ok_or_else(|| {
        ApiError::not_found("MARKET_NOT_FOUND", format!("market not found: {}", market_id))
    })?;

    Ok(ok(market, "market retrieved"))
}

/// Category listing.
pub async fn market_categories(State(state): State<AppState>) -> impl IntoResponse {
    let _timer = LatencyTimer::new("/api/v1/markets/categories");
    let markets = state.service.load(None).await;
    let listing = categories(&markets);

    let message = if markets.is_empty() {
        "no market data available".to_string()
    } else {
        format!("found {} categories", listing.len())
    };

    ok(
        CategoriesResponse {
            total_categories: listing.len(),
            categories: listing,
        },
        message,
    )
}

/// Aggregate statistics.
pub async fn market_stats(State(state): State<AppState>) -> impl IntoResponse {
    let _timer = LatencyTimer::new("/api/v1/markets/stats");
    let markets = state.service.load(None).await;

    ok(
        StatsResponse {
            stats: stats(&markets),
            last_updated: timestamp(),
        },
        "statistics computed",
    )
}

/// Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => ApiError::not_found("METRICS_DISABLED", "metrics are disabled").into_response(),
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "the requested resource does not exist")
}
