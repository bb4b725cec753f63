//! HTTP API route definitions.

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{
    api_health, get_config, health, list_markets, market_categories, market_detail, market_stats,
    metrics, not_found, status, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(api_health))
        .route("/status", get(status))
        .route("/config", get(get_config))
        .route("/markets", get(list_markets))
        .route("/markets/stats", get(market_stats))
        .route("/markets/categories", get(market_categories))
        .route("/markets/:market_id", get(market_detail));

    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        // Liveness
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS restricted to the configured origins, read-only methods.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
