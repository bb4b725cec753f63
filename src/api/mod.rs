//! HTTP API module for market listings, statistics and health endpoints.

pub mod handlers;
pub mod response;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
