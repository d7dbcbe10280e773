//! HTTP route handlers.
//!
//! The service exposes a single route. Request tracing is enabled via middleware
//! that generates a unique request ID for each incoming request.

pub mod health;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_HEALTH;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router.
pub fn create_router(state: AppState) -> Router {
    // Health report - never cached, every hit must reach the backing stores
    let health_routes = Router::new()
        .route("/", get(health::report))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    Router::new()
        .merge(health_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
