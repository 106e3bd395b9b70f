//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`            - Short link redirect
//! - `GET  /health`            - Health check: database, cache, click queue
//! - `GET  /metrics`           - Prometheus text exposition
//! - `GET  /metrics/summary`   - Redirect SLO summary (JSON)
//! - `/api/*`                  - Link management
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{
    health_handler, metrics_handler, metrics_summary_handler, redirect_handler,
};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// All routes with tracing, without path normalization.
///
/// Static routes win over the `/{code}` capture, so `health` and `metrics`
/// never reach the resolver; both are also reserved words for aliases.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/metrics/summary", get(metrics_summary_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api", api::routes::api_routes())
        .with_state(state)
        .layer(tracing::layer())
}
