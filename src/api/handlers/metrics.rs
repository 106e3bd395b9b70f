//! Handlers for metrics exposition.

use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde_json::json;

use crate::error::AppError;
use crate::metrics::MetricsSummary;
use crate::state::AppState;

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Serves counters and histograms for scraping.
///
/// # Endpoint
///
/// `GET /metrics`
pub async fn metrics_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render().map_err(|e| {
        tracing::error!(error = %e, "Failed to encode metrics");
        AppError::internal("Failed to encode metrics", json!({}))
    })?;

    Ok(([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body))
}

/// Serves the redirect SLO summary.
///
/// # Endpoint
///
/// `GET /metrics/summary`
///
/// # Response
///
/// ```json
/// {
///   "total_requests": 1200,
///   "cache_hit_rate": 0.97,
///   "avg_latency_ms": 1.8,
///   "p50_latency_ms": 1.0,
///   "p99_latency_ms": 10.0
/// }
/// ```
pub async fn metrics_summary_handler(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.metrics.summary())
}
