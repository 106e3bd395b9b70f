//! Handler for health check endpoint.

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use tokio::time::timeout;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Upper bound for the database check.
const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: database and click queue are healthy; the cache may be
///   degraded, since redirects keep working without it
/// - **503 Service Unavailable**: the database or the click queue is down
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "Connected" },
///     "click_queue": { "status": "ok", "message": "Capacity: 10000" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let cache = check_cache(&state).await;
    let click_queue = check_click_queue(&state);

    let serving = database.is_ok() && click_queue.is_ok();
    let status = match (serving, cache.is_ok()) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            cache,
            click_queue,
        },
    };

    if serving {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match timeout(DB_CHECK_TIMEOUT, state.repository.ping()).await {
        Ok(Ok(())) => CheckStatus::ok("Connected"),
        Ok(Err(e)) => CheckStatus::error(format!("Database error: {}", e)),
        Err(_) => CheckStatus::error("Database ping timed out"),
    }
}

/// PING bounded by the cache timeout.
async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.ping().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Cache unreachable, serving from database")
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.click_sender.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!("Capacity: {}", state.click_sender.capacity()))
    }
}
