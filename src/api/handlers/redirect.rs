//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::application::services::Resolution;
use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Responses
///
/// - **301 Moved Permanently** / **302 Found** with `Location`
/// - **404 Not Found** if the code is unknown or deleted
/// - **503 Service Unavailable** if the link store failed or timed out
///
/// Resolution order and caching are handled by
/// [`crate::application::services::RedirectService`]. Successful redirects
/// queue a click event; a full queue drops the click, never the redirect.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let click = ClickEvent::new(
        code.clone(),
        client_ip(&headers),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    );

    match state.redirect_service.resolve(&code, Some(click)).await {
        Resolution::Redirect { url, permanent, .. } => {
            let status = if permanent {
                StatusCode::MOVED_PERMANENTLY
            } else {
                StatusCode::FOUND
            };
            (status, [(header::LOCATION, url)]).into_response()
        }
        Resolution::NotFound => {
            AppError::not_found("Short link not found", json!({ "code": code })).into_response()
        }
        Resolution::Unavailable => AppError::unavailable(
            "Link lookup is temporarily unavailable, retry later",
            json!({ "code": code }),
        )
        .into_response(),
    }
}

/// Client address as reported by the fronting proxy.
///
/// Prefers the first `X-Forwarded-For` hop, then `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
