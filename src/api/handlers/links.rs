//! Handlers for link management endpoints (update, delete).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::shorten::LinkResponse;
use crate::api::dto::update_link::UpdateLinkRequest;
use crate::api::handlers::shorten::link_response;
use crate::error::AppError;
use crate::state::AppState;

/// Partially updates a short link.
///
/// # Endpoint
///
/// `PATCH /api/links/{code}`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://new-destination.com",
///   "permanent": false
/// }
/// ```
///
/// Both cache tiers are invalidated, so the next redirect reads the new
/// destination from the link store.
///
/// # Errors
///
/// Returns 404 Not Found if no live link owns `code`.
/// Returns 400 Bad Request if validation fails or the body is empty.
pub async fn update_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state.link_service.update(&code, payload.into()).await?;

    Ok(Json(link_response(&state, link)))
}

/// Soft-deletes a short link.
///
/// # Endpoint
///
/// `DELETE /api/links/{code}`
///
/// The code stays reserved; redirects answer 404 once the cache entry is
/// invalidated, which happens before this handler returns.
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist or is already deleted.
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
