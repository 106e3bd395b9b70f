//! Handler for link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{LinkResponse, ShortenRequest};
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/spring",
///   "custom_alias": "spring-sale",   // optional
///   "permanent": false               // optional, default true
/// }
/// ```
///
/// # Response
///
/// **201 Created**
///
/// ```json
/// {
///   "code": "spring-sale",
///   "short_url": "https://sho.rt/spring-sale",
///   "long_url": "https://example.com/spring",
///   "permanent": false,
///   "created_at": "2026-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - **400** invalid URL or alias
/// - **409** alias already taken
/// - **503** no free generated code
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create(
            &payload.url,
            payload.custom_alias.as_deref(),
            payload.permanent,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(link_response(&state, link))))
}

pub(crate) fn link_response(state: &AppState, link: Link) -> LinkResponse {
    LinkResponse {
        short_url: state.short_url(&link.code),
        code: link.code,
        long_url: link.long_url,
        permanent: link.permanent,
        created_at: link.created_at,
    }
}
