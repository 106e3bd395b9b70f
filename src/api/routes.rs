//! API route configuration.
//!
//! These routes mutate links and carry no authentication of their own; deploy
//! them behind an authenticating gateway.

use crate::api::handlers::{delete_link_handler, shorten_handler, update_link_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{patch, post},
};

/// Link management routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /shorten`        - Create a short link
/// - `PATCH  /links/{code}`   - Partially update a link
/// - `DELETE /links/{code}`   - Soft-delete a link
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route(
            "/links/{code}",
            patch(update_link_handler).delete(delete_link_handler),
        )
}
