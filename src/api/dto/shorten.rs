//! DTOs for link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for `POST /api/shorten`.
///
/// Only the URL shape is checked here; the whole alias policy (length,
/// characters, reserved words, restricted content) is enforced by the link
/// service so every rejection carries its specific message.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL to shorten (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional custom alias.
    pub custom_alias: Option<String>,

    /// `true` (default) answers with 301, `false` with 302.
    pub permanent: Option<bool>,
}

/// A created or updated link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub code: String,
    pub short_url: String,
    pub long_url: String,
    pub permanent: bool,
    pub created_at: DateTime<Utc>,
}
