//! DTO for the link update endpoint.

use serde::Deserialize;
use validator::Validate;

use crate::domain::entities::LinkPatch;

/// Request body for `PATCH /api/links/{code}`.
///
/// All fields are optional; only provided fields are changed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    /// New destination URL for this link.
    #[validate(url(message = "Invalid URL format"))]
    pub url: Option<String>,

    /// Change redirect type: `true` = 301, `false` = 302.
    pub permanent: Option<bool>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(request: UpdateLinkRequest) -> Self {
        LinkPatch {
            url: request.url,
            permanent: request.permanent,
        }
    }
}
