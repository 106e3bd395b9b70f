//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A persisted short link.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub code: String,
    pub long_url: String,
    pub permanent: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Returns true if the link has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Projection used on the redirect path.
    pub fn target(&self) -> LinkTarget {
        LinkTarget {
            url: self.long_url.clone(),
            permanent: self.permanent,
        }
    }
}

/// Destination of a redirect as returned by a persistence lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub url: String,
    /// `true` answers with 301, `false` with 302.
    pub permanent: bool,
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
    pub permanent: bool,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub url: Option<String>,
    pub permanent: Option<bool>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.permanent.is_none()
    }
}
