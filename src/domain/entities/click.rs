//! Click record persisted by the click worker.

use chrono::{DateTime, Utc};

/// A click ready to be written to the link store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub code: String,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub ip: Option<String>,
}
