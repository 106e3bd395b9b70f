//! Click event model for asynchronous click tracking.

use chrono::Utc;

use crate::domain::entities::NewClick;

/// A click captured on the redirect path.
///
/// Events are sent to a bounded channel with `try_send` and persisted by
/// [`crate::domain::click_worker::run_click_worker`], so the redirect never
/// waits on the click write.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub code: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub ip: Option<String>,
}

impl ClickEvent {
    pub fn new(
        code: String,
        ip: Option<String>,
        user_agent: Option<&str>,
        referer: Option<&str>,
    ) -> Self {
        Self {
            code,
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
            referer: referer.map(|s| s.to_string()),
        }
    }

    /// Stamps the event with the current time for persistence.
    pub fn into_new_click(self) -> NewClick {
        NewClick {
            code: self.code,
            clicked_at: Utc::now(),
            user_agent: self.user_agent,
            referer: self.referer,
            ip: self.ip,
        }
    }
}
