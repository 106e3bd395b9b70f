//! Short code resolution on the redirect hot path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::{CacheStore, CachedLink};
use crate::metrics::{Counter, MetricsRecorder};
use crate::utils::alias_validator::MAX_ALIAS_LENGTH;

/// Terminal outcome of resolving one short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect {
        url: String,
        permanent: bool,
        cache_hit: bool,
    },
    NotFound,
    /// The link store failed or missed its deadline.
    Unavailable,
}

impl Resolution {
    pub fn status_code(&self) -> u16 {
        match self {
            Resolution::Redirect { permanent: true, .. } => 301,
            Resolution::Redirect { permanent: false, .. } => 302,
            Resolution::NotFound => 404,
            Resolution::Unavailable => 503,
        }
    }

    pub fn cache_hit(&self) -> bool {
        matches!(self, Resolution::Redirect { cache_hit: true, .. })
    }
}

/// Resolves short codes through the negative cache, the positive cache,
/// and finally the link store.
///
/// # Flow
///
/// 1. Negative entry present: `404` without touching the store
/// 2. Positive entry present: `301`/`302` served from cache
/// 3. Store lookup bounded by `db_timeout`:
///    - found: redirect and warm the positive tier in the background
///    - absent: `404` and warm the negative tier in the background
///    - error or timeout: `503`, no cache writes
///
/// Cache failures never fail a request; they read as misses. Every request
/// ends in exactly one [`MetricsRecorder::record_redirect`] call.
pub struct RedirectService {
    cache: Arc<CacheStore>,
    repository: Arc<dyn LinkRepository>,
    metrics: Arc<MetricsRecorder>,
    db_timeout: Duration,
    click_sender: Option<mpsc::Sender<ClickEvent>>,
}

impl RedirectService {
    pub fn new(
        cache: Arc<CacheStore>,
        repository: Arc<dyn LinkRepository>,
        metrics: Arc<MetricsRecorder>,
        db_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            repository,
            metrics,
            db_timeout,
            click_sender: None,
        }
    }

    /// Enables click tracking through the given queue.
    pub fn with_click_sender(mut self, sender: mpsc::Sender<ClickEvent>) -> Self {
        self.click_sender = Some(sender);
        self
    }

    /// Resolves `code` and records the outcome.
    ///
    /// When the outcome is a redirect and `click` is given, the click is
    /// queued with `try_send` and dropped if the queue is full.
    pub async fn resolve(&self, code: &str, click: Option<ClickEvent>) -> Resolution {
        let started = Instant::now();
        let resolution = self.lookup(code).await;

        self.metrics.record_redirect(
            resolution.status_code(),
            resolution.cache_hit(),
            started.elapsed().as_secs_f64() * 1000.0,
        );

        if matches!(resolution, Resolution::Redirect { .. })
            && let Some(event) = click
        {
            self.track_click(event);
        }

        resolution
    }

    async fn lookup(&self, code: &str) -> Resolution {
        if !is_well_formed(code) {
            debug!(code = %code, "Rejecting malformed short code");
            return Resolution::NotFound;
        }

        if self.cache.is_not_found(code).await {
            self.metrics.increment(Counter::NegativeCacheHit);
            debug!(code = %code, "Negative cache HIT");
            return Resolution::NotFound;
        }

        if let Some(link) = self.cache.get(code).await {
            return Resolution::Redirect {
                url: link.url,
                permanent: link.permanent,
                cache_hit: true,
            };
        }

        self.metrics.increment(Counter::DbFallback);

        match timeout(self.db_timeout, self.repository.lookup(code)).await {
            Ok(Ok(Some(target))) => {
                self.cache.set(
                    code,
                    CachedLink::new(target.url.clone(), target.permanent),
                    None,
                );
                Resolution::Redirect {
                    url: target.url,
                    permanent: target.permanent,
                    cache_hit: false,
                }
            }
            Ok(Ok(None)) => {
                self.cache.set_not_found(code);
                Resolution::NotFound
            }
            Ok(Err(e)) => {
                self.metrics.increment(Counter::DbError);
                warn!(code = %code, error = %e, "Link lookup failed");
                Resolution::Unavailable
            }
            Err(_) => {
                self.metrics.increment(Counter::DbTimeout);
                warn!(
                    code = %code,
                    timeout_ms = self.db_timeout.as_millis() as u64,
                    "Link lookup timed out"
                );
                Resolution::Unavailable
            }
        }
    }

    fn track_click(&self, event: ClickEvent) {
        let Some(sender) = &self.click_sender else {
            return;
        };

        if let Err(e) = sender.try_send(event) {
            warn!(error = %e, "Click queue full, dropping click");
        }
    }
}

/// Cheap shape check that keeps garbage paths out of the cache and the store.
fn is_well_formed(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_ALIAS_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
