//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::application::services::{LinkService, RedirectService};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::{CacheBackend, CacheSettings, CacheStore};
use crate::metrics::MetricsRecorder;

/// Handles to the services and collaborators behind the HTTP surface.
///
/// Cheap to clone: every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<RedirectService>,
    pub link_service: Arc<LinkService>,
    pub repository: Arc<dyn LinkRepository>,
    pub cache: Arc<CacheStore>,
    pub metrics: Arc<MetricsRecorder>,
    pub click_sender: mpsc::Sender<ClickEvent>,
    /// Public origin without trailing slash, e.g. `https://sho.rt`.
    pub base_url: Arc<str>,
    pub db_timeout: Duration,
}

impl AppState {
    /// Wires the cache store and services around the given collaborators.
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache_backend: Arc<dyn CacheBackend>,
        cache_settings: CacheSettings,
        metrics: Arc<MetricsRecorder>,
        db_timeout: Duration,
        click_sender: mpsc::Sender<ClickEvent>,
        base_url: &str,
    ) -> Self {
        let cache = Arc::new(CacheStore::new(
            cache_backend,
            metrics.clone(),
            cache_settings,
        ));

        let redirect_service = RedirectService::new(
            cache.clone(),
            repository.clone(),
            metrics.clone(),
            db_timeout,
        )
        .with_click_sender(click_sender.clone());

        let link_service = LinkService::new(repository.clone(), cache.clone());

        Self {
            redirect_service: Arc::new(redirect_service),
            link_service: Arc::new(link_service),
            repository,
            cache,
            metrics,
            click_sender,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            db_timeout,
        }
    }

    /// Absolute short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}
