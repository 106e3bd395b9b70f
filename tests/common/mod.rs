#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use link_resolver::domain::click_event::ClickEvent;
use link_resolver::domain::entities::{Link, LinkPatch, LinkTarget, NewClick, NewLink};
use link_resolver::domain::repositories::LinkRepository;
use link_resolver::error::RepositoryError;
use link_resolver::infrastructure::cache::{
    CacheBackend, CacheError, CacheResult, CacheSettings, MemoryBackend,
};
use link_resolver::metrics::MetricsRecorder;
use link_resolver::state::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const DB_TIMEOUT: Duration = Duration::from_millis(100);
pub const CACHE_TIMEOUT: Duration = Duration::from_millis(50);
pub const BASE_URL: &str = "https://sho.rt";

/// In-memory link store that counts lookups and can be made to fail or stall.
#[derive(Default)]
pub struct InMemoryRepository {
    links: Mutex<HashMap<String, Link>>,
    clicks: Mutex<Vec<NewClick>>,
    next_id: AtomicUsize,
    lookups: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(self, code: &str, url: &str, permanent: bool) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        self.links.lock().unwrap().insert(
            code.to_string(),
            Link {
                id,
                code: code.to_string(),
                long_url: url.to_string(),
                permanent,
                created_at: Utc::now(),
                deleted_at: None,
            },
        );
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> Vec<NewClick> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    async fn pause(&self) -> Result<(), RepositoryError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LinkRepository for InMemoryRepository {
    async fn exists(&self, code: &str) -> Result<bool, RepositoryError> {
        self.pause().await?;
        Ok(self.links.lock().unwrap().contains_key(code))
    }

    async fn lookup(&self, code: &str) -> Result<Option<LinkTarget>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        Ok(self
            .links
            .lock()
            .unwrap()
            .get(code)
            .filter(|l| !l.is_deleted())
            .map(Link::target))
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, RepositoryError> {
        self.pause().await?;
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&new_link.code) {
            return Err(RepositoryError::Conflict(new_link.code));
        }

        let link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
            code: new_link.code.clone(),
            long_url: new_link.long_url,
            permanent: new_link.permanent,
            created_at: Utc::now(),
            deleted_at: None,
        };
        links.insert(new_link.code, link.clone());
        Ok(link)
    }

    async fn update(&self, code: &str, patch: LinkPatch) -> Result<Option<Link>, RepositoryError> {
        self.pause().await?;
        let mut links = self.links.lock().unwrap();
        let Some(link) = links.get_mut(code).filter(|l| !l.is_deleted()) else {
            return Ok(None);
        };

        if let Some(url) = patch.url {
            link.long_url = url;
        }
        if let Some(permanent) = patch.permanent {
            link.permanent = permanent;
        }
        Ok(Some(link.clone()))
    }

    async fn soft_delete(&self, code: &str) -> Result<bool, RepositoryError> {
        self.pause().await?;
        let mut links = self.links.lock().unwrap();
        match links.get_mut(code).filter(|l| !l.is_deleted()) {
            Some(link) => {
                link.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_click(&self, click: NewClick) -> Result<(), RepositoryError> {
        self.pause().await?;
        self.clicks.lock().unwrap().push(click);
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.pause().await
    }
}

/// Cache backend that fails every call, as a Redis outage would.
pub struct DownBackend;

#[async_trait]
impl CacheBackend for DownBackend {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn set_with_expiry(&self, _key: &str, _value: &str, _ttl: u64) -> CacheResult<()> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::Connection("connection refused".to_string()))
    }
}

pub fn cache_settings() -> CacheSettings {
    CacheSettings {
        timeout: CACHE_TIMEOUT,
        ..CacheSettings::default()
    }
}

pub fn create_test_state(
    repository: Arc<InMemoryRepository>,
) -> (AppState, mpsc::Receiver<ClickEvent>) {
    create_test_state_with_backend(repository, Arc::new(MemoryBackend::new()))
}

pub fn create_test_state_with_backend(
    repository: Arc<InMemoryRepository>,
    backend: Arc<dyn CacheBackend>,
) -> (AppState, mpsc::Receiver<ClickEvent>) {
    let (tx, rx) = mpsc::channel(100);
    let state = AppState::new(
        repository,
        backend,
        cache_settings(),
        Arc::new(MetricsRecorder::new().unwrap()),
        DB_TIMEOUT,
        tx,
        BASE_URL,
    );
    (state, rx)
}

/// Lets spawned cache writes land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
