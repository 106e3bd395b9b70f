//! Two-tier, fail-open cache store.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::backend::{CacheBackend, CacheResult};
use super::keys::{DEFAULT_NAMESPACE, KeySchema};
use crate::metrics::{Counter, MetricsRecorder};

/// Value stored under a negative-cache key.
pub const NOT_FOUND_SENTINEL: &str = "1";

/// Denormalized copy of a link held by the positive cache tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLink {
    pub url: String,
    pub permanent: bool,
    pub cached_at: DateTime<Utc>,
}

impl CachedLink {
    pub fn new(url: impl Into<String>, permanent: bool) -> Self {
        Self {
            url: url.into(),
            permanent,
            cached_at: Utc::now(),
        }
    }
}

/// Tunables for [`CacheStore`], loaded once from configuration.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Base TTL of positive entries.
    pub ttl_seconds: u64,
    /// Base TTL of negative entries; shorter than `ttl_seconds`.
    pub not_found_ttl_seconds: u64,
    /// Deadline applied to every backend call.
    pub timeout: Duration,
    /// Jitter fraction `J`; effective TTLs fall in `[B(1-J), B(1+J)]`.
    pub ttl_jitter: f64,
    pub namespace: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            not_found_ttl_seconds: 300,
            timeout: Duration::from_millis(50),
            ttl_jitter: 0.1,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// Positive and negative cache tiers over a [`CacheBackend`].
///
/// Every operation is bounded by [`CacheSettings::timeout`] and fail-open:
/// backend errors, timeouts, and undecodable payloads degrade to a miss (or
/// `false`) and are logged and counted, never returned. Callers therefore
/// cannot tell a miss from a degraded cache; both fall back to the link store.
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    metrics: Arc<MetricsRecorder>,
    keys: KeySchema,
    settings: CacheSettings,
}

impl CacheStore {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        metrics: Arc<MetricsRecorder>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            backend,
            metrics,
            keys: KeySchema::new(&settings.namespace),
            settings,
        }
    }

    pub fn keys(&self) -> &KeySchema {
        &self.keys
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Races `op` against the configured deadline.
    ///
    /// `tokio::time::timeout` drops the timer on both the success and the
    /// timeout path.
    async fn bounded<T>(
        &self,
        op: &'static str,
        code: &str,
        fut: impl Future<Output = CacheResult<T>>,
    ) -> Option<T> {
        match timeout(self.settings.timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                self.metrics.increment(Counter::CacheError);
                warn!(op, code = %code, error = %e, "Cache backend error");
                None
            }
            Err(_) => {
                self.metrics.increment(Counter::CacheTimeout);
                warn!(
                    op,
                    code = %code,
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    "Cache operation timed out"
                );
                None
            }
        }
    }

    /// Reads the positive entry for `code`.
    ///
    /// Returns `None` on a miss, a backend error, a timeout, or a payload
    /// that cannot be decoded.
    pub async fn get(&self, code: &str) -> Option<CachedLink> {
        let started = Instant::now();
        let key = self.keys.link_key(code);

        let raw = self
            .bounded("get", code, self.backend.get(&key))
            .await
            .flatten();

        let link = raw.and_then(|raw| match serde_json::from_str::<CachedLink>(&raw) {
            Ok(link) => Some(link),
            Err(e) => {
                warn!(code = %code, error = %e, "Discarding malformed cache entry");
                None
            }
        });

        self.metrics
            .record_cache_latency(elapsed_ms(started), link.is_some());

        match &link {
            Some(_) => debug!(code = %code, "Cache HIT"),
            None => debug!(code = %code, "Cache MISS"),
        }

        link
    }

    /// Returns `true` only if the negative entry for `code` holds the sentinel.
    ///
    /// Errors and timeouts answer `false`, so a degraded cache never
    /// reports a link as missing.
    pub async fn is_not_found(&self, code: &str) -> bool {
        let key = self.keys.not_found_key(code);

        self.bounded("is_not_found", code, self.backend.get(&key))
            .await
            .flatten()
            .is_some_and(|value| value == NOT_FOUND_SENTINEL)
    }

    /// Writes the positive entry and waits for the outcome.
    ///
    /// Uses the configured TTL unless `ttl_seconds` overrides it; jitter is
    /// applied either way. Returns whether the write succeeded.
    pub async fn write_link(&self, code: &str, link: &CachedLink, ttl_seconds: Option<u64>) -> bool {
        let payload = match serde_json::to_string(link) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(code = %code, error = %e, "Failed to serialize cache entry");
                return false;
            }
        };

        let key = self.keys.link_key(code);
        let ttl = jittered_ttl(
            ttl_seconds.unwrap_or(self.settings.ttl_seconds),
            self.settings.ttl_jitter,
        );

        let written = self
            .bounded("set", code, self.backend.set_with_expiry(&key, &payload, ttl))
            .await
            .is_some();

        if written {
            debug!(code = %code, ttl, "Cache SET");
        }
        written
    }

    /// Writes the negative sentinel and waits for the outcome.
    pub async fn write_not_found(&self, code: &str) -> bool {
        let key = self.keys.not_found_key(code);
        let ttl = jittered_ttl(
            self.settings.not_found_ttl_seconds,
            self.settings.ttl_jitter,
        );

        let written = self
            .bounded(
                "set_not_found",
                code,
                self.backend.set_with_expiry(&key, NOT_FOUND_SENTINEL, ttl),
            )
            .await
            .is_some();

        if written {
            debug!(code = %code, ttl, "Negative cache SET");
        }
        written
    }

    /// Fire-and-forget variant of [`CacheStore::write_link`].
    ///
    /// The write runs on a spawned task; callers on the request path drop
    /// the handle instead of awaiting it.
    pub fn set(self: &Arc<Self>, code: &str, link: CachedLink, ttl_seconds: Option<u64>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let code = code.to_string();

        tokio::spawn(async move {
            store.write_link(&code, &link, ttl_seconds).await;
        })
    }

    /// Fire-and-forget variant of [`CacheStore::write_not_found`].
    pub fn set_not_found(self: &Arc<Self>, code: &str) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let code = code.to_string();

        tokio::spawn(async move {
            store.write_not_found(&code).await;
        })
    }

    /// Removes the positive and negative entries for `code`.
    ///
    /// Used when a link is updated or deleted. Returns whether both deletes
    /// succeeded.
    pub async fn invalidate(&self, code: &str) -> bool {
        let link_key = self.keys.link_key(code);
        let removed_link = self
            .bounded("invalidate", code, self.backend.delete(&link_key))
            .await
            .is_some();

        let removed_marker = self.clear_not_found(code).await;

        if removed_link {
            debug!(code = %code, "Cache INVALIDATE");
        }
        removed_link && removed_marker
    }

    /// Removes the negative entry for `code`, e.g. right after the link is created.
    pub async fn clear_not_found(&self, code: &str) -> bool {
        let key = self.keys.not_found_key(code);
        self.bounded("clear_not_found", code, self.backend.delete(&key))
            .await
            .is_some()
    }

    /// Bounded liveness check.
    pub async fn ping(&self) -> bool {
        self.bounded("ping", "-", self.backend.ping())
            .await
            .is_some()
    }
}

/// Applies uniform jitter to a base TTL.
///
/// The result is an integer in `[ceil(B(1-J)), floor(B(1+J))]` and never
/// below 1 for a non-zero base. Jitter spreads the expiry of entries warmed
/// together, so they do not all fall back to the link store at once.
pub fn jittered_ttl(base: u64, jitter: f64) -> u64 {
    if base == 0 || jitter.is_nan() || jitter <= 0.0 {
        return base;
    }

    let spread = base as f64 * jitter.min(1.0);
    let low = (base as f64 - spread).ceil().max(1.0) as u64;
    let high = (base as f64 + spread).floor() as u64;

    if low >= high {
        return base;
    }

    rand::rng().random_range(low..=high)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::backend::{CacheError, MockCacheBackend};
    use crate::infrastructure::cache::memory_backend::MemoryBackend;
    use async_trait::async_trait;

    struct SlowBackend {
        delay: Duration,
    }

    #[async_trait]
    impl CacheBackend for SlowBackend {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            tokio::time::sleep(self.delay).await;
            Ok(Some(NOT_FOUND_SENTINEL.to_string()))
        }

        async fn set_with_expiry(&self, _key: &str, _value: &str, _ttl: u64) -> CacheResult<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        async fn delete(&self, _key: &str) -> CacheResult<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        async fn ping(&self) -> CacheResult<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    fn settings() -> CacheSettings {
        CacheSettings {
            timeout: Duration::from_millis(20),
            ..CacheSettings::default()
        }
    }

    fn store_with(backend: Arc<dyn CacheBackend>) -> (Arc<CacheStore>, Arc<MetricsRecorder>) {
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        let store = Arc::new(CacheStore::new(backend, metrics.clone(), settings()));
        (store, metrics)
    }

    fn failing_backend() -> MockCacheBackend {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_get()
            .returning(|_| Err(CacheError::Operation("connection reset".to_string())));
        backend
            .expect_set_with_expiry()
            .returning(|_, _, _| Err(CacheError::Operation("READONLY".to_string())));
        backend
            .expect_delete()
            .returning(|_| Err(CacheError::Operation("connection reset".to_string())));
        backend
            .expect_ping()
            .returning(|| Err(CacheError::Connection("refused".to_string())));
        backend
    }

    #[tokio::test]
    async fn test_write_then_get_round_trip() {
        let (store, metrics) = store_with(Arc::new(MemoryBackend::new()));
        let link = CachedLink::new("https://example.com", true);

        assert!(store.write_link("abc123X", &link, None).await);
        assert_eq!(store.get("abc123X").await, Some(link));
        assert_eq!(metrics.get(Counter::CacheGetHit), 1);
        assert_eq!(metrics.cache_latency().count, 1);
    }

    #[tokio::test]
    async fn test_get_miss() {
        let (store, metrics) = store_with(Arc::new(MemoryBackend::new()));

        assert_eq!(store.get("nothing").await, None);
        assert_eq!(metrics.get(Counter::CacheGetHit), 0);
    }

    #[tokio::test]
    async fn test_get_backend_error_is_a_miss() {
        let (store, metrics) = store_with(Arc::new(failing_backend()));

        assert_eq!(store.get("abc123X").await, None);
        assert_eq!(metrics.get(Counter::CacheError), 1);
    }

    #[tokio::test]
    async fn test_get_malformed_payload_is_a_miss() {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_get()
            .returning(|_| Ok(Some("{not json".to_string())));
        let (store, _) = store_with(Arc::new(backend));

        assert_eq!(store.get("abc123X").await, None);
    }

    #[tokio::test]
    async fn test_get_timeout_is_a_miss() {
        let (store, metrics) = store_with(Arc::new(SlowBackend {
            delay: Duration::from_millis(200),
        }));

        let started = Instant::now();
        assert_eq!(store.get("abc123X").await, None);
        assert!(started.elapsed() < Duration::from_millis(150));
        assert_eq!(metrics.get(Counter::CacheTimeout), 1);
    }

    #[tokio::test]
    async fn test_is_not_found_requires_exact_sentinel() {
        let backend = Arc::new(MemoryBackend::new());
        let (store, _) = store_with(backend.clone());
        let key = store.keys().not_found_key("gone");

        assert!(!store.is_not_found("gone").await);

        backend.set_with_expiry(&key, "yes", 60).await.unwrap();
        assert!(!store.is_not_found("gone").await);

        backend
            .set_with_expiry(&key, NOT_FOUND_SENTINEL, 60)
            .await
            .unwrap();
        assert!(store.is_not_found("gone").await);
    }

    #[tokio::test]
    async fn test_is_not_found_fails_open() {
        let (store, _) = store_with(Arc::new(failing_backend()));
        assert!(!store.is_not_found("abc123X").await);

        let (slow, metrics) = store_with(Arc::new(SlowBackend {
            delay: Duration::from_millis(200),
        }));
        assert!(!slow.is_not_found("abc123X").await);
        assert_eq!(metrics.get(Counter::CacheTimeout), 1);
    }

    #[tokio::test]
    async fn test_fire_and_forget_writes_swallow_errors() {
        let (store, metrics) = store_with(Arc::new(failing_backend()));

        store
            .set("abc123X", CachedLink::new("https://example.com", false), None)
            .await
            .unwrap();
        store.set_not_found("zzz9999").await.unwrap();

        assert_eq!(metrics.get(Counter::CacheError), 2);
    }

    #[tokio::test]
    async fn test_set_applies_jittered_ttl() {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_set_with_expiry()
            .withf(|key, _, ttl| key == "shortener:v1:link:abc123X" && (3240..=3960).contains(ttl))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let (store, _) = store_with(Arc::new(backend));

        store
            .set("abc123X", CachedLink::new("https://example.com", true), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_not_found_uses_short_ttl() {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_set_with_expiry()
            .withf(|key, value, ttl| {
                key == "shortener:v1:404:zzz9999"
                    && value == NOT_FOUND_SENTINEL
                    && (270..=330).contains(ttl)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let (store, _) = store_with(Arc::new(backend));

        store.set_not_found("zzz9999").await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_clears_both_tiers() {
        let backend = Arc::new(MemoryBackend::new());
        let (store, _) = store_with(backend.clone());

        store
            .write_link("abc123X", &CachedLink::new("https://example.com", true), None)
            .await;
        store.write_not_found("abc123X").await;
        assert_eq!(backend.entry_count().await, 2);

        assert!(store.invalidate("abc123X").await);
        assert_eq!(backend.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_negative_entries_do_not_outlive_their_ttl() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CacheStore::new(
            backend.clone(),
            Arc::new(MetricsRecorder::new().unwrap()),
            CacheSettings {
                not_found_ttl_seconds: 1,
                ttl_jitter: 0.0,
                ..CacheSettings::default()
            },
        );

        for i in 0..10_000 {
            assert!(store.write_not_found(&format!("miss{i}")).await);
        }
        tokio::time::sleep(Duration::from_millis(2500)).await;
        store.write_not_found("late").await;

        assert_eq!(backend.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_clear_not_found_leaves_positive_entry() {
        let backend = Arc::new(MemoryBackend::new());
        let (store, _) = store_with(backend.clone());

        store
            .write_link("abc123X", &CachedLink::new("https://example.com", true), None)
            .await;
        store.write_not_found("abc123X").await;

        assert!(store.clear_not_found("abc123X").await);
        assert!(!store.is_not_found("abc123X").await);
        assert!(store.get("abc123X").await.is_some());
    }

    #[tokio::test]
    async fn test_deletes_fail_open() {
        let (store, metrics) = store_with(Arc::new(failing_backend()));

        assert!(!store.invalidate("abc123X").await);
        assert!(!store.clear_not_found("abc123X").await);
        assert_eq!(metrics.get(Counter::CacheError), 3);
    }

    #[tokio::test]
    async fn test_ping() {
        let (healthy, _) = store_with(Arc::new(MemoryBackend::new()));
        assert!(healthy.ping().await);

        let (broken, _) = store_with(Arc::new(failing_backend()));
        assert!(!broken.ping().await);

        let (slow, _) = store_with(Arc::new(SlowBackend {
            delay: Duration::from_millis(200),
        }));
        assert!(!slow.ping().await);
    }

    #[test]
    fn test_jittered_ttl_within_bounds() {
        for (base, jitter) in [(3600u64, 0.1), (300, 0.1), (3600, 0.08), (7, 0.1), (1000, 0.5)] {
            let low = base as f64 * (1.0 - jitter);
            let high = base as f64 * (1.0 + jitter);
            for _ in 0..500 {
                let ttl = jittered_ttl(base, jitter) as f64;
                assert!(ttl >= low - 1e-9 && ttl <= high + 1e-9, "{ttl} outside [{low}, {high}]");
            }
        }
    }

    #[test]
    fn test_jittered_ttl_spreads_values() {
        let distinct: std::collections::HashSet<u64> =
            (0..200).map(|_| jittered_ttl(3600, 0.1)).collect();
        assert!(distinct.len() > 10);
    }

    #[test]
    fn test_jittered_ttl_without_jitter() {
        assert_eq!(jittered_ttl(3600, 0.0), 3600);
        assert_eq!(jittered_ttl(0, 0.1), 0);
        assert_eq!(jittered_ttl(1, 0.1), 1);
    }
}
