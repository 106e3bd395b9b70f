//! Process-wide redirect and cache metrics.

use prometheus::core::Metric;
use prometheus::{
    Encoder, Gauge, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use serde::Serialize;
use tracing::debug;

use super::histogram::{
    CACHE_BUCKETS_MS, HistogramSnapshot, REDIRECT_BUCKETS_MS, latency_histogram, sanitize_ms,
};

const PREFIX: &str = "shortener";

/// The fixed set of counters tracked by [`MetricsRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Redirect301,
    Redirect302,
    Redirect404,
    Redirect503,
    /// Successful redirect answered from the positive cache.
    CacheHit,
    /// Successful redirect that needed the link store.
    CacheMiss,
    NegativeCacheHit,
    DbFallback,
    DbError,
    DbTimeout,
    CacheError,
    CacheTimeout,
    /// Positive cache read that returned an entry.
    CacheGetHit,
}

impl Counter {
    pub const ALL: [Counter; 13] = [
        Counter::Redirect301,
        Counter::Redirect302,
        Counter::Redirect404,
        Counter::Redirect503,
        Counter::CacheHit,
        Counter::CacheMiss,
        Counter::NegativeCacheHit,
        Counter::DbFallback,
        Counter::DbError,
        Counter::DbTimeout,
        Counter::CacheError,
        Counter::CacheTimeout,
        Counter::CacheGetHit,
    ];

    fn redirect_status(self) -> Option<u16> {
        match self {
            Counter::Redirect301 => Some(301),
            Counter::Redirect302 => Some(302),
            Counter::Redirect404 => Some(404),
            Counter::Redirect503 => Some(503),
            _ => None,
        }
    }

    /// Exposition name and help text.
    fn describe(self) -> (&'static str, &'static str) {
        match self {
            Counter::Redirect301
            | Counter::Redirect302
            | Counter::Redirect404
            | Counter::Redirect503 => ("redirects_total", "Redirect responses by status code"),
            Counter::CacheHit => ("cache_hits_total", "Redirects served from the positive cache"),
            Counter::CacheMiss => (
                "cache_misses_total",
                "Successful redirects that fell back to the link store",
            ),
            Counter::NegativeCacheHit => (
                "negative_cache_hits_total",
                "Lookups short-circuited by the negative cache",
            ),
            Counter::DbFallback => ("db_fallback_total", "Lookups that queried the link store"),
            Counter::DbError => ("db_errors_total", "Link store lookups that failed"),
            Counter::DbTimeout => ("db_timeouts_total", "Link store lookups that timed out"),
            Counter::CacheError => ("cache_errors_total", "Cache backend operations that failed"),
            Counter::CacheTimeout => (
                "cache_timeouts_total",
                "Cache backend operations that timed out",
            ),
            Counter::CacheGetHit => (
                "cache_get_hits_total",
                "Positive cache reads that returned an entry",
            ),
        }
    }
}

/// Aggregates derived from the redirect counters and latency histogram.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p99_latency_ms: f64,
}

/// Counters and latency histograms for the redirect path.
///
/// Shared as `Arc<MetricsRecorder>` and injected into the cache store and
/// the redirect service. Each recorder owns its own Prometheus registry, so
/// parallel tests never see each other's samples.
pub struct MetricsRecorder {
    registry: Registry,
    /// One handle per [`Counter`], in [`Counter::ALL`] order. Redirect
    /// counters are children of `shortener_redirects_total{status}`.
    counters: Vec<IntCounter>,
    redirect_latency: HistogramVec,
    cache_latency: HistogramVec,
    cache_hit_rate: Gauge,
}

impl MetricsRecorder {
    /// Creates a recorder with every series registered and zeroed.
    ///
    /// # Errors
    ///
    /// Returns a [`prometheus::Error`] if a metric definition is rejected
    /// by the registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let (name, help) = Counter::Redirect301.describe();
        let redirects =
            IntCounterVec::new(Opts::new(name, help).namespace(PREFIX), &["status"])?;
        registry.register(Box::new(redirects.clone()))?;

        let mut counters = Vec::with_capacity(Counter::ALL.len());
        for counter in Counter::ALL {
            let handle = match counter.redirect_status() {
                Some(status) => redirects.with_label_values(&[&status.to_string()]),
                None => {
                    let (name, help) = counter.describe();
                    let handle = IntCounter::with_opts(Opts::new(name, help).namespace(PREFIX))?;
                    registry.register(Box::new(handle.clone()))?;
                    handle
                }
            };
            counters.push(handle);
        }

        let redirect_latency = latency_histogram(
            PREFIX,
            "redirect_latency_ms",
            "End-to-end redirect resolution latency in milliseconds",
            REDIRECT_BUCKETS_MS,
        )?;
        registry.register(Box::new(redirect_latency.clone()))?;

        let cache_latency = latency_histogram(
            PREFIX,
            "cache_latency_ms",
            "Positive cache read latency in milliseconds",
            CACHE_BUCKETS_MS,
        )?;
        registry.register(Box::new(cache_latency.clone()))?;

        let cache_hit_rate = Gauge::with_opts(
            Opts::new(
                "cache_hit_rate",
                "Share of successful redirects served from cache",
            )
            .namespace(PREFIX),
        )?;
        registry.register(Box::new(cache_hit_rate.clone()))?;

        Ok(Self {
            registry,
            counters,
            redirect_latency,
            cache_latency,
            cache_hit_rate,
        })
    }

    fn counter(&self, counter: Counter) -> &IntCounter {
        &self.counters[counter as usize]
    }

    pub fn increment(&self, counter: Counter) {
        self.counter(counter).inc();
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counter(counter).get()
    }

    /// Records end-to-end redirect latency.
    pub fn record_latency(&self, ms: f64) {
        self.redirect_latency
            .with_label_values(&[])
            .observe(sanitize_ms(ms));
    }

    /// Records the latency of one positive cache read and, on a hit, counts it.
    pub fn record_cache_latency(&self, ms: f64, hit: bool) {
        self.cache_latency
            .with_label_values(&[])
            .observe(sanitize_ms(ms));
        if hit {
            self.increment(Counter::CacheGetHit);
        }
    }

    /// Records the outcome of one redirect request.
    ///
    /// Updates the status counter, the cache hit/miss counters (301/302
    /// only), and the latency histogram. Call exactly once per request.
    pub fn record_redirect(&self, status: u16, cache_hit: bool, latency_ms: f64) {
        let counter = match status {
            301 => Counter::Redirect301,
            302 => Counter::Redirect302,
            404 => Counter::Redirect404,
            503 => Counter::Redirect503,
            other => {
                debug!(status = other, "Untracked redirect status");
                self.record_latency(latency_ms);
                return;
            }
        };
        self.increment(counter);

        if matches!(status, 301 | 302) {
            self.increment(if cache_hit {
                Counter::CacheHit
            } else {
                Counter::CacheMiss
            });
        }

        self.record_latency(latency_ms);
    }

    pub fn redirect_latency(&self) -> HistogramSnapshot {
        snapshot(&self.redirect_latency)
    }

    pub fn cache_latency(&self) -> HistogramSnapshot {
        snapshot(&self.cache_latency)
    }

    /// Hit rate of successful redirects, `0.0` before the first one.
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.get(Counter::CacheHit);
        let total = hits + self.get(Counter::CacheMiss);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Dashboard summary with bucket-approximated percentiles.
    pub fn summary(&self) -> MetricsSummary {
        let latency = self.redirect_latency();
        let total_requests = Counter::ALL
            .iter()
            .filter(|c| c.redirect_status().is_some())
            .map(|c| self.get(*c))
            .sum();

        MetricsSummary {
            total_requests,
            cache_hit_rate: self.cache_hit_rate(),
            avg_latency_ms: latency.mean(),
            p50_latency_ms: latency.percentile(0.50),
            p99_latency_ms: latency.percentile(0.99),
        }
    }

    /// Renders all metrics in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns a [`prometheus::Error`] if encoding fails.
    pub fn render(&self) -> prometheus::Result<String> {
        self.cache_hit_rate.set(self.cache_hit_rate());

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Zeroes every counter and histogram. Intended for test isolation.
    pub fn reset(&self) {
        for counter in &self.counters {
            counter.reset();
        }
        for histogram in [&self.redirect_latency, &self.cache_latency] {
            histogram.reset();
            histogram.with_label_values(&[]);
        }
        self.cache_hit_rate.set(0.0);
    }
}

fn snapshot(histogram: &HistogramVec) -> HistogramSnapshot {
    HistogramSnapshot::from_proto(histogram.with_label_values(&[]).metric().get_histogram())
}
