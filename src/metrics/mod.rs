//! Latency and hit-rate metrics for the redirect SLO.
//!
//! [`MetricsRecorder`] is an explicitly owned context shared as
//! `Arc<MetricsRecorder>`. It wraps its own `prometheus::Registry` rather
//! than the process-global one and renders the text format served at
//! `GET /metrics`.

mod histogram;
mod recorder;

pub use histogram::{CACHE_BUCKETS_MS, HistogramSnapshot, REDIRECT_BUCKETS_MS};
pub use recorder::{Counter, MetricsRecorder, MetricsSummary};
