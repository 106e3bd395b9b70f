//! Latency histogram definitions and bucket-walk percentiles.

use prometheus::proto;
use prometheus::{HistogramOpts, HistogramVec};

/// Upper bounds (ms) for end-to-end redirect latency.
pub const REDIRECT_BUCKETS_MS: &[f64] = &[1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

/// Upper bounds (ms) for single cache operations.
pub const CACHE_BUCKETS_MS: &[f64] = &[0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0];

/// Builds an unlabelled latency histogram under `namespace`.
///
/// A zero-label vec is used so the series can be dropped and recreated by
/// `MetricsRecorder::reset`; the child is created eagerly so the family is
/// exported before the first observation.
pub(crate) fn latency_histogram(
    namespace: &str,
    name: &str,
    help: &str,
    buckets: &[f64],
) -> prometheus::Result<HistogramVec> {
    let histogram = HistogramVec::new(
        HistogramOpts::new(name, help)
            .namespace(namespace)
            .buckets(buckets.to_vec()),
        &[],
    )?;
    histogram.with_label_values(&[]);
    Ok(histogram)
}

/// Clamps an observation so negative and NaN values count as zero.
pub(crate) fn sanitize_ms(ms: f64) -> f64 {
    if ms.is_nan() { 0.0 } else { ms.max(0.0) }
}

/// Point-in-time copy of a latency histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Finite upper bounds, ascending.
    pub bounds: Vec<f64>,
    /// Cumulative count at each bound; observations above the last bound
    /// only show up in `count`.
    pub cumulative: Vec<u64>,
    pub sum_ms: f64,
    pub count: u64,
}

impl HistogramSnapshot {
    pub(crate) fn from_proto(histogram: &proto::Histogram) -> Self {
        let buckets = histogram.get_bucket();
        Self {
            bounds: buckets.iter().map(|b| b.get_upper_bound()).collect(),
            cumulative: buckets.iter().map(|b| b.get_cumulative_count()).collect(),
            sum_ms: histogram.get_sample_sum(),
            count: histogram.get_sample_count(),
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ms / self.count as f64
        }
    }

    /// Approximates the `p` quantile (`0.0..=1.0`).
    ///
    /// Walks the buckets until the cumulative count reaches `p * count` and
    /// returns that bucket's upper bound, without interpolation. Observations
    /// in the overflow bucket report the largest finite bound.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }

        let target = p.clamp(0.0, 1.0) * self.count as f64;

        self.bounds
            .iter()
            .zip(&self.cumulative)
            .find(|(_, cumulative)| **cumulative > 0 && **cumulative as f64 >= target)
            .map(|(bound, _)| *bound)
            .or_else(|| self.bounds.last().copied())
            .unwrap_or(0.0)
    }
}
