use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{discard_warmup, jitter, mean, percentile};

/// Percentile used to summarize a throughput phase.
pub const SUMMARY_PERCENTILE: f64 = 0.90;

/// A single throughput observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Offset from the start of the run on the monotonic clock.
    pub timestamp: Duration,

    /// Throughput over the preceding sampling interval, in megabits per second.
    pub mbps: f64,
}

/// A single round-trip observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Offset from the start of the run on the monotonic clock.
    pub timestamp: Duration,

    /// Round-trip time in milliseconds, with server processing time removed.
    pub rtt_ms: f64,
}

/// Outcome of a download or upload phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    /// 90th percentile of the samples taken after the warm-up window.
    pub mbps: f64,

    /// Every sample of the phase, warm-up included.
    pub samples: Vec<Sample>,
}

impl PhaseResult {
    /// Summarize a phase from its raw samples.
    ///
    /// Samples within `warmup` of the first one are ignored for the
    /// summary but kept in [`PhaseResult::samples`].
    pub fn from_samples(samples: Vec<Sample>, warmup: Duration) -> Self {
        let steady = discard_warmup(&samples, warmup);
        let values: Vec<f64> = steady.iter().map(|s| s.mbps).collect();
        let mbps = percentile(&values, SUMMARY_PERCENTILE).max(0.0);
        Self { mbps, samples }
    }
}

/// Aggregated round-trip measurements.
///
/// Every field besides `samples` is derived from `samples`; an empty list
/// gives an all-zero result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyResult {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub jitter_ms: f64,
    pub samples: Vec<LatencySample>,
}

impl LatencyResult {
    pub fn from_samples(samples: Vec<LatencySample>) -> Self {
        let rtts: Vec<f64> = samples.iter().map(|s| s.rtt_ms).collect();
        if rtts.is_empty() {
            return Self::default();
        }

        let min_ms = rtts.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ms = rtts.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            min_ms,
            max_ms,
            avg_ms: mean(&rtts),
            jitter_ms: jitter(&rtts),
            samples,
        }
    }

    /// The raw round-trip times, in sample order.
    pub fn rtts(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.rtt_ms).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
