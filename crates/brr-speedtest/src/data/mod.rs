//! Immutable data types for a measurement run.
//!
//! This module contains the configuration, the per-sample observations and
//! the aggregated results. Everything here is plain data: results are built
//! once from their samples and never mutated afterwards.

pub mod config;
pub mod options;
pub mod phase;
pub mod result;
pub mod sample;

pub use config::{Config, DEFAULT_ENDPOINT, TransferSpec};
pub use options::TransportOptions;
pub use phase::Phase;
pub use result::{BufferbloatGrade, MeasurementId, ServerInfo, SpeedTestResult};
pub use sample::{LatencyResult, LatencySample, PhaseResult, SUMMARY_PERCENTILE, Sample};
