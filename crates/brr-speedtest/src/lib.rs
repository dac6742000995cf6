//! Network speed measurement: throughput, idle and loaded latency, and
//! bufferbloat grading.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Key Features
//!
//! - **Phased Run**: metadata, idle latency, download and upload run strictly in order
//! - **Loaded Latency**: probes run alongside every transfer phase to grade bufferbloat
//! - **Reproducible**: every summary is a pure function of the stored samples
//! - **Mechanism-Only**: no UI; callers observe progress through [`ProgressObserver`]

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    BufferbloatGrade, Config, LatencyResult, LatencySample, MeasurementId, Phase, PhaseResult,
    Sample, ServerInfo, SpeedTestResult, TransferSpec, TransportOptions,
};
pub use effects::{
    ChannelObserver, Engine, Event, NoopObserver, ProgressObserver, Response, Transport,
    UploadBody,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestTransport;

pub use error::{Error, Result};
