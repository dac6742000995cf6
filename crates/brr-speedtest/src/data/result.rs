use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{bufferbloat_grade, context_line};
use crate::data::sample::{LatencyResult, PhaseResult};

/// Identity of the test server and of the client as seen by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Public IP address of the client.
    pub ip: String,

    /// IATA code of the point of presence that served the run.
    pub colo: String,

    /// Human-readable city of the point of presence.
    pub colo_city: String,

    /// Country code of the client.
    pub location: String,

    /// City of the client, empty when it could not be resolved.
    pub client_city: String,
}

/// Quality grade for latency increase under load, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BufferbloatGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl BufferbloatGrade {
    pub fn label(&self) -> &'static str {
        match self {
            BufferbloatGrade::APlus => "A+",
            BufferbloatGrade::A => "A",
            BufferbloatGrade::B => "B",
            BufferbloatGrade::C => "C",
            BufferbloatGrade::D => "D",
            BufferbloatGrade::F => "F",
        }
    }
}

impl fmt::Display for BufferbloatGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque identifier attached to every transfer request of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementId(String);

impl MeasurementId {
    /// Derive an identifier from the run's start time, in nanoseconds since
    /// the Unix epoch.
    pub fn from_start(start: DateTime<Utc>) -> Self {
        let nanos = start
            .timestamp_nanos_opt()
            .unwrap_or_else(|| start.timestamp_micros().saturating_mul(1_000));
        Self(nanos.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete outcome of a measurement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestResult {
    /// Wall-clock start of the run.
    pub timestamp: DateTime<Utc>,
    pub measurement_id: MeasurementId,
    pub server: ServerInfo,
    pub download: PhaseResult,
    pub upload: PhaseResult,
    pub idle_latency: LatencyResult,
    pub download_latency: LatencyResult,
    pub upload_latency: LatencyResult,
    pub bufferbloat_download: BufferbloatGrade,
    pub bufferbloat_upload: BufferbloatGrade,
    pub context_line: String,
}

impl SpeedTestResult {
    /// Assemble a result from its measured parts, deriving the grades and
    /// the context line.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        timestamp: DateTime<Utc>,
        measurement_id: MeasurementId,
        server: ServerInfo,
        idle_latency: LatencyResult,
        download: PhaseResult,
        download_latency: LatencyResult,
        upload: PhaseResult,
        upload_latency: LatencyResult,
    ) -> Self {
        let bufferbloat_download = bufferbloat_grade(Some(&idle_latency), Some(&download_latency));
        let bufferbloat_upload = bufferbloat_grade(Some(&idle_latency), Some(&upload_latency));
        let context_line = context_line(download.mbps, upload.mbps, bufferbloat_download).to_string();

        Self {
            timestamp,
            measurement_id,
            server,
            download,
            upload,
            idle_latency,
            download_latency,
            upload_latency,
            bufferbloat_download,
            bufferbloat_upload,
            context_line,
        }
    }

    /// Recompute every derived field from the stored samples.
    ///
    /// For a result produced by a run with the same warm-up window this
    /// returns a value equal to `self`.
    pub fn rederive(&self, warmup: Duration) -> Self {
        Self::assemble(
            self.timestamp,
            self.measurement_id.clone(),
            self.server.clone(),
            LatencyResult::from_samples(self.idle_latency.samples.clone()),
            PhaseResult::from_samples(self.download.samples.clone(), warmup),
            LatencyResult::from_samples(self.download_latency.samples.clone()),
            PhaseResult::from_samples(self.upload.samples.clone(), warmup),
            LatencyResult::from_samples(self.upload_latency.samples.clone()),
        )
    }
}
