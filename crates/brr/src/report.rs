use brr_speedtest::{LatencySample, Phase, ProgressObserver, Sample, SpeedTestResult};
use tracing::{debug, info, trace};

/// Reports progress through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_phase(&self, phase: Phase) {
        let message = match phase {
            Phase::Meta => "Connecting...",
            Phase::Latency => "Measuring latency...",
            Phase::Download => "Testing download...",
            Phase::Upload => "Testing upload...",
            Phase::Done => "Done.",
        };
        info!("{}", message);
    }

    fn on_download_sample(&self, sample: &Sample) {
        trace!(at = ?sample.timestamp, mbps = sample.mbps, "download sample");
    }

    fn on_upload_sample(&self, sample: &Sample) {
        trace!(at = ?sample.timestamp, mbps = sample.mbps, "upload sample");
    }

    fn on_idle_latency(&self, sample: &LatencySample) {
        debug!(rtt_ms = sample.rtt_ms, "idle latency");
    }

    fn on_loaded_latency(&self, phase: Phase, sample: &LatencySample) {
        debug!(%phase, rtt_ms = sample.rtt_ms, "loaded latency");
    }
}

/// The one-line summary of a run.
pub fn summary_line(result: &SpeedTestResult) -> String {
    let origin = if result.server.client_city.is_empty() {
        &result.server.location
    } else {
        &result.server.client_city
    };

    format!(
        "↓ {:.1} Mbps  ↑ {:.1} Mbps  ⏱ {:.1}ms  Bloat: {}  {} → {}",
        result.download.mbps,
        result.upload.mbps,
        result.idle_latency.avg_ms,
        result.bufferbloat_download,
        origin,
        result.server.colo_city,
    )
}
