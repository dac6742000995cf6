//! The measurement run: phases in order, one result at the end.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::data::{Config, LatencyResult, MeasurementId, Phase, PhaseResult, SpeedTestResult};
use crate::effects::latency::{LatencyProber, LoadedLatencyMeasurer, measure_idle_latency};
use crate::effects::meta::MetadataResolver;
use crate::effects::observer::ProgressObserver;
use crate::effects::pool::{Direction, TransferPool, random_payload};
use crate::effects::sampler::BandwidthSampler;
use crate::effects::transport::Transport;
use crate::error::{Error, Result};

/// Drives a complete measurement over a [`Transport`].
///
/// A run walks through `meta`, `latency`, `download` and `upload` before
/// reporting `done`. Any fatal error aborts the run; there is no partial
/// result.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use brr_speedtest::{Config, Engine, NoopObserver, ReqwestTransport, TransportOptions};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> brr_speedtest::Result<()> {
/// let transport = ReqwestTransport::new(&TransportOptions::default())?;
/// let engine = Engine::new(transport, Config::default())?;
/// let result = engine.run(Arc::new(NoopObserver), CancellationToken::new()).await?;
/// println!("{:.1} Mbps down", result.download.mbps);
/// # Ok(())
/// # }
/// ```
pub struct Engine<T> {
    transport: Arc<T>,
    config: Config,
}

impl<T: Transport + 'static> Engine<T> {
    /// Create an engine. Fails if `config` does not validate.
    pub fn new(transport: T, config: Config) -> Result<Self> {
        Self::with_shared_transport(Arc::new(transport), config)
    }

    pub fn with_shared_transport(transport: Arc<T>, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one measurement.
    ///
    /// `observer` sees every phase change and sample as it happens. Firing
    /// `cancel` makes the run return [`Error::Cancelled`] promptly.
    pub async fn run(
        &self,
        observer: Arc<dyn ProgressObserver>,
        cancel: CancellationToken,
    ) -> Result<SpeedTestResult> {
        let payload = random_payload()?;
        let started_at = Utc::now();
        let origin = Instant::now();
        let measurement_id = MeasurementId::from_start(started_at);
        let endpoint = self.config.endpoint.as_str();

        self.enter(Phase::Meta, observer.as_ref());
        let resolver = MetadataResolver::new(Arc::clone(&self.transport), endpoint)
            .resolve_client_city(self.config.resolve_client_city);
        let server = cancel
            .run_until_cancelled(resolver.resolve())
            .await
            .unwrap_or(Err(Error::Cancelled))
            .map_err(|e| e.in_phase(Phase::Meta))?;
        info!(
            colo = %server.colo,
            colo_city = %server.colo_city,
            client_city = %server.client_city,
            "resolved server"
        );

        self.enter(Phase::Latency, observer.as_ref());
        let prober = LatencyProber::new(Arc::clone(&self.transport), endpoint, origin);
        let idle_latency = measure_idle_latency(
            &prober,
            self.config.latency_probes,
            observer.as_ref(),
            &cancel,
        )
        .await
        .map_err(|e| e.in_phase(Phase::Latency))?;
        info!(
            samples = idle_latency.samples.len(),
            avg_ms = idle_latency.avg_ms,
            jitter_ms = idle_latency.jitter_ms,
            "idle latency measured"
        );

        let pool = TransferPool::new(
            Arc::clone(&self.transport),
            endpoint,
            measurement_id.clone(),
            self.config.max_connections,
            payload,
            cancel.clone(),
        );

        let (download, download_latency) = self
            .transfer_phase(Direction::Download, &pool, &prober, &observer, &cancel, origin)
            .await?;
        let (upload, upload_latency) = self
            .transfer_phase(Direction::Upload, &pool, &prober, &observer, &cancel, origin)
            .await?;

        let result = SpeedTestResult::assemble(
            started_at,
            measurement_id,
            server,
            idle_latency,
            download,
            download_latency,
            upload,
            upload_latency,
        );
        info!(
            download_mbps = result.download.mbps,
            upload_mbps = result.upload.mbps,
            bufferbloat_download = %result.bufferbloat_download,
            bufferbloat_upload = %result.bufferbloat_upload,
            "measurement complete"
        );

        self.enter(Phase::Done, observer.as_ref());
        Ok(result)
    }

    fn enter(&self, phase: Phase, observer: &dyn ProgressObserver) {
        info!(%phase, "entering phase");
        observer.on_phase(phase);
    }

    /// Run one transfer direction with the sampler and loaded latency
    /// prober alongside it.
    async fn transfer_phase(
        &self,
        direction: Direction,
        pool: &TransferPool<T>,
        prober: &LatencyProber<T>,
        observer: &Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
        origin: Instant,
    ) -> Result<(PhaseResult, LatencyResult)> {
        let phase = direction.phase();
        self.enter(phase, observer.as_ref());

        let specs = match direction {
            Direction::Download => &self.config.download_sequence,
            Direction::Upload => &self.config.upload_sequence,
        };

        let loaded = LoadedLatencyMeasurer::spawn(
            prober.clone(),
            self.config.latency_interval,
            phase,
            Arc::clone(observer),
            cancel,
        );
        let counter = Arc::new(AtomicU64::new(0));
        let sampler = BandwidthSampler::spawn(
            Arc::clone(&counter),
            self.config.sample_interval,
            origin,
            direction,
            Arc::clone(observer),
            cancel,
        );

        let outcome = pool.run(direction, specs, counter).await;
        let samples = sampler.stop().await;
        let latency = loaded.finish().await;
        let report = outcome.map_err(|e| e.in_phase(phase))?;

        let result = PhaseResult::from_samples(samples, self.config.warmup);
        if result.samples.is_empty() {
            warn!(%phase, "no throughput samples recorded");
        }
        if latency.is_empty() {
            warn!(%phase, "no loaded latency samples recorded");
        }
        info!(
            %phase,
            mbps = result.mbps,
            samples = result.samples.len(),
            completed = report.completed,
            failed = report.failed,
            loaded_avg_ms = latency.avg_ms,
            "phase complete"
        );

        Ok((result, latency))
    }
}

