//! Round-trip latency probes, idle and under load.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::core::{SERVER_TIMING_HEADER, is_success, server_processing_ms};
use crate::data::{LatencyResult, LatencySample, Phase};
use crate::effects::observer::ProgressObserver;
use crate::effects::transport::Transport;
use crate::error::{Error, Result};

/// Issues single zero-byte requests and times them.
pub struct LatencyProber<T> {
    transport: Arc<T>,
    url: String,
    origin: Instant,
}

impl<T> Clone for LatencyProber<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            url: self.url.clone(),
            origin: self.origin,
        }
    }
}

impl<T: Transport> LatencyProber<T> {
    /// Create a prober for `endpoint`. Sample timestamps are offsets from
    /// `origin`.
    pub fn new(transport: Arc<T>, endpoint: &str, origin: Instant) -> Self {
        Self {
            transport,
            url: format!("{endpoint}/__down?bytes=0"),
            origin,
        }
    }

    /// Measure one round trip.
    ///
    /// The time runs from sending the request until the body is fully read,
    /// minus the processing time the server reports in `Server-Timing`. If
    /// that subtraction goes negative the raw elapsed time is used.
    pub async fn probe(&self) -> Result<LatencySample> {
        let start = Instant::now();
        let response = self
            .transport
            .get(&self.url)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !is_success(status) {
            return Err(Error::HttpStatus {
                status,
                url: self.url.clone(),
            });
        }

        let server_ms = response
            .header(SERVER_TIMING_HEADER)
            .map(server_processing_ms)
            .unwrap_or(0.0);
        response
            .drain(|_| {})
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let finished = Instant::now();
        let elapsed_ms = finished.duration_since(start).as_secs_f64() * 1000.0;
        let rtt_ms = match elapsed_ms - server_ms {
            rtt if rtt < 0.0 => elapsed_ms,
            rtt => rtt,
        };

        Ok(LatencySample {
            timestamp: finished.duration_since(self.origin),
            rtt_ms,
        })
    }
}

/// Run `count` probes one after another on an otherwise idle connection.
///
/// Failed probes are skipped. Fails with [`Error::NoUsableSamples`] when
/// none succeeds and with [`Error::Cancelled`] when `cancel` fires.
pub async fn measure_idle_latency<T: Transport>(
    prober: &LatencyProber<T>,
    count: usize,
    observer: &dyn ProgressObserver,
    cancel: &CancellationToken,
) -> Result<LatencyResult> {
    let mut samples = Vec::with_capacity(count);

    for attempt in 1..=count {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            outcome = prober.probe() => outcome,
        };

        match outcome {
            Ok(sample) => {
                observer.on_idle_latency(&sample);
                samples.push(sample);
            }
            Err(e) => debug!("idle latency probe {}/{} failed: {}", attempt, count, e),
        }
    }

    if samples.is_empty() {
        return Err(Error::NoUsableSamples { attempted: count });
    }
    Ok(LatencyResult::from_samples(samples))
}

/// Background prober for the duration of a transfer phase.
pub struct LoadedLatencyMeasurer;

impl LoadedLatencyMeasurer {
    /// Start probing every `interval` until the returned handle is finished
    /// or dropped, or `parent` is cancelled.
    pub fn spawn<T: Transport + 'static>(
        prober: LatencyProber<T>,
        interval: Duration,
        phase: Phase,
        observer: Arc<dyn ProgressObserver>,
        parent: &CancellationToken,
    ) -> LoadedLatencyHandle {
        let token = parent.child_token();
        let (tx, rx) = oneshot::channel();

        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut samples = Vec::new();

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // A probe still in flight at stop time is abandoned.
                let outcome = tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    outcome = prober.probe() => outcome,
                };

                match outcome {
                    Ok(sample) => {
                        observer.on_loaded_latency(phase, &sample);
                        samples.push(sample);
                    }
                    Err(e) => debug!("{} loaded latency probe failed: {}", phase, e),
                }
            }

            let _ = tx.send(LatencyResult::from_samples(samples));
        });

        LoadedLatencyHandle {
            stop: token.drop_guard(),
            rx,
            task,
        }
    }
}

/// Completion side of a [`LoadedLatencyMeasurer`].
///
/// Dropping the handle stops the prober without waiting for it.
pub struct LoadedLatencyHandle {
    stop: DropGuard,
    rx: oneshot::Receiver<LatencyResult>,
    task: JoinHandle<()>,
}

impl LoadedLatencyHandle {
    /// Stop probing and wait for the accumulated result.
    ///
    /// Returns only once the background task has ended.
    pub async fn finish(self) -> LatencyResult {
        self.stop.disarm().cancel();
        let result = match self.rx.await {
            Ok(result) => result,
            Err(_) => {
                warn!("loaded latency task ended without a result");
                LatencyResult::default()
            }
        };
        if let Err(e) = self.task.await {
            warn!("loaded latency task failed: {}", e);
        }
        result
    }
}
