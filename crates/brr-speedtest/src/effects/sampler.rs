//! Periodic throughput sampling of a shared byte counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::warn;

use crate::core::mbps;
use crate::data::Sample;
use crate::effects::observer::ProgressObserver;
use crate::effects::pool::Direction;

/// Turns byte counter deltas into [`Sample`]s at a fixed interval.
pub struct BandwidthSampler;

impl BandwidthSampler {
    /// Start sampling `counter` every `interval`.
    ///
    /// Ticks where either the byte delta or the time delta is zero produce
    /// no sample. Sample timestamps are offsets from `origin`.
    pub fn spawn(
        counter: Arc<AtomicU64>,
        interval: Duration,
        origin: Instant,
        direction: Direction,
        observer: Arc<dyn ProgressObserver>,
        parent: &CancellationToken,
    ) -> SamplerHandle {
        let token = parent.child_token();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut samples = Vec::new();
            let mut last_bytes = counter.load(Ordering::Relaxed);
            let mut last_time = Instant::now();

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let now = Instant::now();
                let bytes = counter.load(Ordering::Relaxed);
                if let Some(mbps) = mbps(bytes.saturating_sub(last_bytes), now.duration_since(last_time)) {
                    let sample = Sample {
                        timestamp: now.duration_since(origin),
                        mbps,
                    };
                    direction.notify(observer.as_ref(), &sample);
                    samples.push(sample);
                }

                last_bytes = bytes;
                last_time = now;
            }

            samples
        });

        SamplerHandle {
            stop: token.drop_guard(),
            task,
        }
    }
}

/// Owner of a running [`BandwidthSampler`].
///
/// Dropping the handle stops the sampler and discards its samples.
pub struct SamplerHandle {
    stop: DropGuard,
    task: JoinHandle<Vec<Sample>>,
}

impl SamplerHandle {
    /// Stop sampling and return every sample taken.
    ///
    /// No sample is produced once this returns.
    pub async fn stop(self) -> Vec<Sample> {
        self.stop.disarm().cancel();
        match self.task.await {
            Ok(samples) => samples,
            Err(e) => {
                warn!("bandwidth sampler failed: {}", e);
                Vec::new()
            }
        }
    }
}
