//! Bounded-concurrency execution of transfer jobs.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures_util::StreamExt;
use rand::TryRngCore;
use rand::rngs::OsRng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{PAYLOAD_SEED_SIZE, is_success, payload_chunks};
use crate::data::{MeasurementId, Phase, Sample, TransferSpec};
use crate::effects::observer::ProgressObserver;
use crate::effects::transport::{Transport, UploadBody};
use crate::error::{Error, Result};

/// Which way a transfer phase moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    pub fn phase(self) -> Phase {
        match self {
            Direction::Download => Phase::Download,
            Direction::Upload => Phase::Upload,
        }
    }

    pub(crate) fn notify(self, observer: &dyn ProgressObserver, sample: &Sample) {
        match self {
            Direction::Download => observer.on_download_sample(sample),
            Direction::Upload => observer.on_upload_sample(sample),
        }
    }
}

/// Outcome counts of one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub completed: usize,
    pub failed: usize,
}

/// Generate the random buffer upload bodies are cut from.
pub fn random_payload() -> Result<Bytes> {
    let mut buf = vec![0u8; PAYLOAD_SEED_SIZE];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| Error::RandomSource(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Runs transfer jobs with at most `max_connections` in flight.
///
/// Downloads are `GET <endpoint>/__down?bytes=N&measId=ID`; uploads are
/// `POST <endpoint>/__up?measId=ID` with an `N`-byte body cut from the
/// shared payload.
pub struct TransferPool<T> {
    transport: Arc<T>,
    endpoint: String,
    measurement_id: MeasurementId,
    max_connections: usize,
    payload: Bytes,
    cancel: CancellationToken,
}

impl<T: Transport + 'static> TransferPool<T> {
    pub fn new(
        transport: Arc<T>,
        endpoint: impl Into<String>,
        measurement_id: MeasurementId,
        max_connections: usize,
        payload: Bytes,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            measurement_id,
            max_connections: max_connections.max(1),
            payload,
            cancel,
        }
    }

    /// Execute every transfer in `specs`, in order of admission, adding the
    /// bytes moved to `counter` as they flow.
    ///
    /// Failed jobs are counted and skipped. Returns [`Error::Cancelled`]
    /// as soon as the cancellation token fires; no job is admitted after
    /// that and running jobs are aborted.
    pub async fn run(
        &self,
        direction: Direction,
        specs: &[TransferSpec],
        counter: Arc<AtomicU64>,
    ) -> Result<PoolReport> {
        let semaphore = Arc::new(Semaphore::new(self.max_connections));
        let mut jobs = JoinSet::new();
        let mut report = PoolReport::default();

        let sizes = specs
            .iter()
            .flat_map(|spec| std::iter::repeat_n(spec.bytes, spec.count));

        for size in sizes {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    jobs.abort_all();
                    return Err(Error::Cancelled);
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.expect("transfer semaphore is never closed")
                }
            };

            while let Some(finished) = jobs.try_join_next() {
                tally(&mut report, direction, finished);
            }

            let job = self.job(direction, size, Arc::clone(&counter));
            let cancel = self.cancel.clone();
            jobs.spawn(async move {
                let _permit = permit;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    outcome = job => outcome,
                }
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    jobs.abort_all();
                    return Err(Error::Cancelled);
                }
                finished = jobs.join_next() => match finished {
                    Some(finished) => tally(&mut report, direction, finished),
                    None => break,
                },
            }
        }

        Ok(report)
    }

    fn job(
        &self,
        direction: Direction,
        size: u64,
        counter: Arc<AtomicU64>,
    ) -> impl Future<Output = Result<u64>> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let id = self.measurement_id.clone();
        let endpoint = self.endpoint.clone();
        let payload = self.payload.clone();

        async move {
            let url = match direction {
                Direction::Download => format!("{endpoint}/__down?bytes={size}&measId={id}"),
                Direction::Upload => format!("{endpoint}/__up?measId={id}"),
            };

            let response = match direction {
                Direction::Download => transport.get(&url).await,
                Direction::Upload => {
                    let uploaded = Arc::clone(&counter);
                    let chunks = futures_util::stream::iter(payload_chunks(&payload, size))
                        .inspect(move |chunk| {
                            uploaded.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                        });
                    transport
                        .post(&url, UploadBody::new(size, Box::pin(chunks)))
                        .await
                }
            }
            .map_err(|e| Error::Network(e.to_string()))?;

            let status = response.status();
            if !is_success(status) {
                return Err(Error::HttpStatus { status, url });
            }

            let on_chunk = |n: usize| {
                if direction == Direction::Download {
                    counter.fetch_add(n as u64, Ordering::Relaxed);
                }
            };
            response
                .drain(on_chunk)
                .await
                .map_err(|e| Error::Network(e.to_string()))?;

            Ok(size)
        }
    }
}

fn tally(
    report: &mut PoolReport,
    direction: Direction,
    finished: std::result::Result<Result<u64>, tokio::task::JoinError>,
) {
    match finished {
        Ok(Ok(_)) => report.completed += 1,
        Ok(Err(e)) => {
            debug!("{:?} transfer failed: {}", direction, e);
            report.failed += 1;
        }
        Err(e) => {
            debug!("{:?} transfer task ended abnormally: {}", direction, e);
            report.failed += 1;
        }
    }
}
