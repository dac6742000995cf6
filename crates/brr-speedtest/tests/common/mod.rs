//! In-process stand-in for the speed test endpoint.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::time::Instant;

use brr_speedtest::{Config, Response, TransferSpec, Transport, UploadBody};

pub const TRACE: &str = "fl=42f1\nh=mock\nip=203.0.113.9\nts=1700000000.0\ncolo=AMS\nloc=NL\n";

const CHUNK: u64 = 64 * 1024;
static ZEROS: [u8; CHUNK as usize] = [0; CHUNK as usize];

#[derive(Debug)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

/// Behaviour and request log of the mock endpoint.
#[derive(Debug)]
pub struct MockState {
    /// Time to move one 64 KiB chunk in either direction.
    pub chunk_delay: Duration,
    /// Latency probe time with no transfer running.
    pub idle_rtt: Duration,
    /// Latency probe time while a transfer is running.
    pub loaded_rtt: Duration,
    pub fail_latency: bool,
    pub trace_status: u16,
    pub transfer_status: u16,

    /// Transfers currently running.
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Start time and URL of every transfer request.
    pub transfers: Mutex<Vec<(Instant, String)>>,
    /// Bytes received by each completed upload.
    pub uploads: Mutex<Vec<u64>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            chunk_delay: Duration::from_millis(50),
            idle_rtt: Duration::from_millis(10),
            loaded_rtt: Duration::from_millis(60),
            fail_latency: false,
            trace_status: 200,
            transfer_status: 200,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            transfers: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

impl MockState {
    pub fn transfer_urls(&self) -> Vec<String> {
        self.transfers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, url)| url.clone())
            .collect()
    }

    pub fn transfer_starts(&self) -> Vec<Instant> {
        self.transfers
            .lock()
            .unwrap()
            .iter()
            .map(|(start, _)| *start)
            .collect()
    }
}

/// Marks a transfer as running for as long as it is alive.
struct InFlight(Arc<MockState>);

impl InFlight {
    fn enter(state: &Arc<MockState>) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(state))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct MockTransport(pub Arc<MockState>);

impl MockTransport {
    pub fn new(state: MockState) -> (Self, Arc<MockState>) {
        let state = Arc::new(state);
        (Self(Arc::clone(&state)), state)
    }
}

fn empty(status: u16, headers: Vec<(String, String)>) -> Response<MockError> {
    let body: Vec<Result<Bytes, MockError>> = Vec::new();
    Response::new(status, headers, Box::pin(futures_util::stream::iter(body)))
}

fn requested_bytes(url: &str) -> u64 {
    url.split("bytes=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

impl Transport for MockTransport {
    type Error = MockError;

    async fn get(&self, url: &str) -> Result<Response<MockError>, MockError> {
        let state = &self.0;

        if url.ends_with("/cdn-cgi/trace") {
            let body: Vec<Result<Bytes, MockError>> = vec![Ok(Bytes::from_static(TRACE.as_bytes()))];
            return Ok(Response::new(
                state.trace_status,
                Vec::new(),
                Box::pin(futures_util::stream::iter(body)),
            ));
        }

        if !url.contains("/__down") {
            return Ok(empty(404, Vec::new()));
        }

        let len = requested_bytes(url);
        if len == 0 {
            let loaded = state.in_flight.load(Ordering::SeqCst) > 0;
            tokio::time::sleep(if loaded { state.loaded_rtt } else { state.idle_rtt }).await;
            if state.fail_latency {
                return Err(MockError("connection reset".into()));
            }
            let timing = vec![("Server-Timing".to_string(), "cfRequestDuration;dur=1".to_string())];
            return Ok(empty(200, timing));
        }

        state
            .transfers
            .lock()
            .unwrap()
            .push((Instant::now(), url.to_string()));
        if state.transfer_status != 200 {
            return Ok(empty(state.transfer_status, Vec::new()));
        }

        let guard = InFlight::enter(state);
        let delay = state.chunk_delay;
        let body = futures_util::stream::unfold((guard, len), move |(guard, remaining)| async move {
            if remaining == 0 {
                return None;
            }
            tokio::time::sleep(delay).await;
            let n = remaining.min(CHUNK);
            let chunk = Bytes::from_static(&ZEROS[..n as usize]);
            Some((Ok(chunk), (guard, remaining - n)))
        });
        Ok(Response::new(200, Vec::new(), Box::pin(body)))
    }

    async fn post(&self, url: &str, body: UploadBody) -> Result<Response<MockError>, MockError> {
        let state = &self.0;
        state
            .transfers
            .lock()
            .unwrap()
            .push((Instant::now(), url.to_string()));

        let _guard = InFlight::enter(state);
        let mut stream = body.into_stream();
        let mut received = 0u64;
        while let Some(chunk) = stream.next().await {
            tokio::time::sleep(state.chunk_delay).await;
            received += chunk.len() as u64;
        }
        state.uploads.lock().unwrap().push(received);

        Ok(empty(state.transfer_status, Vec::new()))
    }
}

/// A short run against the mock: 4 MB down, 2 MB up, two connections.
pub fn test_config() -> Config {
    Config::default()
        .endpoint("http://mock")
        .download_sequence(vec![TransferSpec::new(1_000_000, 4)])
        .upload_sequence(vec![TransferSpec::new(500_000, 4)])
        .max_connections(2)
        .latency_probes(5)
        .resolve_client_city(false)
}
