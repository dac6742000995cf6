mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use brr_speedtest::effects::{Direction, PoolReport, TransferPool, random_payload};
use brr_speedtest::{Error, MeasurementId, TransferSpec};

use common::{MockState, MockTransport};

fn pool(state: MockState, max_connections: usize, cancel: CancellationToken) -> (TransferPool<MockTransport>, Arc<MockState>) {
    let (transport, state) = MockTransport::new(state);
    let pool = TransferPool::new(
        Arc::new(transport),
        "http://mock",
        MeasurementId::from_start(Utc::now()),
        max_connections,
        random_payload().unwrap(),
        cancel,
    );
    (pool, state)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_downloads_sum_exactly() {
    let state = MockState {
        chunk_delay: Duration::from_millis(1),
        ..MockState::default()
    };
    let (pool, state) = pool(state, 8, CancellationToken::new());
    let counter = Arc::new(AtomicU64::new(0));

    let report = pool
        .run(Direction::Download, &[TransferSpec::new(100_000, 32)], Arc::clone(&counter))
        .await
        .unwrap();

    assert_eq!(report, PoolReport { completed: 32, failed: 0 });
    assert_eq!(counter.load(Ordering::SeqCst), 3_200_000);
    assert!(state.max_in_flight.load(Ordering::SeqCst) <= 8);
    assert_eq!(state.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn uploads_send_exact_lengths() {
    let state = MockState {
        chunk_delay: Duration::from_millis(1),
        ..MockState::default()
    };
    let (pool, state) = pool(state, 16, CancellationToken::new());
    let counter = Arc::new(AtomicU64::new(0));
    let specs = [TransferSpec::new(11_000, 10), TransferSpec::new(1_000_000, 3), TransferSpec::new(2_500_000, 1)];

    let report = pool
        .run(Direction::Upload, &specs, Arc::clone(&counter))
        .await
        .unwrap();

    assert_eq!(report.completed, 14);
    let expected: u64 = specs.iter().map(TransferSpec::total_bytes).sum();
    assert_eq!(counter.load(Ordering::SeqCst), expected);

    let mut uploads = state.uploads.lock().unwrap().clone();
    uploads.sort_unstable();
    let mut want = vec![11_000u64; 10];
    want.extend([1_000_000, 1_000_000, 1_000_000, 2_500_000]);
    assert_eq!(uploads, want);
}

#[tokio::test(start_paused = true)]
async fn permits_are_recycled_up_to_the_limit() {
    let (pool, state) = pool(MockState::default(), 3, CancellationToken::new());
    let counter = Arc::new(AtomicU64::new(0));

    let report = pool
        .run(Direction::Download, &[TransferSpec::new(200_000, 12)], Arc::clone(&counter))
        .await
        .unwrap();

    assert_eq!(report, PoolReport { completed: 12, failed: 0 });
    assert_eq!(state.max_in_flight.load(Ordering::SeqCst), 3);
    assert_eq!(state.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn jobs_are_admitted_in_spec_order() {
    let (pool, state) = pool(MockState::default(), 1, CancellationToken::new());
    let specs = [TransferSpec::new(100, 2), TransferSpec::new(200, 2), TransferSpec::new(300, 2)];

    pool.run(Direction::Download, &specs, Arc::new(AtomicU64::new(0)))
        .await
        .unwrap();

    let sizes: Vec<String> = state
        .transfer_urls()
        .iter()
        .map(|url| url.split("bytes=").nth(1).unwrap().split('&').next().unwrap().to_string())
        .collect();
    assert_eq!(sizes, ["100", "100", "200", "200", "300", "300"]);
}

#[tokio::test(start_paused = true)]
async fn failed_jobs_are_counted_and_skipped() {
    let state = MockState {
        transfer_status: 500,
        ..MockState::default()
    };
    let (pool, _state) = pool(state, 4, CancellationToken::new());
    let counter = Arc::new(AtomicU64::new(0));

    let report = pool
        .run(Direction::Download, &[TransferSpec::new(1_000, 6)], Arc::clone(&counter))
        .await
        .unwrap();

    assert_eq!(report, PoolReport { completed: 0, failed: 6 });
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn empty_sequence_completes_immediately() {
    let (pool, state) = pool(MockState::default(), 4, CancellationToken::new());

    let report = pool
        .run(Direction::Upload, &[], Arc::new(AtomicU64::new(0)))
        .await
        .unwrap();

    assert_eq!(report, PoolReport::default());
    assert!(state.transfer_urls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_admission_promptly() {
    let cancel = CancellationToken::new();
    let (pool, state) = pool(MockState::default(), 4, cancel.clone());
    let counter = Arc::new(AtomicU64::new(0));

    let (outcome, cancelled_at) = tokio::join!(
        async {
            let outcome = pool
                .run(Direction::Download, &[TransferSpec::new(1_000_000, 20)], counter)
                .await;
            (outcome, Instant::now())
        },
        async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            cancel.cancel();
            Instant::now()
        }
    );
    let (outcome, returned_at) = outcome;

    assert!(matches!(outcome, Err(Error::Cancelled)));
    assert!(returned_at.duration_since(cancelled_at) < Duration::from_millis(50));

    // Each transfer takes 800ms, so only the first four ever started.
    let starts = state.transfer_starts();
    assert_eq!(starts.len(), 4);
    assert!(starts.iter().all(|start| *start <= cancelled_at));
}

#[tokio::test]
async fn payload_is_random_and_full_size() {
    let a = random_payload().unwrap();
    let b = random_payload().unwrap();
    assert_eq!(a.len(), 1_000_000);
    assert_ne!(a, b);
    assert_ne!(a, Bytes::from(vec![0u8; 1_000_000]));
}
