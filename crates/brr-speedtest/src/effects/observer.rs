use tokio::sync::mpsc::UnboundedSender;

use crate::data::{LatencySample, Phase, Sample};

/// Receives progress from a running measurement.
///
/// Every method defaults to a no-op so implementors only override what they
/// display. Callbacks run on the engine's tasks and must return quickly.
pub trait ProgressObserver: Send + Sync {
    /// A new phase is about to start.
    fn on_phase(&self, _phase: Phase) {}

    fn on_download_sample(&self, _sample: &Sample) {}

    fn on_upload_sample(&self, _sample: &Sample) {}

    fn on_idle_latency(&self, _sample: &LatencySample) {}

    /// A latency probe completed while `phase` was generating load.
    fn on_loaded_latency(&self, _phase: Phase, _sample: &LatencySample) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// A progress callback as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Phase(Phase),
    DownloadSample(Sample),
    UploadSample(Sample),
    IdleLatency(LatencySample),
    LoadedLatency { phase: Phase, sample: LatencySample },
}

/// Observer that forwards every callback as an [`Event`] over a channel.
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<Event>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_phase(&self, phase: Phase) {
        self.send(Event::Phase(phase));
    }

    fn on_download_sample(&self, sample: &Sample) {
        self.send(Event::DownloadSample(*sample));
    }

    fn on_upload_sample(&self, sample: &Sample) {
        self.send(Event::UploadSample(*sample));
    }

    fn on_idle_latency(&self, sample: &LatencySample) {
        self.send(Event::IdleLatency(*sample));
    }

    fn on_loaded_latency(&self, phase: Phase, sample: &LatencySample) {
        self.send(Event::LoadedLatency {
            phase,
            sample: *sample,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn test_channel_observer_forwards_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = ChannelObserver::new(tx);
        let sample = LatencySample {
            timestamp: Duration::from_millis(400),
            rtt_ms: 18.5,
        };

        observer.on_phase(Phase::Download);
        observer.on_loaded_latency(Phase::Download, &sample);

        assert_eq!(rx.try_recv().unwrap(), Event::Phase(Phase::Download));
        assert_eq!(
            rx.try_recv().unwrap(),
            Event::LoadedLatency {
                phase: Phase::Download,
                sample
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_observer_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelObserver::new(tx).on_phase(Phase::Meta);
    }
}
