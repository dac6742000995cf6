//! I/O and effectful computations for a measurement run.
//!
//! Everything that touches the network, a clock or a task lives here. The
//! network is reached only through the [`Transport`] trait, so the whole
//! engine can run against an in-process mock.

mod engine;
mod latency;
mod meta;
mod observer;
mod pool;
mod sampler;
mod transport;

pub use engine::Engine;
pub use latency::{LatencyProber, LoadedLatencyHandle, LoadedLatencyMeasurer, measure_idle_latency};
pub use meta::{CLIENT_CITY_TIMEOUT, MetadataResolver};
pub use observer::{ChannelObserver, Event, NoopObserver, ProgressObserver};
pub use pool::{Direction, PoolReport, TransferPool, random_payload};
pub use sampler::{BandwidthSampler, SamplerHandle};
pub use transport::{BoxStream, Response, Transport, UploadBody, UploadStream};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
