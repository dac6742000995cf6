use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Public speed test endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://speed.cloudflare.com";

/// A transfer size and how many times to repeat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSpec {
    /// Size of one transfer in bytes.
    pub bytes: u64,

    /// Number of transfers of this size.
    pub count: usize,
}

impl TransferSpec {
    pub const fn new(bytes: u64, count: usize) -> Self {
        Self { bytes, count }
    }

    /// Total bytes moved by this spec.
    pub fn total_bytes(&self) -> u64 {
        self.bytes.saturating_mul(self.count as u64)
    }
}

/// Tunable parameters for a measurement run.
///
/// A `Config` is fixed for the duration of a run.
///
/// # Examples
///
/// ```
/// use brr_speedtest::Config;
/// use std::time::Duration;
///
/// let config = Config::default()
///     .max_connections(8)
///     .latency_probes(10)
///     .sample_interval(Duration::from_millis(200));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the speed test endpoint, without a trailing slash.
    ///
    /// Default: `https://speed.cloudflare.com`
    pub endpoint: String,

    /// Download transfers, executed in order.
    pub download_sequence: Vec<TransferSpec>,

    /// Upload transfers, executed in order.
    pub upload_sequence: Vec<TransferSpec>,

    /// Maximum number of transfers in flight at once.
    ///
    /// Default: 16
    pub max_connections: usize,

    /// Interval between throughput samples.
    ///
    /// Default: 100ms
    pub sample_interval: Duration,

    /// Number of sequential idle latency probes.
    ///
    /// Default: 20
    pub latency_probes: usize,

    /// Interval between latency probes while a transfer phase is running.
    ///
    /// Default: 400ms
    pub latency_interval: Duration,

    /// Span after the first throughput sample that is left out of the
    /// phase summary.
    ///
    /// Default: 2s
    pub warmup: Duration,

    /// Look up the client's city from its public IP after the trace
    /// request. Best effort: failures leave the city empty.
    ///
    /// Default: true
    pub resolve_client_city: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            download_sequence: vec![
                TransferSpec::new(100_000, 10),
                TransferSpec::new(1_000_000, 8),
                TransferSpec::new(10_000_000, 6),
                TransferSpec::new(25_000_000, 4),
            ],
            upload_sequence: vec![
                TransferSpec::new(11_000, 10),
                TransferSpec::new(101_000, 10),
                TransferSpec::new(1_000_000, 8),
            ],
            max_connections: 16,
            sample_interval: Duration::from_millis(100),
            latency_probes: 20,
            latency_interval: Duration::from_millis(400),
            warmup: Duration::from_secs(2),
            resolve_client_city: true,
        }
    }
}

impl Config {
    /// Set the endpoint base URL. A trailing slash is stripped.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn download_sequence(mut self, specs: Vec<TransferSpec>) -> Self {
        self.download_sequence = specs;
        self
    }

    #[must_use]
    pub fn upload_sequence(mut self, specs: Vec<TransferSpec>) -> Self {
        self.upload_sequence = specs;
        self
    }

    #[must_use]
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    #[must_use]
    pub fn latency_probes(mut self, probes: usize) -> Self {
        self.latency_probes = probes;
        self
    }

    #[must_use]
    pub fn latency_interval(mut self, interval: Duration) -> Self {
        self.latency_interval = interval;
        self
    }

    #[must_use]
    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    #[must_use]
    pub fn resolve_client_city(mut self, resolve: bool) -> Self {
        self.resolve_client_city = resolve;
        self
    }

    /// Check the parameters a run cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::InvalidConfig("endpoint must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(Error::InvalidConfig(
                "max_connections must be at least 1".into(),
            ));
        }
        if self.sample_interval.is_zero() {
            return Err(Error::InvalidConfig("sample_interval must be non-zero".into()));
        }
        if self.latency_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "latency_interval must be non-zero".into(),
            ));
        }
        if self.latency_probes == 0 {
            return Err(Error::InvalidConfig(
                "latency_probes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
