use std::time::Duration;

use anyhow::{Context, Result};
use brr_speedtest::{Config, TransferSpec};
use serde::Deserialize;

/// Overrides read from the TOML config file. Every field is optional.
///
/// ```toml
/// endpoint = "https://speed.cloudflare.com"
/// max_connections = 8
/// sample_interval_ms = 100
///
/// [[download_sequence]]
/// bytes = 10000000
/// count = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub max_connections: Option<usize>,
    pub sample_interval_ms: Option<u64>,
    pub latency_probes: Option<usize>,
    pub latency_interval_ms: Option<u64>,
    pub warmup_ms: Option<u64>,
    pub resolve_client_city: Option<bool>,
    pub download_sequence: Option<Vec<TransferSpec>>,
    pub upload_sequence: Option<Vec<TransferSpec>>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse config file")
    }

    pub fn apply(self, mut config: Config) -> Config {
        if let Some(endpoint) = self.endpoint {
            config = config.endpoint(endpoint);
        }
        if let Some(max) = self.max_connections {
            config = config.max_connections(max);
        }
        if let Some(ms) = self.sample_interval_ms {
            config = config.sample_interval(Duration::from_millis(ms));
        }
        if let Some(probes) = self.latency_probes {
            config = config.latency_probes(probes);
        }
        if let Some(ms) = self.latency_interval_ms {
            config = config.latency_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = self.warmup_ms {
            config = config.warmup(Duration::from_millis(ms));
        }
        if let Some(resolve) = self.resolve_client_city {
            config = config.resolve_client_city(resolve);
        }
        if let Some(specs) = self.download_sequence {
            config = config.download_sequence(specs);
        }
        if let Some(specs) = self.upload_sequence {
            config = config.upload_sequence(specs);
        }
        config
    }
}
