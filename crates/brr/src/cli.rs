use std::path::PathBuf;

use brr_speedtest::Config;
use clap::{ArgAction, Parser};

#[derive(Clone, Debug, Parser)]
#[command(name = "brr", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    #[arg(long, short, help = "Config file (TOML) to load instead of the default one")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Base URL of the speed test server")]
    pub server: Option<String>,

    #[arg(long, short = 'n', help = "Maximum number of parallel transfers")]
    pub connections: Option<usize>,

    #[arg(long, help = "Number of idle latency probes")]
    pub probes: Option<usize>,

    #[arg(long, help = "Do not look up the client's city")]
    pub no_city: bool,

    #[arg(short, long, action = ArgAction::Count, help = "More log output (-v debug, -vv trace)")]
    pub verbose: u8,
}

impl App {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(server) = &self.server {
            config = config.endpoint(server.as_str());
        }
        if let Some(connections) = self.connections {
            config = config.max_connections(connections);
        }
        if let Some(probes) = self.probes {
            config = config.latency_probes(probes);
        }
        if self.no_city {
            config = config.resolve_client_city(false);
        }
        config
    }

    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
