use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use brr_speedtest::{Config, Engine, ReqwestTransport, TransportOptions};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::App;
use crate::env::BrrEnv;
use crate::report::{LogObserver, summary_line};
use crate::settings::FileConfig;

mod cli;
mod env;
mod report;
mod settings;

#[tokio::main]
async fn main() -> ExitCode {
    let app = App::parse();
    init_logging(app.log_level());

    match run(&app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_cancelled(&e) => {
            eprintln!("aborted");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only the result.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(app: &App) -> Result<Config> {
    let env = BrrEnv::new();
    let mut config = Config::default();

    if let Some(location) = env.config_location(app.config.as_deref()) {
        if let Some(text) = location.read()? {
            debug!(path = %location.path.display(), "loading config file");
            config = FileConfig::parse(&text)
                .with_context(|| format!("Invalid config file {}", location.path.display()))?
                .apply(config);
        }
    }

    let config = app.apply(config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(app: &App) -> Result<()> {
    let config = load_config(app)?;
    let options = TransportOptions::default().pool_max_idle_per_host(config.max_connections);
    let transport = ReqwestTransport::new(&options).context("Failed to set up HTTP client")?;
    let engine = Engine::new(transport, config)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, stopping");
                cancel.cancel();
            }
        }
    });

    info!(endpoint = %engine.config().endpoint, "starting speed test");
    let result = engine
        .run(Arc::new(LogObserver), cancel)
        .await
        .context("Speed test failed")?;

    println!("{}", summary_line(&result));
    println!("{}", result.context_line);
    Ok(())
}

fn is_cancelled(e: &anyhow::Error) -> bool {
    e.downcast_ref::<brr_speedtest::Error>()
        .is_some_and(brr_speedtest::Error::is_cancelled)
}
