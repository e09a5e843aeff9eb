//! Switchyard - Entry point
//!
//! Loads the YAML config, starts every listener and blocks until a
//! shutdown signal arrives.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing::{error, info, warn};

use switchyard::app::{telemetry_config, App};
use switchyard::config::ConfigLoader;
use switchyard::server::{wait_for_shutdown, ShutdownError};
use switchyard::telemetry::init_telemetry;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "switchyard", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config/config.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let app = match start(&args).await {
        Ok(app) => app,
        Err(e) => {
            // Logging may not be up yet
            eprintln!("switchyard: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match wait_for_shutdown(app.hooks()).await {
        Ok(()) => {
            info!("shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e @ ShutdownError::DeadlineExceeded { .. }) => {
            error!(error = %e, "forced exit");
            ExitCode::FAILURE
        }
        Err(e @ ShutdownError::Signal(_)) => {
            error!(error = %e, "failed to wait for shutdown signal");
            ExitCode::FAILURE
        }
        Err(e) => {
            warn!(error = %e, "shutdown finished with errors");
            ExitCode::SUCCESS
        }
    }
}

async fn start(args: &Args) -> anyhow::Result<App> {
    let config = ConfigLoader::new()
        .with_file(&args.config)
        .with_context(|| format!("failed to read config {}", args.config.display()))?
        .with_env_prefix("SWITCHYARD")
        .load()
        .context("invalid configuration")?;

    init_telemetry(&telemetry_config(&config)).context("failed to initialize telemetry")?;

    info!(
        version = switchyard::VERSION,
        config = %args.config.display(),
        "starting switchyard"
    );

    let app = App::start(&config).await?;
    for addr in app.local_addrs() {
        info!(%addr, "listening");
    }

    Ok(app)
}
