//! Base server binary.
//!
//! Loads `config.json`, initialises logging, and runs one subcommand:
//!
//! - `serve` (default): API server on a background task, dashboard server
//!   on the main task, optional self test after a startup delay. Both
//!   servers stop on Ctrl-C.
//! - `ports`: print the ports derived from the configuration.
//! - `bist`: run the self test against running servers, save the report,
//!   and print it as JSON.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use base_server_bist::run_bist;
use base_server_core::AppConfig;
use base_server_core::config::{LogFormat, LoggingConfig};
use base_server_events::EventStore;
use base_server_web::{AppState, ServerConfig, build_dashboard_router, spawn_api_server, start_server};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, render_ports};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command() {
        Command::Serve => {
            init_tracing(&config.logging);
            serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ports(args) => {
            println!("{}", render_ports(&config.ports(), args)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Bist => {
            init_tracing(&config.logging);
            let report = run_bist(&config).await.context("self test failed to run")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let ports = config.ports();
    info!(
        host = %config.run_details.host,
        dashboard_port = ports.dashboard_port,
        api_port = ports.api_port,
        routes = config.api_details.routes.len(),
        "base-server starting"
    );

    let config = Arc::new(config);
    let events = Arc::new(EventStore::open(config.storage.events_dir.clone()));
    let state = Arc::new(
        AppState::new(Arc::clone(&config), events).context("failed to build server state")?,
    );

    let api_handle = spawn_api_server(Arc::clone(&state), shutdown_signal())
        .context("failed to start API server")?;

    if config.bist.run_on_startup {
        let bist_config = Arc::clone(&config);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(bist_config.bist.startup_delay_ms)).await;
            match run_bist(&bist_config).await {
                Ok(report) => info!(
                    total = report.summary.total,
                    passed = report.summary.passed,
                    failed = report.summary.failed,
                    "startup self test finished"
                ),
                Err(e) => warn!(error = %e, "startup self test failed to run"),
            }
        });
    }

    let dashboard = ServerConfig {
        name: "dashboard",
        host: config.run_details.host.clone(),
        port: ports.dashboard_port,
    };
    start_server(&dashboard, build_dashboard_router(state), shutdown_signal())
        .await
        .context("dashboard server failed")?;

    if let Err(e) = api_handle.await {
        warn!(error = %e, "API server task did not finish cleanly");
    }
    info!("base-server shutdown complete");
    Ok(())
}
