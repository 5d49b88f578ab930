//! SynthOS entry point.
//!
//! Binary name: `synthos`
//!
//! Loads the configuration, initializes tracing and storage, then either runs
//! the bot fleet until a shutdown signal arrives or performs a one-off
//! maintenance command.

mod cli;
mod state;

use anyhow::Context as _;
use clap::Parser;
use dialoguer::Confirm;
use secrecy::SecretString;

use synthos_core::platform::connection::{Connection, ConnectionFactory};
use synthos_infra::config::load_config;
use synthos_infra::discord::SerenityConnectionFactory;
use synthos_observe::tracing_setup::{self, LogOptions};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).await?;

    let log_options = LogOptions {
        json: config.synthos.log_json,
        otel_stdout: config.synthos.otel_stdout,
        ..LogOptions::new(cli.log_override().unwrap_or(config.synthos.log_level.as_str()))
    };
    tracing_setup::init_tracing(&log_options)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Run => run(config).await,
        Commands::PurgeCommands { yes } => {
            purge_commands(&config.synthos.controller.token, yes).await
        }
    };

    tracing_setup::shutdown_tracing();
    result
}

async fn run(config: synthos_types::config::SynthosConfig) -> anyhow::Result<()> {
    let state = AppState::init(config)
        .await
        .context("failed to open tenant database")?;
    let orchestrator = &state.orchestrator;

    orchestrator
        .start_controller(&state.config.synthos.controller.token)
        .await
        .context("failed to start controller session")?;

    let report = orchestrator
        .bootstrap()
        .await
        .context("failed to list tenants")?;
    tracing::info!(
        started = report.started.len(),
        failed = report.failed.len(),
        "tenants bootstrapped"
    );

    println!(
        "  {} SynthOS running with {} tenant session(s)",
        console::style("⚡").bold(),
        console::style(report.started.len()).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    shutdown_signal().await;
    tracing::info!("shutdown requested");

    let stop = orchestrator.stop_all().await;
    for (label, error) in &stop.failed {
        tracing::warn!(session = %label, error = %error, "session did not close cleanly");
    }
    tracing::info!(closed = stop.closed.len(), failed = stop.failed.len(), "sessions stopped");

    state.db_pool.writer.close().await;
    state.db_pool.reader.close().await;

    println!("\n  SynthOS stopped.");
    Ok(())
}

async fn purge_commands(token: &SecretString, yes: bool) -> anyhow::Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete every global command of the controller application?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Aborted.");
            return Ok(());
        }
    }

    let factory = SerenityConnectionFactory::new();
    let (connection, _events) = factory.connect(token)?;
    let removed = connection.delete_all_commands().await?;

    println!(
        "  {} Removed {} global command(s)",
        console::style("✓").green(),
        console::style(removed).cyan()
    );
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
