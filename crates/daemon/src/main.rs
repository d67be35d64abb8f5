// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fcd`: the foldercron daemon.

use anyhow::{Context, Result};
use clap::Parser;
use fc_core::SystemClock;
use fc_daemon::{lifecycle, logging, plan, Cli, Command, Config, ConfigFile, ShellRunner};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file = ConfigFile::discover(cli.config.as_deref())?;
    let config = Config::resolve(file, &cli.overrides())?;

    match cli.action() {
        Command::Plan { script, count } => {
            let plan = plan::plan(&config.jobs_dir, &script, count, &SystemClock)?;
            print!("{plan}");
            Ok(())
        }
        Command::Run => run(config).await,
    }
}

async fn run(config: Config) -> Result<()> {
    let _guard = logging::init(&config.log_level, &config.logs_dir)
        .context("failed to initialize logging")?;

    let daemon = lifecycle::startup(&config)?;
    info!(outcome = ?daemon.load_outcome, "job store ready");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    daemon.run(ShellRunner, shutdown).await;
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                None
            }
        };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received Ctrl-C, stopping"),
        Some(_) = async {
            match sigterm.as_mut() {
                Some(signal) => signal.recv().await,
                None => std::future::pending().await,
            }
        } => info!("received SIGTERM, stopping"),
    }
    shutdown.cancel();
}
