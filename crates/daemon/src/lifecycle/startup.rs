// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::Mutex;
use tracing::info;

use fc_core::{Clock, SystemClock};
use fc_storage::{JobStore, SnapshotFile};

use super::{Daemon, LifecycleError};
use crate::config::Config;

/// Start the daemon on the system clock
pub fn startup(config: &Config) -> Result<Daemon<SystemClock>, LifecycleError> {
    startup_with_clock(config, SystemClock)
}

/// Acquire the lock file, recover the job store and log the settings.
pub fn startup_with_clock<C: Clock>(
    config: &Config,
    clock: C,
) -> Result<Daemon<C>, LifecycleError> {
    // 1. Create state directory (needed for lock and snapshot)
    if let Some(parent) = config.lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - prevents two daemons sharing a snapshot
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file (truncate now that we hold the lock)
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Recover the job store
    let (store, load_outcome) = JobStore::open(
        SnapshotFile::new(&config.snapshot_path),
        config.retry_timeout,
        clock.clone(),
        config.reset,
    )?;

    log_settings(config);

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        store: Arc::new(Mutex::new(store)),
        load_outcome,
        clock,
    })
}

fn log_settings(config: &Config) {
    info!("--- Main settings ---");
    info!("Job folder         -> {}", config.jobs_dir.display());
    info!("Job check interval -> {} seconds", config.sleep_secs);
    info!("Discovery          -> {}", config.discovery_every);
    info!("Retry timeout      -> {} minutes", config.retry_timeout.num_minutes());
    info!("Snapshot           -> {}", config.snapshot_path.display());
    info!("Logs folder        -> {}", config.logs_dir.display());
    match config.max_concurrent_runs {
        Some(max) => info!("Concurrent runs    -> {max}"),
        None => info!("Concurrent runs    -> unlimited"),
    }
}
