// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and the long-running scheduler.

mod startup;
pub use startup::{startup, startup_with_clock};

use std::fs::File;
use std::sync::Arc;

use fc_core::Clock;
use fc_storage::LoadOutcome;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::adapters::ProcessRunner;
use crate::config::Config;
use crate::discovery::Discovery;
use crate::engine::{Coordinator, Executor, SharedStore};

/// Daemon state during operation.
pub struct Daemon<C: Clock> {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Job store shared by the executor and discovery
    pub store: SharedStore<C>,
    /// How the store was recovered at startup
    pub load_outcome: LoadOutcome,
    clock: C,
}

impl<C: Clock> Daemon<C> {
    /// Wire the store into an executor, discovery and scheduler loop.
    pub fn coordinator<R: ProcessRunner>(&self, runner: R) -> Coordinator<R, C> {
        let executor =
            Executor::new(Arc::clone(&self.store), runner, self.config.max_concurrent_runs);
        let discovery = Discovery::new(
            self.config.jobs_dir.clone(),
            self.config.discovery_every,
            self.clock.clone(),
        );
        Coordinator::new(executor, discovery, self.config.tick)
    }

    /// Run the scheduler until `shutdown` fires, then write a final snapshot.
    pub async fn run<R: ProcessRunner>(self, runner: R, shutdown: CancellationToken) {
        self.coordinator(runner).run(shutdown).await;
        self.shutdown();
    }

    fn shutdown(&self) {
        if let Err(e) = self.store.lock().persist() {
            tracing::warn!(error = %e, "failed to save final snapshot");
        }
        tracing::info!("daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] fc_storage::SnapshotError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
