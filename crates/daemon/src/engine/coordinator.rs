// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler loop.
//!
//! Each tick dispatches every due job, then gives discovery a chance to
//! reconcile the store with the job folder, then sleeps. Executions are
//! never awaited by the loop; finished tasks are reaped on later ticks.

use crate::adapters::ProcessRunner;
use crate::discovery::{Discovery, DiscoveryReport};
use crate::engine::Executor;
use crate::status::JobStatus;
use fc_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub dispatched: usize,
    /// Present when discovery ran this tick
    pub discovery: Option<DiscoveryReport>,
}

pub struct Coordinator<R, C: Clock> {
    executor: Executor<R, C>,
    discovery: Discovery<C>,
    sleep: Duration,
    running: JoinSet<Option<JobStatus>>,
}

impl<R, C> Coordinator<R, C>
where
    R: ProcessRunner,
    C: Clock,
{
    pub fn new(executor: Executor<R, C>, discovery: Discovery<C>, sleep: Duration) -> Self {
        Self { executor, discovery, sleep, running: JoinSet::new() }
    }

    pub fn executor(&self) -> &Executor<R, C> {
        &self.executor
    }

    pub fn discovery(&self) -> &Discovery<C> {
        &self.discovery
    }

    /// Executions started and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// One scheduler iteration.
    pub async fn tick(&mut self) -> TickReport {
        self.reap();

        let dispatched = self.executor.dispatch(&mut self.running);
        self.log_upcoming();

        let discovery = self.discover().await;
        TickReport { dispatched, discovery }
    }

    /// Run a due discovery cycle on the blocking pool.
    ///
    /// The walk and the snapshot write both block.
    async fn discover(&mut self) -> Option<DiscoveryReport> {
        if !self.discovery.is_due() {
            return None;
        }
        let mut discovery = self.discovery.clone();
        let store = Arc::clone(self.executor.store());
        let joined = tokio::task::spawn_blocking(move || {
            let result = discovery.run(&store);
            (discovery, result)
        })
        .await;

        match joined {
            Ok((discovery, Ok(report))) => {
                self.discovery = discovery;
                Some(report)
            }
            Ok((_, Err(e))) => {
                error!(error = %e, "job discovery failed");
                None
            }
            Err(e) => {
                error!(error = %e, "job discovery task failed");
                None
            }
        }
    }

    /// Tick until `shutdown` fires.
    ///
    /// Executions still running at shutdown are left to finish on their own.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(sleep_secs = self.sleep.as_secs_f64(), "scheduler started");
        loop {
            self.tick().await;
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.sleep) => {}
            }
        }

        self.reap();
        let in_flight = self.running.len();
        if in_flight > 0 {
            warn!(in_flight, "shutting down with executions still running");
        }
        self.running.detach_all();
        info!("scheduler stopped");
    }

    /// Wait for every started execution and return their status records.
    pub async fn wait_idle(&mut self) -> Vec<JobStatus> {
        let mut finished = Vec::new();
        while let Some(result) = self.running.join_next().await {
            match result {
                Ok(Some(status)) => finished.push(status),
                Ok(None) => {}
                Err(e) => error!(error = %e, "execution task failed"),
            }
        }
        finished
    }

    fn reap(&mut self) {
        while let Some(result) = self.running.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "execution task failed");
            }
        }
    }

    fn log_upcoming(&self) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        let (now, upcoming) = {
            let store = self.executor.store().lock();
            (store.clock().now(), store.upcoming())
        };
        for (name, next) in upcoming {
            let in_secs = (next - now).num_seconds().max(0);
            debug!(job = %name, next = %next, in_secs, "upcoming execution");
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
