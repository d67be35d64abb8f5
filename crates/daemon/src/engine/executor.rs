// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job executor

use crate::adapters::{ProcessOutput, ProcessRunner};
use crate::engine::SharedStore;
use crate::status::JobStatus;
use fc_core::{Clock, Job, RunId};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs due jobs, one task per job.
///
/// Jobs are locked under the store guard before their task is spawned, so
/// a job can never be picked up twice while an execution is in flight.
#[derive(Clone)]
pub struct Executor<R, C: Clock> {
    store: SharedStore<C>,
    runner: R,
    /// Present when simultaneous executions are capped
    permits: Option<Arc<Semaphore>>,
}

impl<R, C> Executor<R, C>
where
    R: ProcessRunner,
    C: Clock,
{
    pub fn new(store: SharedStore<C>, runner: R, max_concurrent: Option<NonZeroUsize>) -> Self {
        Self {
            store,
            runner,
            permits: max_concurrent.map(|n| Arc::new(Semaphore::new(n.get()))),
        }
    }

    pub fn store(&self) -> &SharedStore<C> {
        &self.store
    }

    /// Get a reference to the process runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Lock every runnable job and spawn its execution into `tasks`.
    ///
    /// Returns how many executions were started. Does not wait for them.
    pub fn dispatch(&self, tasks: &mut JoinSet<Option<JobStatus>>) -> usize {
        let claimed = self.store.lock().claim_runnable();
        let count = claimed.len();
        for job in claimed {
            tracing::debug!(job = job.name(), reason = %job.run_reason(), "dispatching");
            let this = self.clone();
            tasks.spawn(async move { this.execute(job).await });
        }
        if count > 0 {
            tracing::debug!(count, "finished dispatching executions");
        }
        count
    }

    /// Run one locked job to completion and record the outcome.
    ///
    /// Returns `None` when the store no longer holds this execution's lock,
    /// which happens when the job was removed and registered again.
    pub async fn execute(&self, job: Job) -> Option<JobStatus> {
        // Queued jobs stay locked while they wait for a permit
        let _permit = match &self.permits {
            Some(permits) => Arc::clone(permits).acquire_owned().await.ok(),
            None => None,
        };

        let run_id = RunId::new();
        let script = job.identity();
        let cwd = script.parent().unwrap_or(script);
        tracing::debug!(job = job.name(), run_id = %run_id, script = %script.display(), "trying to execute");

        let output = match self.runner.run(script, cwd).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(job = job.name(), run_id = %run_id, error = %e, "failed to start script");
                ProcessOutput::spawn_failure(&e)
            }
        };

        // Applying the outcome writes the snapshot
        let store = Arc::clone(&self.store);
        let status = match tokio::task::spawn_blocking(move || record(&store, &job, run_id, output))
            .await
        {
            Ok(Some(status)) => status,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(error = %e, "recording outcome failed");
                return None;
            }
        };

        status.emit();
        Some(status)
    }
}

/// Apply `output` to the job under the store guard.
fn record<C: Clock>(
    store: &SharedStore<C>,
    job: &Job,
    run_id: RunId,
    output: ProcessOutput,
) -> Option<JobStatus> {
    let mut store = store.lock();
    let script = job.identity();
    if !store.holds_claim(script, job.locked_at()) {
        tracing::warn!(job = job.name(), run_id = %run_id, "job changed while running, outcome not recorded");
        return None;
    }

    let retry = store.retry_timeout();
    let recorded = if output.success() {
        tracing::debug!(job = job.name(), run_id = %run_id, "succeeded");
        store.job_successful(script)
    } else {
        tracing::warn!(job = job.name(), run_id = %run_id, exit_code = output.exit_code, "failed");
        store.job_failed(script)
    };
    match recorded {
        Ok(updated) => Some(JobStatus::new(updated, run_id, output, retry)),
        Err(e) => {
            tracing::warn!(job = job.name(), error = %e, "outcome not recorded");
            None
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
