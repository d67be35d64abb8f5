// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution status records.
//!
//! One record is written for every finished execution on the
//! [`STATUS_TARGET`] log target, which the logging setup routes to the
//! rotating `job_status.log` file.

use crate::adapters::ProcessOutput;
use chrono::{NaiveDateTime, TimeDelta};
use fc_core::{Job, RunId, RunReason};
use serde::Serialize;
use std::path::PathBuf;

/// Log target carrying status records
pub const STATUS_TARGET: &str = "job_status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub identity: PathBuf,
    pub name: String,
    pub correlation_id: RunId,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub next_run: NaiveDateTime,
    /// Why the next run will happen
    pub run_reason: RunReason,
    pub consecutive_failures: u32,
    pub started_at: Option<NaiveDateTime>,
    pub ended_at: Option<NaiveDateTime>,
    pub runtime: Option<String>,
}

impl JobStatus {
    /// Record for `job` after its outcome has been applied.
    pub fn new(job: &Job, correlation_id: RunId, output: ProcessOutput, retry: TimeDelta) -> Self {
        let runtime = match job.runtime() {
            Ok(runtime) => Some(runtime),
            Err(e) => {
                tracing::error!(job = job.name(), error = %e, "cannot compute runtime");
                None
            }
        };
        Self {
            identity: job.identity().to_path_buf(),
            name: job.name().to_string(),
            correlation_id,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            next_run: job.next_execution(retry),
            run_reason: job.run_reason(),
            consecutive_failures: job.consecutive_failures(),
            started_at: job.locked_at(),
            ended_at: job.unlocked_at(),
            runtime,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Write the record to the status log.
    pub fn emit(&self) {
        let record = match serde_json::to_string(self) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(job = %self.name, error = %e, "failed to serialize job status");
                return;
            }
        };
        if self.succeeded() {
            tracing::info!(target: STATUS_TARGET, status = "JOB SUCCEEDED", "{record}");
        } else {
            tracing::warn!(target: STATUS_TARGET, status = "JOB FAILED", "{record}");
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
