// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job entity and its run state machine.
//!
//! ```text
//!            lock()                 success() / fail()
//!   Idle ───────────────▶ Locked ─────────────────────▶ Idle
//! ```
//!
//! A job is locked for exactly the duration of one execution. Success and
//! failure both return it to idle; they only differ in the bookkeeping that
//! decides when it runs next.

use crate::clock::Clock;
use crate::interval::Interval;
use crate::schedule::{parse_script_path, relative_name, InvalidJob};
use crate::time_fmt::format_runtime;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a job is going to run next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunReason {
    #[default]
    Scheduled,
    RetryAfterFailure,
}

crate::simple_display! {
    RunReason {
        Scheduled => "Scheduled run",
        RetryAfterFailure => "Job failed rerun",
    }
}

/// Contract violations on the job state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job {0} is already locked")]
    AlreadyLocked(String),
    #[error("cannot calculate runtime while job {0} is running")]
    StillRunning(String),
    #[error("job {0} has not completed a run yet")]
    NeverRan(String),
}

/// A script discovered under the job root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Absolute path to the script; also the store key
    identity: PathBuf,
    /// Path relative to the job root, for logs
    name: String,
    interval: Interval,
    last_success_at: NaiveDateTime,
    #[serde(default)]
    last_failure_at: Option<NaiveDateTime>,
    #[serde(default)]
    consecutive_failures: u32,
    #[serde(default)]
    run_reason: RunReason,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    locked_at: Option<NaiveDateTime>,
    #[serde(default)]
    unlocked_at: Option<NaiveDateTime>,
}

impl Job {
    /// Build a job for `script`, parsing its schedule from the folders
    /// between `root` and the script.
    pub fn from_script<C: Clock>(root: &Path, script: &Path, clock: &C) -> Result<Self, InvalidJob> {
        let interval = parse_script_path(root, script)?;
        let name = relative_name(root, script)?.to_string_lossy().into_owned();
        Ok(Self::new(script.to_path_buf(), name, interval, clock))
    }

    pub fn new<C: Clock>(
        identity: PathBuf,
        name: impl Into<String>,
        interval: Interval,
        clock: &C,
    ) -> Self {
        Self {
            identity,
            name: name.into(),
            interval,
            last_success_at: clock.now(),
            last_failure_at: None,
            consecutive_failures: 0,
            run_reason: RunReason::Scheduled,
            locked: false,
            locked_at: None,
            unlocked_at: None,
        }
    }

    pub fn identity(&self) -> &Path {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn last_success_at(&self) -> NaiveDateTime {
        self.last_success_at
    }

    pub fn last_failure_at(&self) -> Option<NaiveDateTime> {
        self.last_failure_at
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn run_reason(&self) -> RunReason {
        self.run_reason
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn locked_at(&self) -> Option<NaiveDateTime> {
        self.locked_at
    }

    pub fn unlocked_at(&self) -> Option<NaiveDateTime> {
        self.unlocked_at
    }

    /// When the job should run next.
    ///
    /// After a failure the retry timeout applies instead of the interval,
    /// until a success resets the failure count.
    pub fn next_execution(&self, retry_timeout: TimeDelta) -> NaiveDateTime {
        match self.last_failure_at {
            Some(failed_at) if self.consecutive_failures > 0 => {
                failed_at.checked_add_signed(retry_timeout).unwrap_or(NaiveDateTime::MAX)
            }
            _ => self.interval.next_after(self.last_success_at),
        }
    }

    /// Unlocked and past its next execution time.
    pub fn is_due(&self, now: NaiveDateTime, retry_timeout: TimeDelta) -> bool {
        !self.locked && self.next_execution(retry_timeout) < now
    }

    /// Claim the job for one execution.
    pub fn lock<C: Clock>(&mut self, clock: &C) -> Result<(), JobError> {
        if self.locked {
            return Err(JobError::AlreadyLocked(self.name.clone()));
        }
        self.locked = true;
        self.locked_at = Some(clock.now());
        Ok(())
    }

    /// Release the execution claim.
    pub fn unlock<C: Clock>(&mut self, clock: &C) {
        self.locked = false;
        self.unlocked_at = Some(clock.now());
    }

    /// Drop a lock left behind by a process that died mid-run.
    ///
    /// Timestamps are kept as they were persisted. Returns whether a lock
    /// was released.
    pub fn release_stale_lock(&mut self) -> bool {
        std::mem::replace(&mut self.locked, false)
    }

    /// The run completed; schedule the next regular run.
    pub fn success<C: Clock>(&mut self, clock: &C) {
        self.last_success_at = clock.now();
        self.consecutive_failures = 0;
        self.run_reason = RunReason::Scheduled;
        self.unlock(clock);
    }

    /// The run failed; schedule a retry after the retry timeout.
    pub fn fail<C: Clock>(&mut self, clock: &C) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure_at = Some(clock.now());
        self.run_reason = RunReason::RetryAfterFailure;
        self.unlock(clock);
    }

    /// Length of the most recent execution window.
    pub fn elapsed(&self) -> Result<TimeDelta, JobError> {
        if self.locked {
            return Err(JobError::StillRunning(self.name.clone()));
        }
        match (self.locked_at, self.unlocked_at) {
            (Some(start), Some(end)) => Ok(end - start),
            _ => Err(JobError::NeverRan(self.name.clone())),
        }
    }

    /// Most recent execution window, formatted for humans.
    pub fn runtime(&self) -> Result<String, JobError> {
        self.elapsed().map(format_runtime)
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            identity: PathBuf = "/srv/jobs/1min/test.sh",
            name: String = "1min/test.sh",
        }
        set {
            interval: Interval = crate::test_support::minutely(),
            last_success_at: NaiveDateTime = crate::test_support::at(2024, 3, 1, 10, 0),
            last_failure_at: Option<NaiveDateTime> = None,
            consecutive_failures: u32 = 0,
            run_reason: RunReason = RunReason::Scheduled,
            locked: bool = false,
            locked_at: Option<NaiveDateTime> = None,
            unlocked_at: Option<NaiveDateTime> = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
