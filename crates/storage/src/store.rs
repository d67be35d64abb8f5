// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job store: the job table plus its snapshot.
//!
//! Every mutation that changes run history is followed by a full snapshot
//! write. Callers share the store behind a single mutex, so applying an
//! outcome and writing the snapshot happen under one guard and two writes
//! can never interleave.

use crate::snapshot::{SnapshotError, SnapshotFile};
use crate::state::JobTable;
use chrono::{NaiveDateTime, TimeDelta};
use fc_core::{Clock, InvalidJob, Job, JobError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown job: {}", .0.display())]
    UnknownJob(PathBuf),
    #[error(transparent)]
    Job(#[from] JobError),
}

/// How the store came up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No snapshot existed (or reset was requested)
    Fresh,
    /// Snapshot loaded; `released` jobs had stale locks cleared
    Restored { jobs: usize, released: usize },
    /// Snapshot was unusable and moved aside to `backup`
    Quarantined { backup: PathBuf },
}

pub struct JobStore<C: Clock> {
    table: JobTable,
    snapshot: Option<SnapshotFile>,
    retry_timeout: TimeDelta,
    clock: C,
}

impl<C: Clock> JobStore<C> {
    /// Store that is never written to disk.
    pub fn in_memory(retry_timeout: TimeDelta, clock: C) -> Self {
        Self { table: JobTable::default(), snapshot: None, retry_timeout, clock }
    }

    /// Open the store backed by `snapshot`.
    ///
    /// With `reset`, any existing snapshot is deleted first. A snapshot that
    /// cannot be parsed is moved to a `.bak` file and the store starts empty.
    /// Every restored job is unlocked: a lock in a snapshot means the previous
    /// process died mid-run.
    pub fn open(
        snapshot: SnapshotFile,
        retry_timeout: TimeDelta,
        clock: C,
        reset: bool,
    ) -> Result<(Self, LoadOutcome), SnapshotError> {
        if reset {
            warn!(path = %snapshot.path().display(), "discarding snapshot, starting fresh");
            snapshot.discard()?;
        }

        let (table, outcome) = match snapshot.load() {
            Ok(Some(loaded)) => {
                let mut table = loaded.jobs;
                let released = table.release_stale_locks();
                info!(jobs = table.len(), released, "loaded previous state from snapshot");
                let jobs = table.len();
                (table, LoadOutcome::Restored { jobs, released })
            }
            Ok(None) => (JobTable::default(), LoadOutcome::Fresh),
            Err(e) if e.is_corruption() => {
                let backup = snapshot.quarantine()?;
                warn!(
                    error = %e,
                    backup = %backup.display(),
                    "snapshot unreadable, moved aside; starting with empty store"
                );
                (JobTable::default(), LoadOutcome::Quarantined { backup })
            }
            Err(e) => return Err(e),
        };

        Ok((Self { table, snapshot: Some(snapshot), retry_timeout, clock }, outcome))
    }

    pub fn table(&self) -> &JobTable {
        &self.table
    }

    pub fn get(&self, identity: &Path) -> Option<&Job> {
        self.table.get(identity)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn retry_timeout(&self) -> TimeDelta {
        self.retry_timeout
    }

    /// Known job for `script`, or a new one parsed from its path.
    pub fn fetch(&mut self, root: &Path, script: &Path) -> Result<&Job, InvalidJob> {
        self.table.fetch(root, script, &self.clock)
    }

    /// Unlocked jobs that are past due right now.
    pub fn runnable(&self) -> Vec<PathBuf> {
        self.table.runnable(self.clock.now(), self.retry_timeout)
    }

    /// Lock a job for execution.
    pub fn lock(&mut self, identity: &Path) -> Result<&Job, StoreError> {
        let clock = self.clock.clone();
        let job = self.job_mut(identity)?;
        job.lock(&clock)?;
        Ok(job)
    }

    /// Whether `identity` is still locked by the claim taken at `locked_at`.
    pub fn holds_claim(&self, identity: &Path, locked_at: Option<NaiveDateTime>) -> bool {
        self.get(identity).is_some_and(|job| job.is_locked() && job.locked_at() == locked_at)
    }

    /// Find the runnable jobs and lock each of them in one step.
    ///
    /// Returns copies of the locked jobs taken right after locking.
    pub fn claim_runnable(&mut self) -> Vec<Job> {
        let mut claimed = Vec::new();
        for identity in self.runnable() {
            match self.lock(&identity) {
                Ok(job) => claimed.push(job.clone()),
                Err(e) => error!(job = %identity.display(), error = %e, "failed to lock job"),
            }
        }
        claimed
    }

    /// Record a successful run and persist.
    pub fn job_successful(&mut self, identity: &Path) -> Result<&Job, StoreError> {
        let clock = self.clock.clone();
        self.job_mut(identity)?.success(&clock);
        self.persist_or_log();
        self.get(identity).ok_or_else(|| StoreError::UnknownJob(identity.to_path_buf()))
    }

    /// Record a failed run and persist.
    pub fn job_failed(&mut self, identity: &Path) -> Result<&Job, StoreError> {
        let clock = self.clock.clone();
        self.job_mut(identity)?.fail(&clock);
        self.persist_or_log();
        self.get(identity).ok_or_else(|| StoreError::UnknownJob(identity.to_path_buf()))
    }

    /// Drop jobs whose script is no longer present, then persist.
    pub fn purge_missing(&mut self, present: &HashSet<PathBuf>) -> Vec<Job> {
        let removed = self.table.purge_missing(present);
        for job in &removed {
            warn!(job = job.name(), "no longer exists in job folder, removing");
        }
        self.persist_or_log();
        removed
    }

    /// Write the snapshot. A memory-only store does nothing.
    pub fn persist(&self) -> Result<(), SnapshotError> {
        match &self.snapshot {
            Some(file) => {
                debug!(path = %file.path().display(), jobs = self.table.len(), "writing store to file");
                file.save(&self.table)
            }
            None => Ok(()),
        }
    }

    /// Next execution time per job, soonest first.
    pub fn upcoming(&self) -> Vec<(String, NaiveDateTime)> {
        self.table
            .upcoming(self.retry_timeout)
            .into_iter()
            .map(|(job, next)| (job.name().to_string(), next))
            .collect()
    }

    fn persist_or_log(&self) {
        if let Err(e) = self.persist() {
            error!(error = %e, "failed to write snapshot");
        }
    }

    fn job_mut(&mut self, identity: &Path) -> Result<&mut Job, StoreError> {
        self.table.get_mut(identity).ok_or_else(|| StoreError::UnknownJob(identity.to_path_buf()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
