// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job table keyed by script path.

use chrono::{NaiveDateTime, TimeDelta};
use fc_core::{Clock, InvalidJob, Job};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Every known job, keyed by the absolute path of its script.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobTable {
    jobs: BTreeMap<PathBuf, Job>,
}

impl JobTable {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, identity: &Path) -> Option<&Job> {
        self.jobs.get(identity)
    }

    pub(crate) fn get_mut(&mut self, identity: &Path) -> Option<&mut Job> {
        self.jobs.get_mut(identity)
    }

    pub fn contains(&self, identity: &Path) -> bool {
        self.jobs.contains_key(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Insert a job under its own identity, replacing any previous entry.
    pub fn insert(&mut self, job: Job) {
        self.jobs.insert(job.identity().to_path_buf(), job);
    }

    /// Existing job for `script`, or a newly parsed one inserted on the spot.
    pub fn fetch<C: Clock>(
        &mut self,
        root: &Path,
        script: &Path,
        clock: &C,
    ) -> Result<&Job, InvalidJob> {
        match self.jobs.entry(script.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(Job::from_script(root, script, clock)?)),
        }
    }

    /// Remove every unlocked job whose script is not in `present`.
    ///
    /// A locked job is still running and is left for a later purge.
    pub fn purge_missing(&mut self, present: &HashSet<PathBuf>) -> Vec<Job> {
        let missing: Vec<PathBuf> = self
            .jobs
            .iter()
            .filter(|(path, job)| !job.is_locked() && !present.contains(*path))
            .map(|(path, _)| path.clone())
            .collect();
        missing.iter().filter_map(|path| self.jobs.remove(path)).collect()
    }

    /// Identities of unlocked jobs whose next execution is before `now`.
    pub fn runnable(&self, now: NaiveDateTime, retry_timeout: TimeDelta) -> Vec<PathBuf> {
        self.jobs
            .values()
            .filter(|job| job.is_due(now, retry_timeout))
            .map(|job| job.identity().to_path_buf())
            .collect()
    }

    /// Clear locks left over from a previous process. Returns how many.
    pub fn release_stale_locks(&mut self) -> usize {
        let mut released = 0;
        for job in self.jobs.values_mut() {
            if job.release_stale_lock() {
                released += 1;
            }
        }
        released
    }

    /// Next execution per job, soonest first.
    pub fn upcoming(&self, retry_timeout: TimeDelta) -> Vec<(&Job, NaiveDateTime)> {
        let mut upcoming: Vec<_> =
            self.jobs.values().map(|job| (job, job.next_execution(retry_timeout))).collect();
        upcoming.sort_by_key(|(_, next)| *next);
        upcoming
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
