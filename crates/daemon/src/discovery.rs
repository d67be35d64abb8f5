// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job discovery: keep the store in sync with the job folder.
//!
//! Every file below the job root is a candidate job. New files are parsed
//! and registered, files that vanished are purged, and files whose path
//! does not encode a schedule are reported and skipped. Scans are rate
//! limited by a minute interval.

use crate::engine::SharedStore;
use chrono::NaiveDateTime;
use fc_core::{Clock, Interval};
use fc_storage::JobStore;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("job root is not valid UTF-8: {}", .0.display())]
    NonUtf8Root(PathBuf),
    #[error("invalid scan pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Regular files found below the root
    pub scanned: usize,
    /// Jobs registered this cycle
    pub added: usize,
    /// Jobs purged because their script disappeared
    pub removed: usize,
    /// Files whose path is not a valid schedule
    pub invalid: usize,
    /// Entries the walk could not read; nothing is purged when non-zero
    pub unreadable: usize,
}

/// Files found below the job root by one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    pub files: Vec<PathBuf>,
    /// Entries the walk could not read
    pub unreadable: usize,
}

impl Scan {
    /// Every entry below the root was read.
    pub fn is_complete(&self) -> bool {
        self.unreadable == 0
    }
}

#[derive(Clone)]
pub struct Discovery<C: Clock> {
    root: PathBuf,
    check_every: Interval,
    last_check: Option<NaiveDateTime>,
    clock: C,
}

impl<C: Clock> Discovery<C> {
    pub fn new(root: impl Into<PathBuf>, check_every: Interval, clock: C) -> Self {
        Self { root: root.into(), check_every, last_check: None, clock }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// When the last successful cycle finished.
    pub fn last_check(&self) -> Option<NaiveDateTime> {
        self.last_check
    }

    /// Never checked, or the check interval has passed since the last cycle.
    pub fn is_due(&self) -> bool {
        match self.last_check {
            None => true,
            Some(last) => self.check_every.next_after(last) < self.clock.now(),
        }
    }

    /// Run one cycle if the check interval allows it.
    pub fn run_if_due(
        &mut self,
        store: &SharedStore<C>,
    ) -> Result<Option<DiscoveryReport>, DiscoveryError> {
        if !self.is_due() {
            return Ok(None);
        }
        self.run(store).map(Some)
    }

    /// Scan and reconcile unconditionally.
    ///
    /// The filesystem walk happens outside the store guard; only the
    /// reconcile step holds it.
    pub fn run(&mut self, store: &SharedStore<C>) -> Result<DiscoveryReport, DiscoveryError> {
        info!(root = %self.root.display(), "checking for job changes");
        let scan = self.scan()?;
        let report = reconcile(&mut store.lock(), &self.root, &scan);
        self.last_check = Some(self.clock.now());
        info!(
            scanned = report.scanned,
            added = report.added,
            removed = report.removed,
            invalid = report.invalid,
            unreadable = report.unreadable,
            "job discovery finished"
        );
        Ok(report)
    }

    /// Every regular file below the root, at any depth.
    pub fn scan(&self) -> Result<Scan, DiscoveryError> {
        let root = self.root.to_str().ok_or_else(|| DiscoveryError::NonUtf8Root(self.root.clone()))?;
        let pattern = format!("{}/**/*", glob::Pattern::escape(root.trim_end_matches('/')));

        let mut scan = Scan::default();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() => scan.files.push(path),
                Ok(path) => debug!(path = %path.display(), "skipping non-file"),
                Err(e) => {
                    warn!(path = %e.path().display(), error = %e.error(), "unreadable entry");
                    scan.unreadable += 1;
                }
            }
        }
        Ok(scan)
    }
}

/// Register new scripts and purge vanished ones.
///
/// Purging only happens after a complete walk; a script below an unreadable
/// folder is not gone.
pub fn reconcile<C: Clock>(store: &mut JobStore<C>, root: &Path, scan: &Scan) -> DiscoveryReport {
    let mut report = DiscoveryReport {
        scanned: scan.files.len(),
        unreadable: scan.unreadable,
        ..DiscoveryReport::default()
    };

    for path in &scan.files {
        let known = store.get(path).is_some();
        match store.fetch(root, path) {
            Ok(job) if !known => {
                info!(job = job.name(), interval = %job.interval(), "registered new job");
                report.added += 1;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "skipping invalid script");
                report.invalid += 1;
            }
        }
    }

    if !scan.is_complete() {
        warn!(unreadable = scan.unreadable, "incomplete scan, not removing any jobs");
        return report;
    }
    let present: HashSet<PathBuf> = scan.files.iter().cloned().collect();
    report.removed = store.purge_missing(&present).len();
    report
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
