// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the specs.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

pub use chrono::TimeDelta;
pub use fc_core::test_support::at;
pub use fc_core::{FakeClock, RunReason};
pub use fc_daemon::{
    startup_with_clock, Config, ConfigFile, Coordinator, Daemon, Discovery, DiscoveryReport,
    FakeRunner, JobStatus, Overrides, ProcessRunner, ShellRunner,
};
pub use fc_storage::LoadOutcome;
use tempfile::TempDir;

/// A job folder, log folder and snapshot inside one temp directory.
pub struct JobTree {
    dir: TempDir,
    pub clock: FakeClock,
}

impl JobTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("jobs")).unwrap();
        Self { dir, clock: FakeClock::at(at(2024, 3, 1, 10, 0)) }
    }

    pub fn config(&self) -> Config {
        self.config_with(false)
    }

    pub fn config_with(&self, reset: bool) -> Config {
        let overrides = Overrides {
            jobs_dir: Some(self.dir.path().join("jobs")),
            logs_dir: Some(self.dir.path().join("logs")),
            snapshot: Some(self.dir.path().join("state/snapshot.json")),
            reset,
            ..Overrides::default()
        };
        Config::resolve(ConfigFile::default(), &overrides).unwrap()
    }

    /// Absolute path of a script below the job root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.config().jobs_dir.join(relative)
    }

    /// Write an executable shell script below the job root.
    pub fn script(&self, relative: &str, body: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path(relative)).unwrap();
    }

    pub fn start(&self) -> Daemon<FakeClock> {
        startup_with_clock(&self.config(), self.clock.clone()).unwrap()
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(TimeDelta::minutes(minutes));
    }

    /// Names of every registered job, sorted.
    pub fn job_names(daemon: &Daemon<FakeClock>) -> Vec<String> {
        let store = daemon.store.lock();
        let mut names: Vec<String> =
            store.table().iter().map(|job| job.name().to_string()).collect();
        names.sort();
        names
    }
}
