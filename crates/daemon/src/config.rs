// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Values come from built-in defaults, then a TOML file, then command-line
//! overrides. [`Config::resolve`] validates the merged result once at
//! startup; everything downstream takes the validated [`Config`].

use chrono::TimeDelta;
use fc_core::{Granularity, Interval};
use serde::{Deserialize, Serialize};
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Tick bounds in seconds, both exclusive
pub const MIN_SLEEP_SECS: f64 = 0.5;
pub const MAX_SLEEP_SECS: f64 = 1800.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine state directory (set FC_STATE_DIR or HOME)")]
    NoStateDir,

    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid sleep duration {0}; must be between {MIN_SLEEP_SECS} and {MAX_SLEEP_SECS}")]
    SleepOutOfBounds(f64),

    #[error("{} is not a directory!", .0.display())]
    NotADirectory(PathBuf),

    #[error("job folder {} is not valid UTF-8", .0.display())]
    NonUtf8JobsDir(PathBuf),

    #[error("check_for_new_jobs_every must be at least one minute")]
    ZeroCheckInterval,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// `[timings]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timings {
    /// Seconds between ticks
    pub sleep_duration: f64,
    /// Minutes between job folder scans
    pub check_for_new_jobs_every: u32,
    /// Minutes to wait before retrying a failed job
    pub job_fail_timeout_minutes: u32,
    /// Simultaneous executions; 0 is unlimited
    pub max_concurrent_runs: usize,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            sleep_duration: 1.0,
            check_for_new_jobs_every: 5,
            job_fail_timeout_minutes: 2,
            max_concurrent_runs: 0,
        }
    }
}

/// `[folders]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Folders {
    pub jobs_folder: PathBuf,
    pub logs_folder: PathBuf,
    /// Defaults to `<state_dir>/snapshot.json`
    pub snapshot_file: Option<PathBuf>,
}

impl Default for Folders {
    fn default() -> Self {
        Self {
            jobs_folder: PathBuf::from("./jobs"),
            logs_folder: PathBuf::from("./logs"),
            snapshot_file: None,
        }
    }
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Configuration file as written on disk. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub timings: Timings,
    pub folders: Folders,
    pub logging: Logging,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Locate and load the config file.
    ///
    /// An explicit path (flag or `FC_CONFIG`) must exist. Otherwise
    /// `<state_dir>/config.toml` is used when present, and defaults when not.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit.map(Path::to_path_buf).or_else(crate::env::config_path) {
            return Self::load(&path);
        }
        let default_path = crate::env::state_dir()?.join("config.toml");
        if default_path.is_file() {
            return Self::load(&default_path);
        }
        Ok(Self::default())
    }
}

/// Command-line overrides, applied on top of the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub jobs_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub sleep: Option<f64>,
    pub reset: bool,
}

/// Validated daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical job root
    pub jobs_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub snapshot_path: PathBuf,
    /// Lock file guarding the snapshot against a second daemon
    pub lock_path: PathBuf,
    /// Sleep between ticks
    pub tick: Duration,
    pub sleep_secs: f64,
    /// How often the job root is rescanned
    pub discovery_every: Interval,
    pub retry_timeout: TimeDelta,
    pub max_concurrent_runs: Option<NonZeroUsize>,
    pub log_level: String,
    /// Discard the snapshot at startup
    pub reset: bool,
}

impl Config {
    /// Merge `overrides` into `file` and validate.
    pub fn resolve(file: ConfigFile, overrides: &Overrides) -> Result<Self, ConfigError> {
        let ConfigFile { timings, folders, logging } = file;

        let sleep_secs = overrides.sleep.unwrap_or(timings.sleep_duration);
        // Written this way so NaN is rejected too
        if !(MIN_SLEEP_SECS < sleep_secs && sleep_secs < MAX_SLEEP_SECS) {
            return Err(ConfigError::SleepOutOfBounds(sleep_secs));
        }

        let jobs_dir = absolute(overrides.jobs_dir.as_ref().unwrap_or(&folders.jobs_folder))?;
        if !jobs_dir.is_dir() {
            return Err(ConfigError::NotADirectory(jobs_dir));
        }
        let jobs_dir = std::fs::canonicalize(&jobs_dir)?;
        // Discovery walks the folder with a glob pattern built from this path
        if jobs_dir.to_str().is_none() {
            return Err(ConfigError::NonUtf8JobsDir(jobs_dir));
        }

        let logs_dir = absolute(overrides.logs_dir.as_ref().unwrap_or(&folders.logs_folder))?;
        let snapshot_path = match overrides.snapshot.as_ref().or(folders.snapshot_file.as_ref()) {
            Some(path) => absolute(path)?,
            None => crate::env::state_dir()?.join("snapshot.json"),
        };
        let lock_path = snapshot_path.with_extension("lock");

        let check_every = NonZeroU32::new(timings.check_for_new_jobs_every)
            .ok_or(ConfigError::ZeroCheckInterval)?;

        Ok(Self {
            jobs_dir,
            logs_dir,
            lock_path,
            snapshot_path,
            tick: Duration::from_secs_f64(sleep_secs),
            sleep_secs,
            discovery_every: Interval::new(Granularity::Minute, check_every),
            retry_timeout: TimeDelta::minutes(i64::from(timings.job_fail_timeout_minutes)),
            max_concurrent_runs: NonZeroUsize::new(timings.max_concurrent_runs),
            log_level: logging.level,
            reset: overrides.reset,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
