// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Folder-name schedule convention.
//!
//! A script's position below the job root encodes when it runs:
//!
//! ```text
//! jobs/
//!   1min/run_every_min.sh
//!   1hour/at0050/ten_to_the_hour.sh
//!   1hour/on_the_hour.sh
//!   2week/at1733/fortnightly.sh
//! ```
//!
//! The first folder is `<N><unit>` with unit one of `min`, `hour`, `day`,
//! `week`. The optional second folder is `atHHMM`. Folders below the second
//! are not inspected.

use crate::interval::{AtTime, Granularity, Interval};
use std::num::NonZeroU32;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Why a path was rejected as a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    NoInterval,
    BadEvery,
    BadAt,
    OutsideRoot,
}

crate::simple_display! {
    InvalidReason {
        NoInterval => "no interval specified",
        BadEvery => "cannot parse every-parameter",
        BadAt => "cannot parse at-parameter",
        OutsideRoot => "script is not below the job root",
    }
}

/// A path under the job root that does not follow the folder convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job {}: {reason}{}", .path.display(), segment_suffix(.segment))]
pub struct InvalidJob {
    pub path: PathBuf,
    pub reason: InvalidReason,
    /// The offending folder name, when one is to blame
    pub segment: Option<String>,
}

impl InvalidJob {
    fn new(path: &Path, reason: InvalidReason, segment: Option<&str>) -> Self {
        Self { path: path.to_path_buf(), reason, segment: segment.map(str::to_owned) }
    }
}

fn segment_suffix(segment: &Option<String>) -> String {
    segment.as_deref().map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Path of `script` relative to `root`.
pub fn relative_name(root: &Path, script: &Path) -> Result<PathBuf, InvalidJob> {
    script
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| InvalidJob::new(script, InvalidReason::OutsideRoot, None))
}

/// Parse the interval encoded by the folders between `root` and `script`.
pub fn parse_script_path(root: &Path, script: &Path) -> Result<Interval, InvalidJob> {
    let relative = relative_name(root, script)?;
    let folders: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let Some(every_folder) = folders.first() else {
        return Err(InvalidJob::new(script, InvalidReason::NoInterval, None));
    };

    let (every, granularity) = parse_every(every_folder).ok_or_else(|| {
        InvalidJob::new(script, InvalidReason::BadEvery, Some(every_folder))
    })?;
    let interval = Interval::new(granularity, every);

    match folders.get(1) {
        Some(at_folder) => {
            let at = parse_at(at_folder).ok_or_else(|| {
                InvalidJob::new(script, InvalidReason::BadAt, Some(at_folder))
            })?;
            Ok(interval.at(at))
        }
        None => Ok(interval),
    }
}

/// `<digits><unit>`, e.g. `15min`. Zero and out-of-range counts are rejected.
fn parse_every(folder: &str) -> Option<(NonZeroU32, Granularity)> {
    let split = folder.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = folder.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let granularity = Granularity::from_unit(unit)?;
    let every = digits.parse::<u32>().ok().and_then(NonZeroU32::new)?;
    Some((every, granularity))
}

/// `atHHMM`, e.g. `at1345`.
fn parse_at(folder: &str) -> Option<AtTime> {
    let digits = folder.strip_prefix("at")?;
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour = digits[..2].parse().ok()?;
    let minute = digits[2..].parse().ok()?;
    AtTime::new(hour, minute)
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
