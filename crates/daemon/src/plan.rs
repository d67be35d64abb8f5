// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule preview for a single script path.

use chrono::NaiveDateTime;
use fc_core::{parse_script_path, relative_name, Clock, Interval, InvalidJob};
use std::fmt;
use std::path::{Path, PathBuf};

/// The next few runs of a script, as if it had just been discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub name: PathBuf,
    pub interval: Interval,
    pub runs: Vec<NaiveDateTime>,
}

/// Preview `count` runs of `script`. Relative paths are taken from `root`.
pub fn plan<C: Clock>(
    root: &Path,
    script: &Path,
    count: usize,
    clock: &C,
) -> Result<Plan, InvalidJob> {
    let script = if script.is_absolute() { script.to_path_buf() } else { root.join(script) };
    let interval = parse_script_path(root, &script)?;
    let name = relative_name(root, &script)?;
    let runs = interval.planned_schedule(count, clock).collect();
    Ok(Plan { name, interval, runs })
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.name.display(), self.interval)?;
        for run in &self.runs {
            writeln!(f, "  {}", run.format("%Y-%m-%d %H:%M"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
