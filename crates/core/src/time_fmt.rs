// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time formatting helpers

use chrono::{NaiveDateTime, TimeDelta, Timelike};

/// Drop seconds and sub-second precision. Minutes are the scheduling grain.
pub fn truncate_to_minute(time: NaiveDateTime) -> NaiveDateTime {
    time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time)
}

/// Format an execution window as `"H hours, M minutes, S seconds"`.
///
/// Negative spans (clock stepped backwards mid-run) are shown as zero.
pub fn format_runtime(runtime: TimeDelta) -> String {
    let secs = runtime.num_seconds().max(0);
    format!("{} hours, {} minutes, {} seconds", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
