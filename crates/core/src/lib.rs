// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fc-core: schedule model and job state machine for foldercron

pub mod macros;

pub mod clock;
pub mod id;
pub mod interval;
pub mod job;
pub mod schedule;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{short, RunId};
pub use interval::{Anchor, AtTime, Granularity, Interval};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Job, JobError, RunReason};
pub use schedule::{parse_script_path, relative_name, InvalidJob, InvalidReason};
pub use time_fmt::{format_runtime, truncate_to_minute};
