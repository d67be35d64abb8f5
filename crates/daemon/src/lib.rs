// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! foldercron daemon library
//!
//! Everything `fcd` does lives here so the workspace specs can drive the
//! scheduler against a real job tree without going through the binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod plan;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub use adapters::{FakeRunner, RunCall};
pub use adapters::{ProcessOutput, ProcessRunner, RunnerError, ShellRunner};
pub use cli::{Cli, Command};
pub use config::{Config, ConfigError, ConfigFile, Overrides};
pub use discovery::{Discovery, DiscoveryError, DiscoveryReport, Scan};
pub use engine::{Coordinator, Executor, SharedStore, TickReport};
pub use lifecycle::{startup, startup_with_clock, Daemon, LifecycleError};
pub use status::{JobStatus, STATUS_TARGET};
