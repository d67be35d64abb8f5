// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters for external I/O

pub mod subprocess;

pub use subprocess::{ProcessOutput, ProcessRunner, RunnerError, ShellRunner};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use subprocess::{FakeRunner, RunCall};
