// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running job scripts as child processes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;

/// Exit code recorded when a script could not be started at all
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start {}: {source}", .script.display())]
    Spawn {
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a finished script left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Outcome recorded for a script that never started.
    pub fn spawn_failure(error: &RunnerError) -> Self {
        Self {
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: error.to_string(),
        }
    }
}

/// Adapter for running job scripts
#[async_trait]
pub trait ProcessRunner: Clone + Send + Sync + 'static {
    /// Run `script` with `cwd` as its working directory and wait for it.
    async fn run(&self, script: &Path, cwd: &Path) -> Result<ProcessOutput, RunnerError>;
}

/// Runs scripts through `sh -c`.
///
/// No timeout is applied: a script that never exits keeps its job locked.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellRunner;

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(&self, script: &Path, cwd: &Path) -> Result<ProcessOutput, RunnerError> {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg(shell_quote(script))
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|source| RunnerError::Spawn { script: script.to_path_buf(), source })?;

        Ok(ProcessOutput {
            // Killed by a signal
            exit_code: output.status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Single-quote `path` for `sh -c`.
pub(crate) fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', r"'\''"))
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ProcessOutput, ProcessRunner, RunnerError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    /// Recorded script execution
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RunCall {
        pub script: PathBuf,
        pub cwd: PathBuf,
    }

    #[derive(Default)]
    struct FakeRunnerState {
        calls: Vec<RunCall>,
        outcomes: HashMap<PathBuf, ProcessOutput>,
        spawn_failures: Vec<PathBuf>,
        gates: HashMap<PathBuf, Arc<Semaphore>>,
        running: usize,
        max_running: usize,
    }

    /// Fake runner for testing.
    ///
    /// Scripts succeed with empty output unless told otherwise. A held
    /// script blocks until [`FakeRunner::release`] is called for it.
    #[derive(Clone, Default)]
    pub struct FakeRunner {
        inner: Arc<Mutex<FakeRunnerState>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make `script` exit with `exit_code`.
        pub fn set_exit(&self, script: impl Into<PathBuf>, exit_code: i32) {
            self.set_output(
                script,
                ProcessOutput { exit_code, stdout: String::new(), stderr: String::new() },
            );
        }

        pub fn set_output(&self, script: impl Into<PathBuf>, output: ProcessOutput) {
            self.inner.lock().outcomes.insert(script.into(), output);
        }

        /// Make `script` fail to start.
        pub fn fail_spawn(&self, script: impl Into<PathBuf>) {
            self.inner.lock().spawn_failures.push(script.into());
        }

        /// Block executions of `script` until released.
        pub fn hold(&self, script: impl Into<PathBuf>) {
            self.inner.lock().gates.insert(script.into(), Arc::new(Semaphore::new(0)));
        }

        /// Let one held execution of `script` finish.
        pub fn release(&self, script: &Path) {
            if let Some(gate) = self.inner.lock().gates.get(script) {
                gate.add_permits(1);
            }
        }

        /// Get all recorded executions
        pub fn calls(&self) -> Vec<RunCall> {
            self.inner.lock().calls.clone()
        }

        /// Executions currently inside `run`
        pub fn running(&self) -> usize {
            self.inner.lock().running
        }

        /// Highest number of simultaneous executions seen
        pub fn max_running(&self) -> usize {
            self.inner.lock().max_running
        }
    }

    #[async_trait]
    impl ProcessRunner for FakeRunner {
        async fn run(&self, script: &Path, cwd: &Path) -> Result<ProcessOutput, RunnerError> {
            let gate = {
                let mut state = self.inner.lock();
                state.calls.push(RunCall { script: script.to_path_buf(), cwd: cwd.to_path_buf() });
                if state.spawn_failures.iter().any(|p| p == script) {
                    return Err(RunnerError::Spawn {
                        script: script.to_path_buf(),
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake"),
                    });
                }
                state.running += 1;
                state.max_running = state.max_running.max(state.running);
                state.gates.get(script).cloned()
            };

            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            let mut state = self.inner.lock();
            state.running -= 1;
            Ok(state.outcomes.get(script).cloned().unwrap_or_default())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRunner, RunCall};

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
