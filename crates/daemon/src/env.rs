// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Resolve state directory: FC_STATE_DIR > XDG_STATE_HOME/foldercron > ~/.local/state/foldercron
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = non_empty("FC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("foldercron"));
    }
    let home = non_empty("HOME").ok_or(ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/foldercron"))
}

/// Config file named by `FC_CONFIG`
pub fn config_path() -> Option<PathBuf> {
    non_empty("FC_CONFIG").map(PathBuf::from)
}

/// Log filter directives from `FC_LOG`, e.g. `debug` or `fc_daemon=trace`
pub fn log_filter() -> Option<String> {
    non_empty("FC_LOG")
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
