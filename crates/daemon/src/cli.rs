// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line definitions for `fcd`.

use crate::config::Overrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Folder-convention job scheduler.
#[derive(Debug, Parser)]
#[command(name = "fcd")]
#[command(about = "Run scripts on the schedule encoded by their folder names")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to $FC_CONFIG or <state_dir>/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Job root folder
    #[arg(long, global = true)]
    pub jobs_dir: Option<PathBuf>,

    /// Folder for job_status.log
    #[arg(long, global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Snapshot file
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Seconds between scheduler ticks
    #[arg(long, global = true)]
    pub sleep: Option<f64>,

    /// Delete the snapshot and start with an empty store
    #[arg(long)]
    pub reset: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Run the scheduler in the foreground (default)
    Run,

    /// Show the upcoming runs of a script
    Plan {
        /// Script path, absolute or relative to the job root
        script: PathBuf,

        /// Number of runs to show
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            jobs_dir: self.jobs_dir.clone(),
            logs_dir: self.logs_dir.clone(),
            snapshot: self.snapshot.clone(),
            sleep: self.sleep,
            reset: self.reset,
        }
    }

    pub fn action(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
