// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup for `fcd`.
//!
//! Console output follows `FC_LOG` (or the configured level). Status records
//! additionally go to a daily-rotated `job_status.log` in the logs folder,
//! whatever the console level is.

use crate::status::STATUS_TARGET;
use std::path::Path;
use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{EnvFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// Rotated status logs kept on disk
pub const MAX_STATUS_LOG_FILES: usize = 30;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {directives:?}: {source}")]
    Filter {
        directives: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to create logs folder: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open status log: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Console filter: `FC_LOG` wins over the configured level.
pub fn console_filter(configured: &str) -> Result<EnvFilter, LoggingError> {
    let directives = crate::env::log_filter().unwrap_or_else(|| configured.to_string());
    EnvFilter::try_new(&directives).map_err(|source| LoggingError::Filter { directives, source })
}

/// File filter: status records only.
pub fn status_filter() -> Targets {
    Targets::new().with_target(STATUS_TARGET, Level::INFO)
}

/// Install the global subscriber.
///
/// The returned guard flushes the status log on drop and must be held for
/// the life of the process.
pub fn init(level: &str, logs_dir: &Path) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("job_status")
        .filename_suffix("log")
        .max_log_files(MAX_STATUS_LOG_FILES)
        .build(logs_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_filter(console_filter(level)?))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_filter(status_filter()))
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
