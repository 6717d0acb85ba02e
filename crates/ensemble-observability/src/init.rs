// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Console output is always on. With the `file-logging` feature and a log
//! directory, every run also writes to a timestamped folder:
//! ```text
//! <log_dir>/
//!   └── run_20250101_120000/
//!       └── ensemble.log.2025-01-01
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Number of run folders kept by default
pub const DEFAULT_RETENTION_RUNS: usize = 10;

/// Keeps file writers alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder receiving this run's log files, if file logging is active
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

fn env_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter).with_context(|| format!("Invalid log filter: {}", filter))
}

/// Initialize console logging, plus file logging when `log_dir` is set
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags
/// * `base_level` - Default level for everything not raised by a flag
/// * `log_dir` - Base directory for run folders
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    base_level: &str,
    log_dir: Option<PathBuf>,
) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(base_level);
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    // Console layer (human-readable)
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(env_filter(&filter)?)
            .boxed(),
    );

    #[cfg(feature = "file-logging")]
    let (run_dir, file_guards) = match log_dir {
        Some(base_log_dir) => {
            let run_dir = create_run_dir(&base_log_dir, Utc::now())?;
            cleanup_old_runs(&base_log_dir, DEFAULT_RETENTION_RUNS)?;

            let appender = tracing_appender::rolling::daily(&run_dir, "ensemble.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(env_filter(&filter)?)
                    .boxed(),
            );
            (Some(run_dir), vec![guard])
        }
        None => (None, Vec::new()),
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    #[cfg(not(feature = "file-logging"))]
    let run_dir = {
        if let Some(dir) = log_dir {
            tracing::warn!(
                "Log directory {} ignored: built without the file-logging feature",
                dir.display()
            );
        }
        None
    };

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        run_dir,
    })
}

/// Folder name for a run started at `started`
pub fn run_dir_name(started: DateTime<Utc>) -> String {
    format!("{}{}", RUN_PREFIX, started.format(RUN_TIMESTAMP_FORMAT))
}

/// Create the timestamped run folder under `base_log_dir`
pub fn create_run_dir(base_log_dir: &Path, started: DateTime<Utc>) -> Result<PathBuf> {
    let run_dir = base_log_dir.join(run_dir_name(started));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;
    Ok(run_dir)
}

/// Remove the oldest run folders so that at most `retention_runs` remain
///
/// Entries that are not run folders are left alone. Returns the number of
/// folders removed.
pub fn cleanup_old_runs(base_log_dir: &Path, retention_runs: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    if runs.len() <= retention_runs {
        return Ok(0);
    }

    // Oldest first
    runs.sort_by_key(|(_, started)| *started);
    let to_remove = runs.len() - retention_runs;
    let mut removed = 0;
    for (path, _) in runs.iter().take(to_remove) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}
