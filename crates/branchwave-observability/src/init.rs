// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization for branchwave
//!
//! Console output always; with the `file-logging` feature and a log
//! directory, JSON files in a timestamped run folder with run-count retention.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Prefix of per-run log folders
pub const RUN_FOLDER_PREFIX: &str = "run_";

/// Timestamp format of per-run log folders (`run_20250101_120000`)
pub const RUN_FOLDER_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Default number of run folders kept in the log directory
pub const DEFAULT_RETENTION_RUNS: usize = 10;

/// Logging initialization result
///
/// Keep it alive for the lifetime of the program; dropping it flushes and
/// closes the log files.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder of this run's log files, if file logging is active
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize logging with console output and optional file output
///
/// With `log_dir` set (and the `file-logging` feature), creates:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       ├── branchwave-geometry.log
///       ├── branchwave-experiment.log
///       ├── ...
///       └── branchwave.log (combined)
/// ```
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags layered over `level`
/// * `level` - Default level (trace, debug, info, warn, error)
/// * `log_dir` - Base directory for run folders; `None` logs to the console only
/// * `retention_runs` - Keep N most recent run folders (default: 10)
///
/// # Errors
///
/// Fails if the filter cannot be parsed, the run folder cannot be created,
/// or a global subscriber is already installed.
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    level: &str,
    log_dir: Option<PathBuf>,
    retention_runs: Option<usize>,
) -> Result<LoggingGuard> {
    let filter = debug_flags.filter_string(level);
    let console_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    // Console layer (human-readable), on stderr so stdout stays free for data
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);
    layers.push(console_layer.boxed());

    #[cfg(feature = "file-logging")]
    let (file_guards, run_dir) = match log_dir {
        Some(base) => {
            let run_folder = create_run_folder(&base)?;
            cleanup_old_logs(&base, retention_runs)?;
            let guards = push_file_layers(&mut layers, &run_folder, &filter)?;
            (guards, Some(run_folder))
        }
        None => (Vec::new(), None),
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    #[cfg(not(feature = "file-logging"))]
    let run_dir: Option<PathBuf> = {
        let _ = retention_runs;
        if let Some(base) = log_dir {
            tracing::warn!(
                "[LOGGING] file logging to {} requested but not compiled in (enable the file-logging feature)",
                base.display()
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

/// Initialize console-only logging at `info` with the given debug flags
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, "info", None, None)
}

#[cfg(feature = "file-logging")]
fn create_run_folder(base_log_dir: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format(RUN_FOLDER_FORMAT);
    let run_folder = base_log_dir.join(format!("{}{}", RUN_FOLDER_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    Ok(run_folder)
}

/// One JSON file per known crate plus a combined file
#[cfg(feature = "file-logging")]
fn push_file_layers(
    layers: &mut Vec<BoxedLayer>,
    run_folder: &Path,
    filter: &str,
) -> Result<Vec<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_appender::rolling;

    let mut file_guards = Vec::new();

    for crate_name in crate::KNOWN_CRATES {
        let file_appender = rolling::never(run_folder, format!("{}.log", crate_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guards.push(guard);

        // Only this crate's events
        let crate_filter = format!("{}=debug", crate::crate_target(crate_name));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(EnvFilter::try_new(&crate_filter)?)
            .boxed();
        layers.push(file_layer);
    }

    let combined_appender = rolling::never(run_folder, "branchwave.log");
    let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
    file_guards.push(combined_guard);

    let combined_layer = tracing_subscriber::fmt::layer()
        .with_writer(combined_non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(EnvFilter::try_new(filter)?)
        .boxed();
    layers.push(combined_layer);

    Ok(file_guards)
}

/// Timestamp encoded in a run folder name, if it is one
pub fn parse_run_folder(name: &str) -> Option<NaiveDateTime> {
    let timestamp = name.strip_prefix(RUN_FOLDER_PREFIX)?;
    NaiveDateTime::parse_from_str(timestamp, RUN_FOLDER_FORMAT).ok()
}

/// Remove all but the `retention_runs` most recent run folders
///
/// Entries that are not run folders are left alone. Returns how many folders
/// were removed; a folder that cannot be removed is reported and skipped.
pub fn cleanup_old_logs(base_log_dir: &Path, retention_runs: Option<usize>) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let retention_runs = retention_runs.unwrap_or(DEFAULT_RETENTION_RUNS);

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    let entries = std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to list log directory: {}", base_log_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_run_folder);
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    if runs.len() <= retention_runs {
        return Ok(0);
    }

    // Oldest first
    runs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let to_remove = runs.len() - retention_runs;
    let mut removed_count = 0;
    for (path, _) in runs.iter().take(to_remove) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed_count += 1,
            // The subscriber may not exist yet
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }

    Ok(removed_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_run_folder() {
        let parsed = parse_run_folder("run_20250101_120000").unwrap();
        assert_eq!(parsed.to_string(), "2025-01-01 12:00:00");
        assert!(parse_run_folder("run_latest").is_none());
        assert!(parse_run_folder("20250101_120000").is_none());
    }

    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempdir().unwrap();
        let names = [
            "run_20250103_000000",
            "run_20250101_000000",
            "run_20250105_000000",
            "run_20250102_000000",
            "run_20250104_000000",
        ];
        for name in names {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::create_dir(dir.path().join("keep_me")).unwrap();
        std::fs::write(dir.path().join("run_20200101_000000"), "a file, not a run").unwrap();

        let removed = cleanup_old_logs(dir.path(), Some(2)).unwrap();
        assert_eq!(removed, 3);

        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(
            left,
            vec![
                "keep_me",
                "run_20200101_000000",
                "run_20250104_000000",
                "run_20250105_000000",
            ]
        );
    }

    #[test]
    fn test_cleanup_missing_dir_is_noop() {
        let dir = tempdir().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("absent"), None).unwrap(), 0);
    }
}
