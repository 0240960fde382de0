//! Logging setup for the command-line tools.
//!
//! One global subscriber writes to stderr and to a timestamped log file per
//! run. Only the newest [`MAX_RUN_LOGS`] run logs are kept.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Run logs kept in the log directory after pruning.
pub const MAX_RUN_LOGS: usize = 20;
const RUN_LOG_PREFIX: &str = "segfold_";
const RUN_LOG_EXTENSION: &str = "log";
const RUN_LOG_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");

static LOG_GUARD: OnceLock<(PathBuf, WorkerGuard)> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No log directory available: {0}")]
    LogDir(#[from] AppDirError),
    #[error("Failed to format run log name: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("Failed to open run log {path}: {source}")]
    OpenLog {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to prune run logs in {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Log into `.segfold/logs`. Returns the run log path.
///
/// Later calls return the path of the first run log without reinstalling.
pub fn init() -> Result<PathBuf, LoggingError> {
    if let Some((path, _)) = LOG_GUARD.get() {
        return Ok(path.clone());
    }
    init_in_dir(&app_dirs::logs_dir()?)
}

/// Log into `log_dir`, which must exist. Returns the run log path.
pub fn init_in_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    if let Some((path, _)) = LOG_GUARD.get() {
        return Ok(path.clone());
    }
    let path = log_dir.join(run_log_name(OffsetDateTime::now_utc())?);
    let file = open_run_log(&path)?;
    prune_run_logs(log_dir, MAX_RUN_LOGS)?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer));
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set((path.clone(), guard));

    tracing::info!("Run log at {}", path.display());
    Ok(path)
}

fn run_log_name(started: OffsetDateTime) -> Result<String, LoggingError> {
    Ok(format!(
        "{RUN_LOG_PREFIX}{}.{RUN_LOG_EXTENSION}",
        started.format(RUN_LOG_TIME)?
    ))
}

fn open_run_log(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenLog {
            path: path.to_path_buf(),
            source,
        })
}

fn is_run_log(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(RUN_LOG_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(RUN_LOG_PREFIX))
}

/// Delete the oldest run logs so at most `keep` remain.
///
/// Run log names embed their start time, so name order is age order.
fn prune_run_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let prune_err = |source| LoggingError::Prune {
        path: dir.to_path_buf(),
        source,
    };
    let mut logs = Vec::new();
    for entry in fs::read_dir(dir).map_err(prune_err)? {
        let path = entry.map_err(prune_err)?.path();
        if path.is_file() && is_run_log(&path) {
            logs.push(path);
        }
    }
    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    for path in logs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(prune_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn run_log_name_embeds_start_time() {
        let started = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(run_log_name(started).unwrap(), "segfold_2023-11-14_22-13-20.log");
    }

    #[test]
    fn prune_drops_oldest_run_logs_only() {
        let dir = tempdir().unwrap();
        for second in 0..5 {
            let started = OffsetDateTime::from_unix_timestamp(1_700_000_000 + second).unwrap();
            open_run_log(&dir.path().join(run_log_name(started).unwrap())).unwrap();
        }
        fs::write(dir.path().join("notes.log"), b"x").unwrap();
        fs::write(dir.path().join("cache_interictal.bin"), b"x").unwrap();

        prune_run_logs(dir.path(), 3).unwrap();

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(
            left,
            vec![
                "cache_interictal.bin",
                "notes.log",
                "segfold_2023-11-14_22-13-22.log",
                "segfold_2023-11-14_22-13-23.log",
                "segfold_2023-11-14_22-13-24.log",
            ]
        );
    }
}
