use std::path::PathBuf;

use thiserror::Error;

use super::table::Class;

/// Errors raised while assembling, caching or partitioning feature tables.
///
/// Every variant is fatal for the current run. The only recoverable data
/// condition (non-finite feature values) is repaired and logged instead of
/// reported here.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Fixed frames need the window count to be a multiple of the frame length.
    #[error("{windows} windows cannot be split into fixed frames of length {frame_length}")]
    ShapeMismatch { windows: usize, frame_length: usize },
    /// Training ratio outside `(0, 1)` or too small to yield two folds.
    #[error("invalid training ratio {0} (expected 0.5 <= ratio < 1.0)")]
    InvalidRatio(f64),
    /// Resampling method name that no collaborator understands.
    #[error("unknown resample method {0:?} (expected \"resample\" or \"decimate\")")]
    UnknownResampleMethod(String),
    /// Malformed configuration or call arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A class has fewer segments than requested folds.
    #[error("class {class:?} has {segments} segments, fewer than the {folds} requested folds")]
    InsufficientSegments {
        class: Class,
        segments: usize,
        folds: usize,
    },
    /// A class has fewer rows than requested folds in a row-level split.
    #[error("class {class:?} has {rows} rows, fewer than the {folds} requested folds")]
    InsufficientRows {
        class: Class,
        rows: usize,
        folds: usize,
    },
    /// An operation needed class labels on a table that has none.
    #[error("feature table has no class labels")]
    MissingLabels,
    /// Tables that should share a column layout (or row count) do not.
    #[error("column layout mismatch: {0}")]
    ColumnMismatch(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read feature file {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A cache file exists but cannot be decoded.
    #[error("corrupt feature cache {path}: {reason}")]
    CacheFormat { path: PathBuf, reason: String },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
