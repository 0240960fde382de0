//! Segment-aware dataset assembly and cross-validation for EEG seizure prediction.
//!
//! Feature tables are built per recording segment, merged across the
//! interictal and preictal classes and split so that no segment ever lands
//! on both sides of a train/test boundary.

/// Per-user configuration and log directories.
pub mod app_dirs;
/// TOML pipeline configuration.
pub mod config;
/// Feature tables, loaders, merging, folds and splits.
pub mod dataset;
/// Tracing subscriber setup with per-run log files.
pub mod logging;
