//! TOML configuration for a pipeline run.
//!
//! Every field has a default so a partial file (or none at all) is valid.
//! Values are checked by [`PipelineConfig::validate`]; malformed values are
//! reported, never replaced by defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::app_dirs::{self, AppDirError};
use crate::dataset::{
    CsvWindowLoader, DatasetError, FrameLayout, LoaderOptions, MergeOptions, SplitOptions,
    folds_for_training_ratio,
};

/// Errors raised while reading or writing configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    #[error("Invalid config value: {0}")]
    Invalid(#[from] DatasetError),
}

/// Complete configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub loader: LoaderConfig,
    pub merge: MergeConfig,
    pub split: SplitConfig,
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_feature_folder")]
    pub feature_folder: PathBuf,
    /// Cache directory. Defaults to the feature folder.
    #[serde(default)]
    pub output_folder: Option<PathBuf>,
    #[serde(default = "default_frame_length")]
    pub frame_length: usize,
    #[serde(default)]
    pub sliding_frames: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub rebuild: bool,
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_true")]
    pub downsample: bool,
    #[serde(default = "default_downsample_ratio")]
    pub downsample_ratio: f64,
    #[serde(default = "default_true")]
    pub segment_level: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_training_ratio")]
    pub training_ratio: f64,
    #[serde(default = "default_true")]
    pub segment_level: bool,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Settings handed to the waveform preprocessing collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default)]
    pub resample_method: Option<String>,
}

/// Waveform downsampling methods understood by the preprocessing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleMethod {
    Resample,
    Decimate,
}

impl FromStr for ResampleMethod {
    type Err = DatasetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "resample" => Ok(Self::Resample),
            "decimate" => Ok(Self::Decimate),
            other => Err(DatasetError::UnknownResampleMethod(other.to_string())),
        }
    }
}

impl fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resample => "resample",
            Self::Decimate => "decimate",
        })
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            feature_folder: default_feature_folder(),
            output_folder: None,
            frame_length: default_frame_length(),
            sliding_frames: false,
            workers: default_workers(),
            rebuild: false,
            file_suffix: default_file_suffix(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            downsample: true,
            downsample_ratio: default_downsample_ratio(),
            segment_level: true,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            training_ratio: default_training_ratio(),
            segment_level: true,
            shuffle: false,
            seed: default_seed(),
        }
    }
}

fn default_feature_folder() -> PathBuf {
    PathBuf::from("features")
}

fn default_frame_length() -> usize {
    12
}

fn default_workers() -> usize {
    1
}

fn default_file_suffix() -> String {
    ".csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

fn default_downsample_ratio() -> f64 {
    2.0
}

fn default_training_ratio() -> f64 {
    0.8
}

fn default_seed() -> u64 {
    42
}

impl PipelineConfig {
    /// Read and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the per-user `segfold.toml`, falling back to defaults when it does not exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = app_dirs::default_config_path()?;
        if path.is_file() {
            info!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every value that the pipeline would otherwise reject mid-run.
    pub fn validate(&self) -> Result<(), DatasetError> {
        folds_for_training_ratio(self.split.training_ratio)?;
        self.frame_layout().validate()?;
        if self.loader.workers == 0 {
            return Err(DatasetError::InvalidArgument(
                "loader.workers must be at least 1".to_string(),
            ));
        }
        if !(self.merge.downsample_ratio.is_finite() && self.merge.downsample_ratio > 0.0) {
            return Err(DatasetError::InvalidArgument(format!(
                "merge.downsample_ratio must be positive, got {}",
                self.merge.downsample_ratio
            )));
        }
        self.csv_loader()?;
        self.resample_method()?;
        Ok(())
    }

    pub fn frame_layout(&self) -> FrameLayout {
        if self.loader.sliding_frames {
            FrameLayout::sliding(self.loader.frame_length)
        } else {
            FrameLayout::fixed(self.loader.frame_length)
        }
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            layout: self.frame_layout(),
            workers: self.loader.workers,
            rebuild: self.loader.rebuild,
            cache_dir: self.loader.output_folder.clone(),
            file_suffix: self.loader.file_suffix.clone(),
        }
    }

    pub fn csv_loader(&self) -> Result<CsvWindowLoader, DatasetError> {
        CsvWindowLoader::new(self.loader.delimiter)
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            downsample: self.merge.downsample,
            downsample_ratio: self.merge.downsample_ratio,
            segment_level: self.merge.segment_level,
            seed: self.split.seed,
        }
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            segment_level: self.split.segment_level,
            shuffle: self.split.shuffle,
            seed: self.split.seed,
        }
    }

    /// Parsed `[signal] resample_method`, if one is set.
    pub fn resample_method(&self) -> Result<Option<ResampleMethod>, DatasetError> {
        self.signal
            .resample_method
            .as_deref()
            .map(str::parse)
            .transpose()
    }
}
