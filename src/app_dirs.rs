//! Per-user directories for segfold configuration and run logs.
//!
//! Everything lives under a single `.segfold` folder in the OS config
//! directory. `SEGFOLD_CONFIG_HOME` replaces the OS config directory.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory created under the config root.
pub const APP_DIR_NAME: &str = ".segfold";
/// File name of the default pipeline configuration.
pub const CONFIG_FILE_NAME: &str = "segfold.toml";
/// Environment variable overriding the config root.
pub const CONFIG_HOME_ENV: &str = "SEGFOLD_CONFIG_HOME";

const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory found; set {CONFIG_HOME_ENV} to choose one")]
    NoBaseDir,
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolved `.segfold` directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Layout under `$SEGFOLD_CONFIG_HOME`, or the OS config directory.
    pub fn resolve() -> Result<Self, AppDirError> {
        let base = match std::env::var_os(CONFIG_HOME_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => BaseDirs::new()
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or(AppDirError::NoBaseDir)?,
        };
        Ok(Self::under(&base))
    }

    /// Layout rooted at `base/.segfold`. Nothing is created yet.
    pub fn under(base: &Path) -> Self {
        Self {
            root: base.join(APP_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR_NAME)
    }

    /// Create the root and logs directories.
    pub fn create(&self) -> Result<(), AppDirError> {
        let logs = self.logs();
        fs::create_dir_all(&logs).map_err(|source| AppDirError::CreateDir { path: logs, source })
    }
}

/// Return the run log directory, creating it when missing.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let dirs = AppDirs::resolve()?;
    dirs.create()?;
    Ok(dirs.logs())
}

/// Path of the default `segfold.toml`. The directory is created, the file is not.
pub fn default_config_path() -> Result<PathBuf, AppDirError> {
    let dirs = AppDirs::resolve()?;
    dirs.create()?;
    Ok(dirs.config_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn layout_is_rooted_under_base() {
        let base = tempdir().unwrap();
        let dirs = AppDirs::under(base.path());
        assert_eq!(dirs.root(), base.path().join(APP_DIR_NAME));
        assert_eq!(dirs.config_file(), dirs.root().join(CONFIG_FILE_NAME));
        assert_eq!(dirs.logs(), dirs.root().join("logs"));
        assert!(!dirs.root().exists());
    }

    #[test]
    fn create_makes_root_and_logs() {
        let base = tempdir().unwrap();
        let dirs = AppDirs::under(base.path());
        dirs.create().unwrap();
        assert!(dirs.logs().is_dir());
        assert!(!dirs.config_file().exists());
        // second call is a no-op
        dirs.create().unwrap();
    }

    #[test]
    fn create_reports_the_failing_path() {
        let base = tempdir().unwrap();
        let blocker = base.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let err = AppDirs::under(&blocker).create().unwrap_err();
        assert!(matches!(err, AppDirError::CreateDir { path, .. } if path.starts_with(&blocker)));
    }
}
