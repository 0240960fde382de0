//! Reshaping window-level tables into multi-window frames.

use ndarray::{Array2, s};
use serde::{Deserialize, Serialize};

use super::error::DatasetError;
use super::table::{ColumnKey, FrameTable, WindowTable};

/// How consecutive windows are grouped into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameMode {
    /// Contiguous, non-overlapping groups of `frame_length` windows.
    Fixed,
    /// One frame per window offset, advancing by a single window.
    Sliding,
}

/// Frame length plus grouping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameLayout {
    pub frame_length: usize,
    pub mode: FrameMode,
}

impl FrameLayout {
    pub fn fixed(frame_length: usize) -> Self {
        Self {
            frame_length,
            mode: FrameMode::Fixed,
        }
    }

    pub fn sliding(frame_length: usize) -> Self {
        Self {
            frame_length,
            mode: FrameMode::Sliding,
        }
    }

    pub fn is_sliding(&self) -> bool {
        self.mode == FrameMode::Sliding
    }

    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.frame_length == 0 {
            return Err(DatasetError::InvalidArgument(
                "frame_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build frames from `windows` according to `layout`.
pub fn build_frames(windows: &WindowTable, layout: FrameLayout) -> Result<FrameTable, DatasetError> {
    match layout.mode {
        FrameMode::Fixed => reshape_frames(windows, layout.frame_length),
        FrameMode::Sliding => sliding_frames(windows, layout.frame_length),
    }
}

/// Column keys of a frame: every feature repeated once per window offset.
pub fn frame_columns(features: &[String], frame_length: usize) -> Vec<ColumnKey> {
    (0..frame_length)
        .flat_map(|window| {
            features
                .iter()
                .map(move |feature| ColumnKey::new(window, feature.clone()))
        })
        .collect()
}

/// Group windows into `n_windows / frame_length` non-overlapping frames.
///
/// Fails with [`DatasetError::ShapeMismatch`] when the window count is not a
/// multiple of `frame_length`.
pub fn reshape_frames(windows: &WindowTable, frame_length: usize) -> Result<FrameTable, DatasetError> {
    FrameLayout::fixed(frame_length).validate()?;
    let n_windows = windows.n_windows();
    if n_windows % frame_length != 0 {
        return Err(DatasetError::ShapeMismatch {
            windows: n_windows,
            frame_length,
        });
    }
    let n_features = windows.features.len();
    let n_frames = n_windows / frame_length;
    // Row-major data of consecutive windows is already laid out frame by frame.
    let flat: Vec<f64> = windows.values.iter().copied().collect();
    let values = Array2::from_shape_vec((n_frames, frame_length * n_features), flat)
        .map_err(|err| DatasetError::ColumnMismatch(err.to_string()))?;
    Ok(FrameTable {
        columns: frame_columns(&windows.features, frame_length),
        values,
    })
}

/// Overlapping frames: frame `i` concatenates windows `i..i + frame_length`.
///
/// Yields `max(n_windows - frame_length + 1, 0)` frames.
pub fn sliding_frames(windows: &WindowTable, frame_length: usize) -> Result<FrameTable, DatasetError> {
    FrameLayout::sliding(frame_length).validate()?;
    let n_features = windows.features.len();
    let n_frames = (windows.n_windows() + 1).saturating_sub(frame_length);
    let mut values = Array2::<f64>::zeros((n_frames, frame_length * n_features));
    for (frame, mut row) in values.rows_mut().into_iter().enumerate() {
        for offset in 0..frame_length {
            row.slice_mut(s![offset * n_features..(offset + 1) * n_features])
                .assign(&windows.values.row(frame + offset));
        }
    }
    Ok(FrameTable {
        columns: frame_columns(&windows.features, frame_length),
        values,
    })
}
