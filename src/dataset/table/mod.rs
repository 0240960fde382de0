//! In-memory feature tables keyed by `(segment_id, frame_index)`.

mod combine;
mod interpolate;
mod scale;

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::error::DatasetError;

pub use combine::combine_features;
pub use scale::{Standardizer, column_means, standardize};

/// Binary class label carried by every labeled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Class {
    /// Baseline recording, label `0`.
    Interictal,
    /// Pre-seizure recording, label `1`.
    Preictal,
}

impl Class {
    /// Numeric value of the `Preictal` column.
    pub fn as_label(self) -> u8 {
        match self {
            Self::Interictal => 0,
            Self::Preictal => 1,
        }
    }

    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Self::Interictal),
            1 => Some(Self::Preictal),
            _ => None,
        }
    }

    /// Class name used in feature file names and cache keys.
    pub fn name(self) -> &'static str {
        match self {
            Self::Interictal => "interictal",
            Self::Preictal => "preictal",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Two-level row key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey {
    /// Canonical segment identifier.
    pub segment: String,
    /// Position of the frame inside its segment.
    pub frame: usize,
}

impl RowKey {
    pub fn new(segment: impl Into<String>, frame: usize) -> Self {
        Self {
            segment: segment.into(),
            frame,
        }
    }
}

/// Two-level column key: window offset inside the frame and original feature name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub window: usize,
    pub feature: String,
}

impl ColumnKey {
    pub fn new(window: usize, feature: impl Into<String>) -> Self {
        Self {
            window,
            feature: feature.into(),
        }
    }
}

/// Window-level table returned by a window loader: one row per window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTable {
    /// Feature names, one per column.
    pub features: Vec<String>,
    /// `[n_windows, n_features]` values.
    pub values: Array2<f64>,
}

impl WindowTable {
    pub fn new(features: Vec<String>, values: Array2<f64>) -> Result<Self, DatasetError> {
        if features.len() != values.ncols() {
            return Err(DatasetError::ColumnMismatch(format!(
                "{} feature names for {} columns",
                features.len(),
                values.ncols()
            )));
        }
        Ok(Self { features, values })
    }

    pub fn n_windows(&self) -> usize {
        self.values.nrows()
    }
}

/// Frame-level table for a single segment: one row per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTable {
    pub columns: Vec<ColumnKey>,
    /// `[n_frames, frame_length * n_features]` values.
    pub values: Array2<f64>,
}

impl FrameTable {
    pub fn n_frames(&self) -> usize {
        self.values.nrows()
    }
}

/// Rows from one or many segments, with optional per-row class labels.
///
/// Row `i` is described by `rows()[i]`, `values().row(i)` and, when present,
/// `labels()[i]`. Segment-grouped operations expect the table to be sorted
/// by segment; [`FeatureTable::sort_by_segment`] restores that order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    rows: Vec<RowKey>,
    columns: Vec<ColumnKey>,
    values: Array2<f64>,
    labels: Option<Vec<Class>>,
}

impl FeatureTable {
    pub fn new(
        rows: Vec<RowKey>,
        columns: Vec<ColumnKey>,
        values: Array2<f64>,
        labels: Option<Vec<Class>>,
    ) -> Result<Self, DatasetError> {
        if values.nrows() != rows.len() || values.ncols() != columns.len() {
            return Err(DatasetError::ColumnMismatch(format!(
                "values are {}x{} but table has {} rows and {} columns",
                values.nrows(),
                values.ncols(),
                rows.len(),
                columns.len()
            )));
        }
        if let Some(labels) = &labels {
            if labels.len() != rows.len() {
                return Err(DatasetError::ColumnMismatch(format!(
                    "{} labels for {} rows",
                    labels.len(),
                    rows.len()
                )));
            }
        }
        Ok(Self {
            rows,
            columns,
            values,
            labels,
        })
    }

    /// Stack per-segment frame tables, keying each frame by its segment id.
    pub fn from_segment_frames(segments: Vec<(String, FrameTable)>) -> Result<Self, DatasetError> {
        let Some((_, first)) = segments.first() else {
            return Self::new(Vec::new(), Vec::new(), Array2::zeros((0, 0)), None);
        };
        let columns = first.columns.clone();
        let mut rows = Vec::new();
        for (segment, frames) in &segments {
            if frames.columns != columns {
                return Err(DatasetError::ColumnMismatch(format!(
                    "segment {segment} has {} columns, expected the layout of the first segment ({})",
                    frames.columns.len(),
                    columns.len()
                )));
            }
            rows.extend((0..frames.n_frames()).map(|frame| RowKey::new(segment.clone(), frame)));
        }
        let views: Vec<ArrayView2<'_, f64>> =
            segments.iter().map(|(_, frames)| frames.values.view()).collect();
        let values = stack_rows(&views, columns.len())?;
        Self::new(rows, columns, values, None)
    }

    /// Concatenate tables sharing one column layout.
    ///
    /// Labels are kept when every table is labeled; mixing labeled and
    /// unlabeled tables fails with [`DatasetError::MissingLabels`].
    pub fn concat(tables: &[&FeatureTable]) -> Result<Self, DatasetError> {
        let Some(first) = tables.first() else {
            return Err(DatasetError::InvalidArgument(
                "cannot concatenate an empty list of tables".to_string(),
            ));
        };
        for table in tables {
            if table.columns != first.columns {
                return Err(DatasetError::ColumnMismatch(
                    "tables to concatenate have different columns".to_string(),
                ));
            }
        }
        let labeled = tables.iter().filter(|table| table.labels.is_some()).count();
        let labels = if labeled == tables.len() {
            Some(
                tables
                    .iter()
                    .flat_map(|table| table.labels.iter().flatten().copied())
                    .collect(),
            )
        } else if labeled == 0 {
            None
        } else {
            return Err(DatasetError::MissingLabels);
        };
        let rows = tables
            .iter()
            .flat_map(|table| table.rows.iter().cloned())
            .collect();
        let views: Vec<ArrayView2<'_, f64>> = tables.iter().map(|table| table.values.view()).collect();
        let values = stack_rows(&views, first.columns.len())?;
        Self::new(rows, first.columns.clone(), values, labels)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn labels(&self) -> Option<&[Class]> {
        self.labels.as_deref()
    }

    /// Labels, or [`DatasetError::MissingLabels`] for unlabeled tables.
    pub fn require_labels(&self) -> Result<&[Class], DatasetError> {
        self.labels().ok_or(DatasetError::MissingLabels)
    }

    /// Label every row with `class`.
    pub fn with_class(mut self, class: Class) -> Self {
        self.labels = Some(vec![class; self.rows.len()]);
        self
    }

    /// Drop class labels.
    pub fn unlabeled(mut self) -> Self {
        self.labels = None;
        self
    }

    /// Distinct segment ids in order of first appearance.
    pub fn segment_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|row| row.segment.as_str())
            .filter(|segment| seen.insert(*segment))
            .collect()
    }

    pub fn segment_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.segment.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Row count per class.
    pub fn class_counts(&self) -> Result<BTreeMap<Class, usize>, DatasetError> {
        let mut counts = BTreeMap::new();
        for class in self.require_labels()? {
            *counts.entry(*class).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Copy of the rows at `indices`, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&idx| self.rows[idx].clone()).collect(),
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
            labels: self
                .labels
                .as_ref()
                .map(|labels| indices.iter().map(|&idx| labels[idx]).collect()),
        }
    }

    /// Rows belonging to any of `segments`, in table order.
    pub fn select_segments(&self, segments: &HashSet<&str>) -> Self {
        let indices: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| segments.contains(row.segment.as_str()))
            .map(|(idx, _)| idx)
            .collect();
        self.take_rows(&indices)
    }

    /// Sort rows by `(segment_id, frame_index)`.
    pub fn sort_by_segment(&mut self) {
        if self.rows.is_sorted() {
            return;
        }
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| self.rows[a].cmp(&self.rows[b]));
        *self = self.take_rows(&order);
    }

    /// Sort columns by `(window_offset, feature_name)`.
    pub fn sort_columns(&mut self) {
        if self.columns.is_sorted() {
            return;
        }
        let mut order: Vec<usize> = (0..self.columns.len()).collect();
        order.sort_by(|&a, &b| self.columns[a].cmp(&self.columns[b]));
        self.columns = order.iter().map(|&idx| self.columns[idx].clone()).collect();
        self.values = self.values.select(Axis(1), &order);
    }

    /// Number of NaN or infinite cells.
    pub fn non_finite_count(&self) -> usize {
        self.values.iter().filter(|value| !value.is_finite()).count()
    }

    /// Rewrite every segment id through `rename`.
    pub fn rename_segments(&mut self, rename: impl Fn(&str) -> String) {
        for row in &mut self.rows {
            row.segment = rename(&row.segment);
        }
    }
}

fn stack_rows(views: &[ArrayView2<'_, f64>], n_columns: usize) -> Result<Array2<f64>, DatasetError> {
    if views.is_empty() {
        return Ok(Array2::zeros((0, n_columns)));
    }
    ndarray::concatenate(Axis(0), views).map_err(|err| DatasetError::ColumnMismatch(err.to_string()))
}

#[cfg(test)]
mod tests;
