use ndarray::{Array1, Axis};

use super::FeatureTable;
use crate::dataset::error::DatasetError;

/// Per-column means pooled over `tables`, computed without concatenating them.
pub fn column_means(tables: &[&FeatureTable]) -> Result<Array1<f64>, DatasetError> {
    let first = check_layout(tables)?;
    let mut sums = Array1::<f64>::zeros(first.n_columns());
    let mut rows = 0usize;
    for table in tables {
        sums += &table.values.sum_axis(Axis(0));
        rows += table.len();
    }
    if rows == 0 {
        return Err(DatasetError::InvalidArgument(
            "cannot compute means of empty tables".to_string(),
        ));
    }
    Ok(sums / rows as f64)
}

/// Column-wise standardization fitted on a pool of tables.
///
/// Class labels live outside the value matrix and are never rescaled.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub mean: Array1<f64>,
    /// Sample standard deviation (`ddof = 1`).
    pub std: Array1<f64>,
    pub center: bool,
    pub scale: bool,
}

impl Standardizer {
    /// Fit pooled mean and standard deviation over every row of `tables`.
    pub fn fit(tables: &[&FeatureTable]) -> Result<Self, DatasetError> {
        let mean = column_means(tables)?;
        let rows: usize = tables.iter().map(|table| table.len()).sum();
        let mut squares = Array1::<f64>::zeros(mean.len());
        for table in tables {
            for row in table.values.rows() {
                let diff = &row - &mean;
                squares += &(&diff * &diff);
            }
        }
        let denom = rows.saturating_sub(1).max(1) as f64;
        let std = squares.mapv(|sum| (sum / denom).sqrt());
        Ok(Self {
            mean,
            std,
            center: true,
            scale: true,
        })
    }

    pub fn with_center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    /// Standardize `table` in place. Zero-variance columns are only centered.
    pub fn apply(&self, table: &mut FeatureTable) -> Result<(), DatasetError> {
        if table.n_columns() != self.mean.len() {
            return Err(DatasetError::ColumnMismatch(format!(
                "standardizer fitted on {} columns, table has {}",
                self.mean.len(),
                table.n_columns()
            )));
        }
        for mut row in table.values.rows_mut() {
            if self.center {
                row -= &self.mean;
            }
            if self.scale {
                row.zip_mut_with(&self.std, |value, &sd| {
                    if sd > 0.0 && sd.is_finite() {
                        *value /= sd;
                    }
                });
            }
        }
        Ok(())
    }

    /// Standardized copies of `tables`.
    pub fn transform(&self, tables: &[&FeatureTable]) -> Result<Vec<FeatureTable>, DatasetError> {
        tables
            .iter()
            .map(|table| {
                let mut out = (*table).clone();
                self.apply(&mut out)?;
                Ok(out)
            })
            .collect()
    }
}

/// Standardize `tables` with statistics pooled over all of them.
pub fn standardize(
    tables: &[&FeatureTable],
    center: bool,
    scale: bool,
) -> Result<Vec<FeatureTable>, DatasetError> {
    Standardizer::fit(tables)?
        .with_center(center)
        .with_scale(scale)
        .transform(tables)
}

fn check_layout<'a>(tables: &[&'a FeatureTable]) -> Result<&'a FeatureTable, DatasetError> {
    let Some(first) = tables.first().copied() else {
        return Err(DatasetError::InvalidArgument(
            "no tables to standardize".to_string(),
        ));
    };
    if tables.iter().any(|table| table.columns != first.columns) {
        return Err(DatasetError::ColumnMismatch(
            "tables to standardize have different columns".to_string(),
        ));
    }
    Ok(first)
}
