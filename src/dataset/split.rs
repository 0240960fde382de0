//! Train/test splits derived from a target training ratio.
//!
//! A ratio `r` is turned into a fold count `k = floor(1 / (1 - r))` and the
//! first fold of a `k`-fold cross-validation becomes the split, so the
//! achieved training share is `(k - 1) / k`. Ratios `0.8` and `0.75` are met
//! exactly (`k = 5` and `k = 4`); `0.7` gives `k = 3` and a share of about
//! `0.667`. Ratios below `0.5` would need fewer than two folds and are
//! rejected.

use tracing::info;

use super::cross_validation::{Fold, RowCrossValidator, SegmentCrossValidator};
use super::error::DatasetError;
use super::merge::{MergeOptions, merge_interictal_preictal};
use super::table::FeatureTable;

/// Absorbs floating point error in `1 / (1 - r)` for ratios such as `0.8`.
const FOLD_COUNT_EPSILON: f64 = 1e-9;

/// How a table is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    /// Keep every segment on one side of the split.
    pub segment_level: bool,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            segment_level: true,
            shuffle: false,
            seed: 42,
        }
    }
}

/// Fold count approximating `training_ratio` as `(k - 1) / k`.
pub fn folds_for_training_ratio(training_ratio: f64) -> Result<usize, DatasetError> {
    if !(training_ratio > 0.0 && training_ratio < 1.0) {
        return Err(DatasetError::InvalidRatio(training_ratio));
    }
    let k = (1.0 / (1.0 - training_ratio) + FOLD_COUNT_EPSILON).floor();
    if k < 2.0 || !k.is_finite() {
        return Err(DatasetError::InvalidRatio(training_ratio));
    }
    Ok(k as usize)
}

/// Split `table` into a training and a held-out table.
pub fn split_dataset(
    table: &FeatureTable,
    training_ratio: f64,
    options: &SplitOptions,
) -> Result<(FeatureTable, FeatureTable), DatasetError> {
    let n_folds = folds_for_training_ratio(training_ratio)?;
    let fold = first_fold(table, n_folds, options)?;
    let train = table.take_rows(&fold.train);
    let test = table.take_rows(&fold.test);
    info!(
        "Split {} rows into {} train / {} test (k = {n_folds}, requested ratio {training_ratio})",
        table.len(),
        train.len(),
        test.len()
    );
    Ok((train, test))
}

fn first_fold(table: &FeatureTable, n_folds: usize, options: &SplitOptions) -> Result<Fold, DatasetError> {
    let folds = if options.segment_level {
        SegmentCrossValidator::new(table, n_folds, options.shuffle, options.seed)?
            .folds()
            .to_vec()
    } else {
        RowCrossValidator::new(table, n_folds, options.shuffle, options.seed)?
            .folds()
            .to_vec()
    };
    folds.into_iter().next().ok_or_else(|| {
        DatasetError::InvalidArgument("cross-validator produced no folds".to_string())
    })
}

/// Merge the two classes and split the result.
pub fn split_experiment_data(
    interictal: &FeatureTable,
    preictal: &FeatureTable,
    training_ratio: f64,
    merge: &MergeOptions,
    split: &SplitOptions,
) -> Result<(FeatureTable, FeatureTable), DatasetError> {
    folds_for_training_ratio(training_ratio)?;
    let merged = merge_interictal_preictal(interictal, preictal, merge)?;
    split_dataset(&merged, training_ratio, split)
}
