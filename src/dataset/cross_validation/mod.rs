//! Stratified K-fold cross-validation over rows or whole segments.
//!
//! [`StratifiedKFold`] partitions a label sequence. [`SegmentCrossValidator`]
//! runs a generator over one entry per segment and expands every fold back
//! to the rows of the selected segments, so no recording is ever on both
//! sides of a fold. [`RowCrossValidator`] applies the generator to rows
//! directly.

mod stratified;
mod validator;

use super::error::DatasetError;
use super::table::Class;

pub use stratified::StratifiedKFold;
pub use validator::{RowCrossValidator, SegmentCrossValidator};

/// One train/held-out partition, as ascending row (or entry) indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Produces folds over a sequence of class labels.
pub trait FoldGenerator {
    fn n_folds(&self) -> usize;

    /// Exactly [`FoldGenerator::n_folds`] folds over `labels`, stratified by class.
    fn split(&self, labels: &[Class]) -> Result<Vec<Fold>, DatasetError>;
}

impl<G: FoldGenerator + ?Sized> FoldGenerator for &G {
    fn n_folds(&self) -> usize {
        (**self).n_folds()
    }

    fn split(&self, labels: &[Class]) -> Result<Vec<Fold>, DatasetError> {
        (**self).split(labels)
    }
}
