use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{Fold, FoldGenerator};
use crate::dataset::error::DatasetError;
use crate::dataset::table::Class;

/// Stratified K-fold over class labels.
///
/// The positions of each class are dealt into `n_folds` contiguous blocks
/// (the first `count % n_folds` blocks get one extra entry), optionally after
/// shuffling that class's positions. Fold `i` holds out block `i` of every
/// class. Positions keep their input order unless `shuffle` is set, so the
/// result is deterministic for a given seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    pub n_folds: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_folds: usize) -> Self {
        Self {
            n_folds,
            shuffle: false,
            seed: 0,
        }
    }

    pub fn shuffled(n_folds: usize, seed: u64) -> Self {
        Self {
            n_folds,
            shuffle: true,
            seed,
        }
    }

    /// Held-out fold of every position.
    pub fn assign_folds(&self, labels: &[Class]) -> Result<Vec<usize>, DatasetError> {
        if self.n_folds < 2 {
            return Err(DatasetError::InvalidArgument(format!(
                "cross-validation needs at least 2 folds, got {}",
                self.n_folds
            )));
        }
        let mut by_class: BTreeMap<Class, Vec<usize>> = BTreeMap::new();
        for (idx, class) in labels.iter().enumerate() {
            by_class.entry(*class).or_default().push(idx);
        }
        if let Some((class, positions)) = by_class
            .iter()
            .find(|(_, positions)| positions.len() < self.n_folds)
        {
            return Err(DatasetError::InsufficientSegments {
                class: *class,
                segments: positions.len(),
                folds: self.n_folds,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut assignment = vec![0; labels.len()];
        for positions in by_class.values_mut() {
            if self.shuffle {
                positions.shuffle(&mut rng);
            }
            let base = positions.len() / self.n_folds;
            let extra = positions.len() % self.n_folds;
            let mut start = 0;
            for fold in 0..self.n_folds {
                let size = base + usize::from(fold < extra);
                for &position in &positions[start..start + size] {
                    assignment[position] = fold;
                }
                start += size;
            }
        }
        Ok(assignment)
    }
}

impl FoldGenerator for StratifiedKFold {
    fn n_folds(&self) -> usize {
        self.n_folds
    }

    fn split(&self, labels: &[Class]) -> Result<Vec<Fold>, DatasetError> {
        let assignment = self.assign_folds(labels)?;
        let mut folds = vec![Fold::default(); self.n_folds];
        for (idx, &held_out) in assignment.iter().enumerate() {
            for (fold_idx, fold) in folds.iter_mut().enumerate() {
                if fold_idx == held_out {
                    fold.test.push(idx);
                } else {
                    fold.train.push(idx);
                }
            }
        }
        Ok(folds)
    }
}
