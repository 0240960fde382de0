use std::collections::HashMap;
use std::slice;

use tracing::debug;

use super::{Fold, FoldGenerator, StratifiedKFold};
use crate::dataset::error::DatasetError;
use crate::dataset::table::{Class, FeatureTable};

/// Cross-validator whose folds never split a segment.
///
/// At construction the table is reduced to one entry per segment, labeled
/// with the first label seen for that segment, and the generator partitions
/// those entries. Each segment-level fold is then expanded to the rows of
/// its segments through a segment to row-index map built once here. A class
/// with fewer segments than folds fails construction.
#[derive(Debug, Clone)]
pub struct SegmentCrossValidator<G = StratifiedKFold> {
    generator: G,
    segments: Vec<String>,
    segment_labels: Vec<Class>,
    segment_rows: Vec<Vec<usize>>,
    mixed_segments: Vec<usize>,
    folds: Vec<Fold>,
}

impl SegmentCrossValidator<StratifiedKFold> {
    pub fn new(table: &FeatureTable, n_folds: usize, shuffle: bool, seed: u64) -> Result<Self, DatasetError> {
        Self::with_generator(table, StratifiedKFold { n_folds, shuffle, seed })
    }
}

impl<G: FoldGenerator> SegmentCrossValidator<G> {
    pub fn with_generator(table: &FeatureTable, generator: G) -> Result<Self, DatasetError> {
        let labels = table.require_labels()?;
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut segments = Vec::new();
        let mut segment_labels = Vec::new();
        let mut segment_rows: Vec<Vec<usize>> = Vec::new();
        let mut mixed: Vec<bool> = Vec::new();
        for (row_idx, (row, &label)) in table.rows().iter().zip(labels).enumerate() {
            let segment = row.segment.as_str();
            let position = *positions.entry(segment).or_insert_with(|| {
                segments.push(segment.to_string());
                segment_labels.push(label);
                segment_rows.push(Vec::new());
                mixed.push(false);
                segments.len() - 1
            });
            if segment_labels[position] != label && !mixed[position] {
                debug!(
                    "Segment {segment} mixes labels; using {} from its first row",
                    segment_labels[position]
                );
                mixed[position] = true;
            }
            segment_rows[position].push(row_idx);
        }
        let mixed_segments = mixed
            .iter()
            .enumerate()
            .filter(|(_, mixed)| **mixed)
            .map(|(idx, _)| idx)
            .collect();

        let segment_folds = generator.split(&segment_labels)?;
        let folds: Vec<Fold> = segment_folds
            .iter()
            .map(|fold| Fold {
                train: expand_rows(&segment_rows, &fold.train),
                test: expand_rows(&segment_rows, &fold.test),
            })
            .collect();
        for (idx, fold) in folds.iter().enumerate() {
            debug!(
                "Fold {idx}: {} train rows, {} held-out rows",
                fold.train.len(),
                fold.test.len()
            );
        }
        Ok(Self {
            generator,
            segments,
            segment_labels,
            segment_rows,
            mixed_segments,
            folds,
        })
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Number of folds.
    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    pub fn iter(&self) -> slice::Iter<'_, Fold> {
        self.folds.iter()
    }

    /// Distinct segments in order of first appearance in the table.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment_labels(&self) -> &[Class] {
        &self.segment_labels
    }

    /// Segments whose rows carry more than one label, each listed once.
    pub fn mixed_label_segments(&self) -> Vec<&str> {
        self.mixed_segments
            .iter()
            .map(|&idx| self.segments[idx].as_str())
            .collect()
    }

    /// Segment ids held out by fold `fold`.
    pub fn held_out_segments(&self, fold: usize) -> Vec<&str> {
        let Some(fold) = self.folds.get(fold) else {
            return Vec::new();
        };
        self.segments
            .iter()
            .zip(&self.segment_rows)
            .filter(|(_, rows)| rows.first().is_some_and(|row| fold.test.binary_search(row).is_ok()))
            .map(|(segment, _)| segment.as_str())
            .collect()
    }
}

impl<'a, G> IntoIterator for &'a SegmentCrossValidator<G> {
    type Item = &'a Fold;
    type IntoIter = slice::Iter<'a, Fold>;

    fn into_iter(self) -> Self::IntoIter {
        self.folds.iter()
    }
}

fn expand_rows(segment_rows: &[Vec<usize>], segments: &[usize]) -> Vec<usize> {
    let mut rows: Vec<usize> = segments
        .iter()
        .flat_map(|&segment| segment_rows[segment].iter().copied())
        .collect();
    rows.sort_unstable();
    rows
}

/// Cross-validator that stratifies individual rows, ignoring segments.
#[derive(Debug, Clone)]
pub struct RowCrossValidator<G = StratifiedKFold> {
    generator: G,
    folds: Vec<Fold>,
}

impl RowCrossValidator<StratifiedKFold> {
    pub fn new(table: &FeatureTable, n_folds: usize, shuffle: bool, seed: u64) -> Result<Self, DatasetError> {
        Self::with_generator(table, StratifiedKFold { n_folds, shuffle, seed })
    }
}

impl<G: FoldGenerator> RowCrossValidator<G> {
    pub fn with_generator(table: &FeatureTable, generator: G) -> Result<Self, DatasetError> {
        let folds = generator
            .split(table.require_labels()?)
            .map_err(|err| match err {
                DatasetError::InsufficientSegments {
                    class,
                    segments,
                    folds,
                } => DatasetError::InsufficientRows {
                    class,
                    rows: segments,
                    folds,
                },
                other => other,
            })?;
        Ok(Self { generator, folds })
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    pub fn iter(&self) -> slice::Iter<'_, Fold> {
        self.folds.iter()
    }
}

impl<'a, G> IntoIterator for &'a RowCrossValidator<G> {
    type Item = &'a Fold;
    type IntoIter = slice::Iter<'a, Fold>;

    fn into_iter(self) -> Self::IntoIter {
        self.folds.iter()
    }
}
