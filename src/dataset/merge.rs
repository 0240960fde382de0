//! Merging the two class tables with class-imbalance downsampling.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use tracing::{debug, info};

use super::error::DatasetError;
use super::table::{Class, FeatureTable};

/// Options for [`merge_interictal_preictal`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    /// Reduce the larger class before merging.
    pub downsample: bool,
    /// Largest allowed `len(larger) / len(smaller)` after downsampling.
    pub downsample_ratio: f64,
    /// Drop whole segments instead of individual rows.
    pub segment_level: bool,
    pub seed: u64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            downsample: true,
            downsample_ratio: 2.0,
            segment_level: true,
            seed: 42,
        }
    }
}

/// Merge labeled interictal and preictal tables into one table sorted by segment.
///
/// Both inputs are sorted by segment and by column before anything else so
/// the result does not depend on input order. With downsampling enabled the
/// larger class is reduced to at most `downsample_ratio` times the size of
/// the smaller one.
pub fn merge_interictal_preictal(
    interictal: &FeatureTable,
    preictal: &FeatureTable,
    options: &MergeOptions,
) -> Result<FeatureTable, DatasetError> {
    let mut interictal = interictal.clone();
    let mut preictal = preictal.clone();
    for table in [&mut interictal, &mut preictal] {
        table.require_labels()?;
        table.sort_by_segment();
        table.sort_columns();
    }

    if options.downsample {
        if !(options.downsample_ratio.is_finite() && options.downsample_ratio > 0.0) {
            return Err(DatasetError::InvalidArgument(format!(
                "downsample ratio must be positive, got {}",
                options.downsample_ratio
            )));
        }
        let mut rng = StdRng::seed_from_u64(options.seed);
        let (larger, smaller, class) = if interictal.len() >= preictal.len() {
            (&mut interictal, &preictal, Class::Interictal)
        } else {
            (&mut preictal, &interictal, Class::Preictal)
        };
        let budget = smaller.len() as f64 * options.downsample_ratio;
        let before = larger.len();
        *larger = downsample(larger, budget, options.segment_level, &mut rng);
        info!(
            "Downsampled {class} from {before} to {} rows (budget {budget:.1})",
            larger.len()
        );
    }

    let mut merged = FeatureTable::concat(&[&interictal, &preictal])?;
    merged.sort_by_segment();
    Ok(merged)
}

/// Random subset of `table` with at most `n_samples` rows, or the table itself.
///
/// With `segment_level` the row budget is divided by the average segment
/// size and truncated once, giving the number of whole segments drawn
/// without replacement. When that count is not smaller than the number of
/// segments the table is returned unchanged. Otherwise `floor(n_samples)`
/// rows are drawn without replacement when fewer than the available rows.
pub fn downsample(
    table: &FeatureTable,
    n_samples: f64,
    segment_level: bool,
    rng: &mut StdRng,
) -> FeatureTable {
    if table.is_empty() || !(n_samples >= 0.0) {
        return table.clone();
    }
    if segment_level {
        let segments = table.segment_ids();
        let rows_per_segment = table.len() as f64 / segments.len() as f64;
        let n_segments = (n_samples / rows_per_segment) as usize;
        if n_segments >= segments.len() {
            debug!(
                "Keeping all {} segments (target {n_segments})",
                segments.len()
            );
            return table.clone();
        }
        let chosen: HashSet<&str> = index::sample(rng, segments.len(), n_segments)
            .into_iter()
            .map(|idx| segments[idx])
            .collect();
        table.select_segments(&chosen)
    } else {
        let n_rows = n_samples.floor() as usize;
        if n_rows >= table.len() {
            return table.clone();
        }
        let mut rows = index::sample(rng, table.len(), n_rows).into_vec();
        rows.sort_unstable();
        table.take_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;
    use crate::dataset::table::{ColumnKey, RowKey};

    fn class_table(class: Class, segments: usize, rows: usize) -> FeatureTable {
        let keys: Vec<RowKey> = (0..segments)
            .flat_map(|s| (0..rows).map(move |f| RowKey::new(format!("{}_{s:03}", class.name()), f)))
            .collect();
        let values = Array2::from_shape_fn((keys.len(), 1), |(r, _)| r as f64);
        FeatureTable::new(keys, vec![ColumnKey::new(0, "x")], values, None)
            .unwrap()
            .with_class(class)
    }

    #[test]
    fn segment_downsampling_keeps_whole_segments() {
        let inter = class_table(Class::Interictal, 20, 5);
        let pre = class_table(Class::Preictal, 4, 5);
        let merged = merge_interictal_preictal(&inter, &pre, &MergeOptions::default()).unwrap();
        let counts = merged.class_counts().unwrap();
        assert_eq!(counts[&Class::Preictal], 20);
        assert_eq!(counts[&Class::Interictal], 40);
        for segment in merged.segment_ids() {
            let rows = merged.rows().iter().filter(|row| row.segment == segment).count();
            assert_eq!(rows, 5);
        }
        assert!(merged.rows().is_sorted());
    }

    #[test]
    fn row_downsampling_hits_the_budget_exactly() {
        let inter = class_table(Class::Interictal, 3, 10);
        let pre = class_table(Class::Preictal, 1, 7);
        let options = MergeOptions {
            downsample_ratio: 1.5,
            segment_level: false,
            ..MergeOptions::default()
        };
        let merged = merge_interictal_preictal(&inter, &pre, &options).unwrap();
        let counts = merged.class_counts().unwrap();
        assert_eq!(counts[&Class::Interictal], 10);
        assert_eq!(counts[&Class::Preictal], 7);
    }

    #[test]
    fn larger_preictal_class_is_the_one_reduced() {
        let inter = class_table(Class::Interictal, 2, 3);
        let pre = class_table(Class::Preictal, 10, 3);
        let merged = merge_interictal_preictal(&inter, &pre, &MergeOptions::default()).unwrap();
        let counts = merged.class_counts().unwrap();
        assert_eq!(counts[&Class::Interictal], 6);
        assert_eq!(counts[&Class::Preictal], 12);
    }

    #[test]
    fn target_not_below_available_segments_keeps_everything() {
        let table = class_table(Class::Interictal, 4, 3);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(downsample(&table, 12.0, true, &mut rng), table);
        assert_eq!(downsample(&table, 100.0, false, &mut rng), table);
    }

    #[test]
    fn fractional_budget_is_truncated_once_into_segments() {
        // interictal segments of 1, 2, 1 and 2 rows: 1.5 rows per segment
        let keys: Vec<RowKey> = [1usize, 2, 1, 2]
            .iter()
            .enumerate()
            .flat_map(|(s, &rows)| (0..rows).map(move |f| RowKey::new(format!("interictal_{s:03}"), f)))
            .collect();
        let values = Array2::zeros((keys.len(), 1));
        let inter = FeatureTable::new(keys, vec![ColumnKey::new(0, "x")], values, None)
            .unwrap()
            .with_class(Class::Interictal);
        let pre = class_table(Class::Preictal, 1, 3);
        let options = MergeOptions {
            downsample_ratio: 1.5,
            ..MergeOptions::default()
        };
        // budget 4.5 rows / 1.5 rows per segment keeps 3 of 4 segments
        let merged = merge_interictal_preictal(&inter, &pre, &options).unwrap();
        let kept = merged
            .segment_ids()
            .into_iter()
            .filter(|segment| segment.starts_with("interictal"))
            .count();
        assert_eq!(kept, 3);
    }

    #[test]
    fn row_budget_rounds_down_to_whole_rows() {
        let table = class_table(Class::Interictal, 2, 5);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(downsample(&table, 4.9, false, &mut rng).len(), 4);
    }

    #[test]
    fn without_downsampling_every_row_is_kept() {
        let inter = class_table(Class::Interictal, 5, 4);
        let pre = class_table(Class::Preictal, 1, 4);
        let options = MergeOptions {
            downsample: false,
            ..MergeOptions::default()
        };
        let merged = merge_interictal_preictal(&pre, &inter, &options);
        // arguments swapped: labels still come from the tables themselves
        let merged = merged.unwrap();
        assert_eq!(merged.len(), 24);
        assert_eq!(merged.class_counts().unwrap()[&Class::Interictal], 20);
    }

    #[test]
    fn same_seed_gives_same_merge() {
        let inter = class_table(Class::Interictal, 30, 2);
        let pre = class_table(Class::Preictal, 5, 2);
        let a = merge_interictal_preictal(&inter, &pre, &MergeOptions::default()).unwrap();
        let b = merge_interictal_preictal(&inter, &pre, &MergeOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unlabeled_input_is_rejected() {
        let inter = class_table(Class::Interictal, 1, 1).unlabeled();
        let pre = class_table(Class::Preictal, 1, 1);
        assert!(matches!(
            merge_interictal_preictal(&inter, &pre, &MergeOptions::default()),
            Err(DatasetError::MissingLabels)
        ));
    }
}
