mod support;

use std::collections::HashSet;

use segfold::dataset::{
    Class, DatasetError, MergeOptions, RowKey, SplitOptions, folds_for_training_ratio,
    split_dataset, split_experiment_data,
};
use support::tables::{class_table, merged_table};

#[test]
fn splits_cover_every_row_exactly_once() {
    let table = merged_table(12, 5);
    for ratio in [0.5, 0.6, 0.7, 0.75, 0.8, 0.85, 0.9] {
        for segment_level in [true, false] {
            let options = SplitOptions {
                segment_level,
                ..SplitOptions::default()
            };
            let (train, test) = split_dataset(&table, ratio, &options).unwrap();
            assert_eq!(train.len() + test.len(), table.len(), "ratio {ratio}");
            let keys: HashSet<&RowKey> = train.rows().iter().chain(test.rows()).collect();
            assert_eq!(keys.len(), table.len());

            if segment_level {
                let train_segments: HashSet<&str> = train.segment_ids().into_iter().collect();
                let test_segments: HashSet<&str> = test.segment_ids().into_iter().collect();
                assert!(train_segments.is_disjoint(&test_segments));
            }
        }
    }
}

#[test]
fn achieved_ratio_follows_fold_count() {
    let table = merged_table(20, 6);
    for (ratio, expected) in [(0.8, 0.8), (0.75, 0.75), (0.5, 0.5)] {
        let (train, _) = split_dataset(&table, ratio, &SplitOptions::default()).unwrap();
        let achieved = train.len() as f64 / table.len() as f64;
        assert!((achieved - expected).abs() < 1e-12, "ratio {ratio}: {achieved}");
    }
    // 0.7 rounds down to three folds
    assert_eq!(folds_for_training_ratio(0.7).unwrap(), 3);
}

#[test]
fn experiment_data_is_balanced_then_split() {
    let inter = class_table(Class::Interictal, 50, 4, 3);
    let pre = class_table(Class::Preictal, 10, 4, 3);
    let (train, test) = split_experiment_data(
        &inter,
        &pre,
        0.8,
        &MergeOptions::default(),
        &SplitOptions::default(),
    )
    .unwrap();
    let mut counts = train.class_counts().unwrap();
    for (class, count) in test.class_counts().unwrap() {
        *counts.entry(class).or_insert(0) += count;
    }
    assert_eq!(counts[&Class::Preictal], 40);
    assert_eq!(counts[&Class::Interictal], 80);
    assert_eq!(test.len(), 24);
}

#[test]
fn out_of_range_ratio_is_invalid() {
    let table = merged_table(4, 2);
    for ratio in [0.0, 1.0, 1.2, -0.5] {
        assert!(matches!(
            split_dataset(&table, ratio, &SplitOptions::default()),
            Err(DatasetError::InvalidRatio(_))
        ));
    }
}
