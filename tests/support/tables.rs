use std::fs;
use std::path::Path;

use ndarray::Array2;
use segfold::dataset::{Class, ColumnKey, FeatureTable, RowKey};

/// Labeled table with `segments` segments of `rows` rows and `features` columns.
pub fn class_table(class: Class, segments: usize, rows: usize, features: usize) -> FeatureTable {
    let keys: Vec<RowKey> = (0..segments)
        .flat_map(|segment| {
            (0..rows).map(move |frame| {
                RowKey::new(
                    format!("Dog_1_{}_segment_{:04}.mat", class.name(), segment + 1),
                    frame,
                )
            })
        })
        .collect();
    let offset = class.as_label() as f64 * 1000.0;
    let values = Array2::from_shape_fn((keys.len(), features), |(row, col)| {
        offset + (row * features + col) as f64
    });
    let columns = (0..features)
        .map(|idx| ColumnKey::new(0, format!("f{idx}")))
        .collect();
    FeatureTable::new(keys, columns, values, None)
        .expect("consistent synthetic table")
        .with_class(class)
}

/// Interictal and preictal tables concatenated and sorted by segment.
pub fn merged_table(segments_per_class: usize, rows: usize) -> FeatureTable {
    let inter = class_table(Class::Interictal, segments_per_class, rows, 2);
    let pre = class_table(Class::Preictal, segments_per_class, rows, 2);
    let mut table = FeatureTable::concat(&[&inter, &pre]).expect("same columns");
    table.sort_by_segment();
    table
}

/// Write `segments` CSV feature files for `class_name`, each split over two
/// fragment files with `windows` rows.
pub fn write_feature_csvs(dir: &Path, class_name: &str, segments: usize, windows: usize) {
    let subject = dir.join("Dog_1");
    fs::create_dir_all(&subject).expect("create feature dir");
    for segment in 1..=segments {
        let base = format!("Dog_1_{class_name}_segment_{segment:04}");
        let mut xcorr = String::from("c0,c1\n");
        let mut band = String::from("delta\n");
        for window in 0..windows {
            let value = (segment * 100 + window) as f64;
            xcorr.push_str(&format!("{value},{}\n", value + 0.5));
            if window == 1 {
                band.push_str("NaN\n");
            } else {
                band.push_str(&format!("{}\n", -value));
            }
        }
        fs::write(subject.join(format!("{base}_xcorr.csv")), xcorr).expect("write xcorr");
        fs::write(subject.join(format!("{base}_band.csv")), band).expect("write band");
    }
}
