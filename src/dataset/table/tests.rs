use std::collections::HashSet;

use ndarray::{Array2, array};

use super::*;

fn frames(columns: &[&str], values: Array2<f64>) -> FrameTable {
    FrameTable {
        columns: columns.iter().map(|name| ColumnKey::new(0, *name)).collect(),
        values,
    }
}

fn labeled(segments: &[(&str, usize)], class: Class) -> FeatureTable {
    let parts = segments
        .iter()
        .map(|(segment, n)| {
            let values = Array2::from_shape_fn((*n, 1), |(row, _)| row as f64);
            (segment.to_string(), frames(&["f"], values))
        })
        .collect();
    FeatureTable::from_segment_frames(parts)
        .unwrap()
        .with_class(class)
}

#[test]
fn new_rejects_inconsistent_shapes() {
    let err = FeatureTable::new(
        vec![RowKey::new("s", 0)],
        vec![ColumnKey::new(0, "a"), ColumnKey::new(0, "b")],
        array![[1.0]],
        None,
    )
    .unwrap_err();
    assert!(matches!(err, DatasetError::ColumnMismatch(_)));

    let err = FeatureTable::new(
        vec![RowKey::new("s", 0)],
        vec![ColumnKey::new(0, "a")],
        array![[1.0]],
        Some(vec![Class::Preictal, Class::Preictal]),
    )
    .unwrap_err();
    assert!(matches!(err, DatasetError::ColumnMismatch(_)));
}

#[test]
fn segment_frames_are_keyed_by_segment_and_frame_index() {
    let table = FeatureTable::from_segment_frames(vec![
        ("b".to_string(), frames(&["x"], array![[1.0], [2.0]])),
        ("a".to_string(), frames(&["x"], array![[3.0]])),
    ])
    .unwrap();
    assert_eq!(
        table.rows(),
        &[RowKey::new("b", 0), RowKey::new("b", 1), RowKey::new("a", 0)]
    );
    assert_eq!(table.values().column(0).to_vec(), vec![1.0, 2.0, 3.0]);
    assert!(table.labels().is_none());
}

#[test]
fn segment_frames_must_share_columns() {
    let err = FeatureTable::from_segment_frames(vec![
        ("a".to_string(), frames(&["x"], array![[1.0]])),
        ("b".to_string(), frames(&["y"], array![[1.0]])),
    ])
    .unwrap_err();
    assert!(matches!(err, DatasetError::ColumnMismatch(_)));
}

#[test]
fn concat_keeps_labels_only_when_every_table_has_them() {
    let inter = labeled(&[("i1", 2)], Class::Interictal);
    let pre = labeled(&[("p1", 1)], Class::Preictal);
    let both = FeatureTable::concat(&[&inter, &pre]).unwrap();
    assert_eq!(
        both.labels().unwrap(),
        &[Class::Interictal, Class::Interictal, Class::Preictal]
    );

    let bare = pre.clone().unlabeled();
    assert!(FeatureTable::concat(&[&bare, &bare]).unwrap().labels().is_none());
    assert!(matches!(
        FeatureTable::concat(&[&inter, &bare]),
        Err(DatasetError::MissingLabels)
    ));
}

#[test]
fn sort_by_segment_moves_labels_with_rows() {
    let pre = labeled(&[("z", 1)], Class::Preictal);
    let inter = labeled(&[("a", 2)], Class::Interictal);
    let mut table = FeatureTable::concat(&[&pre, &inter]).unwrap();
    table.sort_by_segment();
    assert_eq!(table.segment_ids(), vec!["a", "z"]);
    assert_eq!(
        table.labels().unwrap(),
        &[Class::Interictal, Class::Interictal, Class::Preictal]
    );
    assert_eq!(table.values().column(0).to_vec(), vec![0.0, 1.0, 0.0]);
}

#[test]
fn sort_columns_orders_by_window_then_feature() {
    let mut table = FeatureTable::new(
        vec![RowKey::new("s", 0)],
        vec![
            ColumnKey::new(1, "a"),
            ColumnKey::new(0, "b"),
            ColumnKey::new(0, "a"),
        ],
        array![[3.0, 2.0, 1.0]],
        None,
    )
    .unwrap();
    table.sort_columns();
    assert_eq!(
        table.columns(),
        &[
            ColumnKey::new(0, "a"),
            ColumnKey::new(0, "b"),
            ColumnKey::new(1, "a")
        ]
    );
    assert_eq!(table.values(), &array![[1.0, 2.0, 3.0]]);
}

#[test]
fn select_segments_keeps_every_row_of_chosen_segments() {
    let table = labeled(&[("a", 2), ("b", 3), ("c", 1)], Class::Preictal);
    let chosen: HashSet<&str> = ["a", "c"].into_iter().collect();
    let picked = table.select_segments(&chosen);
    assert_eq!(picked.len(), 3);
    assert_eq!(picked.segment_ids(), vec!["a", "c"]);
    assert_eq!(table.segment_count(), 3);
}

#[test]
fn class_counts_need_labels() {
    let inter = labeled(&[("i", 3)], Class::Interictal);
    let pre = labeled(&[("p", 1)], Class::Preictal);
    let table = FeatureTable::concat(&[&inter, &pre]).unwrap();
    let counts = table.class_counts().unwrap();
    assert_eq!(counts[&Class::Interictal], 3);
    assert_eq!(counts[&Class::Preictal], 1);
    assert!(matches!(
        table.unlabeled().class_counts(),
        Err(DatasetError::MissingLabels)
    ));
}

#[test]
fn class_labels_round_trip_through_numbers() {
    assert_eq!(Class::from_label(Class::Preictal.as_label()), Some(Class::Preictal));
    assert_eq!(Class::Interictal.as_label(), 0);
    assert_eq!(Class::from_label(2), None);
    assert_eq!(Class::Preictal.to_string(), "preictal");
}
