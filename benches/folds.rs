use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use segfold::dataset::frames::{reshape_frames, sliding_frames};
use segfold::dataset::{Class, ColumnKey, FeatureTable, RowKey, SegmentCrossValidator, WindowTable};

const ROWS_PER_SEGMENT: usize = 50;

fn dataset(segments_per_class: usize) -> FeatureTable {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for class in [Class::Interictal, Class::Preictal] {
        for segment in 0..segments_per_class {
            for frame in 0..ROWS_PER_SEGMENT {
                rows.push(RowKey::new(format!("{}_{segment:05}", class.name()), frame));
                labels.push(class);
            }
        }
    }
    let values = Array2::zeros((rows.len(), 4));
    let columns = (0..4).map(|idx| ColumnKey::new(0, format!("f{idx}"))).collect();
    FeatureTable::new(rows, columns, values, Some(labels)).expect("bench table")
}

fn bench_segment_folds(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_cross_validator");
    for segments in [100usize, 1_000] {
        let table = dataset(segments);
        group.bench_with_input(BenchmarkId::from_parameter(segments), &table, |b, table| {
            b.iter(|| {
                let validator = SegmentCrossValidator::new(black_box(table), 5, true, 7).expect("folds");
                black_box(validator.len())
            })
        });
    }
    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let features: Vec<String> = (0..120).map(|idx| format!("xcorr_{idx}")).collect();
    let values = Array2::from_shape_fn((600, features.len()), |(row, col)| (row + col) as f64);
    let windows = WindowTable::new(features, values).expect("bench windows");
    c.bench_function("reshape_frames_12", |b| {
        b.iter(|| black_box(reshape_frames(black_box(&windows), 12).expect("fixed frames")))
    });
    c.bench_function("sliding_frames_12", |b| {
        b.iter(|| black_box(sliding_frames(black_box(&windows), 12).expect("sliding frames")))
    });
}

criterion_group!(benches, bench_segment_folds, bench_frames);
criterion_main!(benches);
