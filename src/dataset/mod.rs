//! Segment-aware dataset assembly and cross-validation.
//!
//! Data flows from per-segment feature files ([`loader`]) into labeled class
//! tables, which are merged and balanced ([`merge`]), partitioned into folds
//! that never split a recording ([`cross_validation`]) and finally cut into
//! a train/test pair ([`split`]).

pub mod cross_validation;
pub mod error;
pub mod frames;
pub mod loader;
pub mod merge;
pub mod segment;
pub mod split;
pub mod table;

pub use cross_validation::{Fold, FoldGenerator, RowCrossValidator, SegmentCrossValidator, StratifiedKFold};
pub use error::DatasetError;
pub use frames::{FrameLayout, FrameMode};
pub use loader::{
    CsvWindowLoader, DataFrames, LoaderOptions, SegmentLoader, WindowLoader, load_data_frames,
    load_feature_files,
};
pub use merge::{MergeOptions, merge_interictal_preictal};
pub use segment::{FileGroup, SegmentDescriptor, canonical_segment_name, find_grouped_feature_files};
pub use split::{SplitOptions, folds_for_training_ratio, split_dataset, split_experiment_data};
pub use table::{Class, ColumnKey, FeatureTable, FrameTable, RowKey, WindowTable};
