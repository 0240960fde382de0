//! Loading per-segment feature files into class tables.
//!
//! A [`SegmentLoader`] turns the file group of one segment into frames. The
//! class loader runs it over every segment (optionally on a worker pool),
//! stacks the frames keyed by `(segment_id, frame_index)`, repairs
//! non-finite values and caches the result on disk.

mod cache;
mod delimited;
mod pool;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::DatasetError;
use super::frames::{FrameLayout, build_frames};
use super::segment::{FileGroup, SegmentDescriptor, find_grouped_feature_files};
use super::table::{Class, FeatureTable, FrameTable, WindowTable};

pub use self::cache::{cache_file_name, cache_path, read_table, write_table};
pub use self::delimited::CsvWindowLoader;

/// Class name used for the unlabeled hold-out recordings.
pub const TEST_CLASS_NAME: &str = "test";

/// Produces the window-level features of one segment.
pub trait WindowLoader {
    fn load_windows(&self, group: &FileGroup) -> Result<WindowTable, DatasetError>;
}

impl<F> WindowLoader for F
where
    F: Fn(&FileGroup) -> Result<WindowTable, DatasetError>,
{
    fn load_windows(&self, group: &FileGroup) -> Result<WindowTable, DatasetError> {
        self(group)
    }
}

/// Produces the frames of one segment for a given layout.
///
/// Every [`WindowLoader`] is a segment loader that applies
/// [`build_frames`] to its windows.
pub trait SegmentLoader {
    fn load(&self, group: &FileGroup, layout: FrameLayout) -> Result<FrameTable, DatasetError>;
}

impl<W: WindowLoader> SegmentLoader for W {
    fn load(&self, group: &FileGroup, layout: FrameLayout) -> Result<FrameTable, DatasetError> {
        build_frames(&self.load_windows(group)?, layout)
    }
}

/// Options for loading one class of feature files.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOptions {
    pub layout: FrameLayout,
    /// Worker threads for segment loading; `1` loads serially.
    pub workers: usize,
    /// Ignore existing cache files and rebuild them.
    pub rebuild: bool,
    /// Directory holding cache files. Defaults to the feature folder.
    pub cache_dir: Option<PathBuf>,
    /// Only files ending with this suffix are treated as feature files.
    pub file_suffix: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            layout: FrameLayout::fixed(12),
            workers: 1,
            rebuild: false,
            cache_dir: None,
            file_suffix: ".csv".to_string(),
        }
    }
}

/// Labeled training classes plus the unlabeled test recordings.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrames {
    pub interictal: FeatureTable,
    pub preictal: FeatureTable,
    pub test: FeatureTable,
}

/// Load every segment in `descriptors` and stack the frames in descriptor order.
///
/// Non-finite values are repaired by interpolation and reported as a warning.
pub fn load_segment_table<L>(
    descriptors: &[SegmentDescriptor],
    loader: &L,
    layout: FrameLayout,
    workers: usize,
) -> Result<FeatureTable, DatasetError>
where
    L: SegmentLoader + Sync,
{
    layout.validate()?;
    let workers = pool::worker_count(workers, descriptors.len());
    if workers > 1 {
        info!("Loading {} segments on {workers} workers", descriptors.len());
    } else {
        info!("Loading {} segments serially", descriptors.len());
    }
    let frames = pool::run_ordered(descriptors.iter().collect::<Vec<_>>(), workers, |descriptor| {
        loader.load(&descriptor.file_group, layout)
    })?;
    let segments = descriptors
        .iter()
        .map(|descriptor| descriptor.segment_id.clone())
        .zip(frames)
        .collect();
    let mut table = FeatureTable::from_segment_frames(segments)?;

    let non_finite = table.non_finite_count();
    if non_finite > 0 {
        let repaired = table.interpolate_non_finite();
        warn!(
            "Feature table has {non_finite} non-finite values; interpolated {repaired} of them"
        );
    }
    Ok(table)
}

/// Load a class table through the cache at `cache_file`.
///
/// An existing cache file is used unless `rebuild` is set. Cached tables are
/// re-sorted by segment id; rebuilt tables are sorted the same way before
/// being written.
pub fn load_cached_table(
    cache_file: &Path,
    rebuild: bool,
    build: impl FnOnce() -> Result<FeatureTable, DatasetError>,
) -> Result<FeatureTable, DatasetError> {
    if !rebuild && cache_file.is_file() {
        info!("Loading cached features from {}", cache_file.display());
        let mut table = read_table(cache_file)?;
        table.sort_by_segment();
        return Ok(table);
    }
    info!("Rebuilding features into {}", cache_file.display());
    let mut table = build()?;
    table.sort_by_segment();
    write_table(cache_file, &table)?;
    Ok(table)
}

/// Discover, load and cache the feature files of `class_name` under `folder`.
pub fn load_feature_files<L>(
    folder: &Path,
    class_name: &str,
    loader: &L,
    options: &LoaderOptions,
) -> Result<FeatureTable, DatasetError>
where
    L: SegmentLoader + Sync,
{
    let cache_dir = options.cache_dir.as_deref().unwrap_or(folder);
    let cache_file = cache_path(cache_dir, class_name, options.layout);
    load_cached_table(&cache_file, options.rebuild, || {
        let descriptors = find_grouped_feature_files(folder, class_name, &options.file_suffix)?;
        if descriptors.is_empty() {
            return Err(DatasetError::InvalidArgument(format!(
                "no {class_name} feature files ending with {:?} under {}",
                options.file_suffix,
                folder.display()
            )));
        }
        info!(
            "Building {class_name} table from {} segments (frame length {}, sliding {})",
            descriptors.len(),
            options.layout.frame_length,
            options.layout.is_sliding()
        );
        load_segment_table(&descriptors, loader, options.layout, options.workers)
    })
}

/// Load the interictal, preictal and test tables under `folder`.
///
/// Interictal rows are labeled `0`, preictal rows `1`, test rows stay
/// unlabeled. Test recordings always use fixed frames so that the number of
/// test rows is not inflated by overlapping frames.
pub fn load_data_frames<L>(
    folder: &Path,
    loader: &L,
    options: &LoaderOptions,
) -> Result<DataFrames, DatasetError>
where
    L: SegmentLoader + Sync,
{
    let interictal = load_feature_files(folder, Class::Interictal.name(), loader, options)?
        .with_class(Class::Interictal);
    let preictal = load_feature_files(folder, Class::Preictal.name(), loader, options)?
        .with_class(Class::Preictal);
    let test_options = LoaderOptions {
        layout: FrameLayout::fixed(options.layout.frame_length),
        ..options.clone()
    };
    let test = load_feature_files(folder, TEST_CLASS_NAME, loader, &test_options)?.unlabeled();
    Ok(DataFrames {
        interictal,
        preictal,
        test,
    })
}
