//! Canonical segment identifiers and feature file discovery.
//!
//! A segment is one continuous recording. Its features may be spread over
//! several files (one per feature family, one per channel pair, ...), all of
//! which share the recording's base name as a prefix. Grouping those files
//! by the canonical name gives one [`SegmentDescriptor`] per recording.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::error::DatasetError;

/// Extension appended to canonical names, matching the raw recording files.
pub const SEGMENT_EXTENSION: &str = ".mat";

fn segment_name_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^([DP][a-z]*_[1-5]_[a-z]*_segment_[0-9]{4})")
            .expect("segment name regex must compile")
    })
}

fn subject_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(Patient_[12]|Dog_[1-5])").expect("subject regex must compile"))
}

/// Canonical segment name for a file name or path.
///
/// Directories are ignored and the recording prefix (for example
/// `Dog_1_preictal_segment_0001`) is kept with a `.mat` extension, so every
/// fragment of one recording maps to the same identifier. Names that do not
/// look like a recording are returned unchanged.
pub fn canonical_segment_name(name: &str) -> String {
    let basename = Path::new(name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(name);
    match segment_name_regex().captures(basename) {
        Some(captures) => format!("{}{SEGMENT_EXTENSION}", &captures[1]),
        None => name.to_string(),
    }
}

/// Subject (`Dog_1` .. `Dog_5`, `Patient_1`, `Patient_2`) mentioned in `name`.
pub fn subject_of(name: &str) -> Option<&str> {
    subject_regex()
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Ordered set of files that together hold the features of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileGroup {
    pub files: Vec<PathBuf>,
}

impl FileGroup {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            files: vec![path.into()],
        }
    }
}

/// One segment to load: its canonical id and the files composing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub segment_id: String,
    pub file_group: FileGroup,
}

/// Discover feature files of `class_name` under `folder`, grouped by segment.
///
/// A file belongs to the class when its name contains `class_name` and ends
/// with `suffix`. Groups are sorted by segment id and files inside a group
/// by path, which keeps the column order of multi-file segments stable.
pub fn find_grouped_feature_files(
    folder: &Path,
    class_name: &str,
    suffix: &str,
) -> Result<Vec<SegmentDescriptor>, DatasetError> {
    let mut files = Vec::new();
    collect_files_recursive(folder, &mut files)?;

    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.contains(class_name) || !name.ends_with(suffix) {
            continue;
        }
        groups
            .entry(canonical_segment_name(name))
            .or_default()
            .push(path);
    }
    debug!(
        "Found {} {class_name} segments under {}",
        groups.len(),
        folder.display()
    );

    Ok(groups
        .into_iter()
        .map(|(segment_id, mut files)| {
            files.sort();
            SegmentDescriptor {
                segment_id,
                file_group: FileGroup::new(files),
            }
        })
        .collect())
}

fn collect_files_recursive(root: &Path, out: &mut Vec<PathBuf>) -> Result<(), DatasetError> {
    let entries = fs::read_dir(root).map_err(|err| DatasetError::io(root, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| DatasetError::io(root, err))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
