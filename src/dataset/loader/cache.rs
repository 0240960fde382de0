//! On-disk cache of assembled class tables.
//!
//! Blob layout: `[u64 LE header length][JSON header][f64 LE values]`. The
//! header carries row and column keys, optional labels, the matrix shape and
//! a blake3 checksum of the value payload. Files are written once and
//! replaced whole.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::dataset::error::DatasetError;
use crate::dataset::frames::FrameLayout;
use crate::dataset::table::{Class, ColumnKey, FeatureTable, RowKey};

const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheHeader {
    format_version: u32,
    n_rows: usize,
    n_columns: usize,
    rows: Vec<RowKey>,
    columns: Vec<ColumnKey>,
    labels: Option<Vec<Class>>,
    checksum: String,
}

/// Deterministic cache file name for a class table built with `layout`.
pub fn cache_file_name(class_name: &str, layout: FrameLayout) -> String {
    format!(
        "cache_{class_name}_frame_length_{}_sliding_frames_{}.bin",
        layout.frame_length,
        layout.is_sliding()
    )
}

pub fn cache_path(dir: &Path, class_name: &str, layout: FrameLayout) -> PathBuf {
    dir.join(cache_file_name(class_name, layout))
}

/// Persist `table` at `path`, replacing any previous cache file.
pub fn write_table(path: &Path, table: &FeatureTable) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| DatasetError::io(parent, err))?;
    }
    let payload = encode_values(table.values());
    let header = CacheHeader {
        format_version: CACHE_FORMAT_VERSION,
        n_rows: table.len(),
        n_columns: table.n_columns(),
        rows: table.rows().to_vec(),
        columns: table.columns().to_vec(),
        labels: table.labels().map(<[Class]>::to_vec),
        checksum: blake3::hash(&payload).to_hex().to_string(),
    };
    let header = serde_json::to_vec(&header)?;

    let tmp = path.with_extension("bin.partial");
    let file = File::create(&tmp).map_err(|err| DatasetError::io(&tmp, err))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&(header.len() as u64).to_le_bytes())
        .and_then(|_| writer.write_all(&header))
        .and_then(|_| writer.write_all(&payload))
        .and_then(|_| writer.flush())
        .map_err(|err| DatasetError::io(&tmp, err))?;
    drop(writer);
    fs::rename(&tmp, path).map_err(|err| DatasetError::io(path, err))
}

/// Load a table written by [`write_table`].
pub fn read_table(path: &Path) -> Result<FeatureTable, DatasetError> {
    let file = File::open(path).map_err(|err| DatasetError::io(path, err))?;
    let mut reader = BufReader::new(file);
    let corrupt = |reason: String| DatasetError::CacheFormat {
        path: path.to_path_buf(),
        reason,
    };

    let mut len_bytes = [0u8; 8];
    reader
        .read_exact(&mut len_bytes)
        .map_err(|err| corrupt(format!("missing header length: {err}")))?;
    let header_len = usize::try_from(u64::from_le_bytes(len_bytes))
        .map_err(|_| corrupt("header length overflows".to_string()))?;
    let mut header_bytes = Vec::new();
    reader
        .by_ref()
        .take(header_len as u64)
        .read_to_end(&mut header_bytes)
        .map_err(|err| DatasetError::io(path, err))?;
    if header_bytes.len() != header_len {
        return Err(corrupt("truncated header".to_string()));
    }
    let header: CacheHeader = serde_json::from_slice(&header_bytes)
        .map_err(|err| corrupt(format!("invalid header: {err}")))?;
    if header.format_version != CACHE_FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {}",
            header.format_version
        )));
    }

    let mut payload = Vec::new();
    reader
        .read_to_end(&mut payload)
        .map_err(|err| DatasetError::io(path, err))?;
    let expected = header
        .n_rows
        .checked_mul(header.n_columns)
        .and_then(|cells| cells.checked_mul(8))
        .ok_or_else(|| corrupt("matrix shape overflows".to_string()))?;
    if payload.len() != expected {
        return Err(corrupt(format!(
            "payload is {} bytes, expected {expected}",
            payload.len()
        )));
    }
    if blake3::hash(&payload).to_hex().as_str() != header.checksum {
        return Err(corrupt("checksum mismatch".to_string()));
    }

    let values = payload
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();
    let values = Array2::from_shape_vec((header.n_rows, header.n_columns), values)
        .map_err(|err| corrupt(err.to_string()))?;
    FeatureTable::new(header.rows, header.columns, values, header.labels)
        .map_err(|err| corrupt(err.to_string()))
}

fn encode_values(values: &Array2<f64>) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}
