use std::path::Path;

use csv::ReaderBuilder;
use ndarray::{Array2, ArrayView2, Axis};

use super::WindowLoader;
use crate::dataset::error::DatasetError;
use crate::dataset::segment::FileGroup;
use crate::dataset::table::WindowTable;

/// Reads window features from delimited text files with one header row.
///
/// Each row of a file is one window. The files of a group contribute
/// columns side by side and must agree on the number of windows. Empty
/// cells and `NaN` read as non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvWindowLoader {
    pub delimiter: u8,
}

impl Default for CsvWindowLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvWindowLoader {
    pub fn new(delimiter: char) -> Result<Self, DatasetError> {
        let delimiter = u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                DatasetError::InvalidArgument(format!("delimiter {delimiter:?} is not ASCII"))
            })?;
        Ok(Self { delimiter })
    }

    fn read_file(&self, path: &Path) -> Result<WindowTable, DatasetError> {
        let csv_err = |source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(path)
            .map_err(csv_err)?;
        let features: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();

        let mut flat = Vec::new();
        let mut n_windows = 0usize;
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            for (col, cell) in record.iter().enumerate() {
                flat.push(parse_cell(cell).ok_or_else(|| {
                    DatasetError::InvalidArgument(format!(
                        "{}: window {n_windows} column {col}: {cell:?} is not a number",
                        path.display()
                    ))
                })?);
            }
            n_windows += 1;
        }
        let values = Array2::from_shape_vec((n_windows, features.len()), flat)
            .map_err(|err| DatasetError::ColumnMismatch(format!("{}: {err}", path.display())))?;
        WindowTable::new(features, values)
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("na") {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

impl WindowLoader for CsvWindowLoader {
    fn load_windows(&self, group: &FileGroup) -> Result<WindowTable, DatasetError> {
        let tables = group
            .files
            .iter()
            .map(|path| self.read_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = tables.first() else {
            return Err(DatasetError::InvalidArgument(
                "file group has no files".to_string(),
            ));
        };
        if let Some((idx, table)) = tables
            .iter()
            .enumerate()
            .find(|(_, table)| table.n_windows() != first.n_windows())
        {
            return Err(DatasetError::ColumnMismatch(format!(
                "{} has {} windows, {} has {}",
                group.files[idx].display(),
                table.n_windows(),
                group.files[0].display(),
                first.n_windows()
            )));
        }
        let features = tables
            .iter()
            .flat_map(|table| table.features.iter().cloned())
            .collect();
        let views: Vec<ArrayView2<'_, f64>> = tables.iter().map(|table| table.values.view()).collect();
        let values = ndarray::concatenate(Axis(1), &views)
            .map_err(|err| DatasetError::ColumnMismatch(err.to_string()))?;
        WindowTable::new(features, values)
    }
}
