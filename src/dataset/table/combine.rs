use ndarray::{ArrayView2, Axis};

use super::FeatureTable;
use crate::dataset::error::DatasetError;
use crate::dataset::segment::canonical_segment_name;

impl FeatureTable {
    /// Rewrite row segment ids to their canonical recording names.
    pub fn normalize_segment_names(&mut self) {
        self.rename_segments(canonical_segment_name);
    }
}

/// Join feature tables that describe the same rows, column by column.
///
/// Segment names are canonicalized and every table is sorted by segment
/// before joining, so tables produced from different feature files of the
/// same recordings line up. Labels come from the first table.
pub fn combine_features(tables: Vec<FeatureTable>) -> Result<FeatureTable, DatasetError> {
    let mut tables = tables;
    if tables.is_empty() {
        return Err(DatasetError::InvalidArgument(
            "no feature tables to combine".to_string(),
        ));
    }
    for table in &mut tables {
        table.normalize_segment_names();
        table.sort_by_segment();
    }

    let first = &tables[0];
    for (idx, table) in tables.iter().enumerate().skip(1) {
        if table.rows != first.rows {
            return Err(DatasetError::ColumnMismatch(format!(
                "feature table {idx} covers {} rows that differ from the first table ({} rows)",
                table.len(),
                first.len()
            )));
        }
    }

    let columns = tables
        .iter()
        .flat_map(|table| table.columns.iter().cloned())
        .collect();
    let views: Vec<ArrayView2<'_, f64>> = tables.iter().map(|table| table.values.view()).collect();
    let values = ndarray::concatenate(Axis(1), &views)
        .map_err(|err| DatasetError::ColumnMismatch(err.to_string()))?;

    let first = tables.swap_remove(0);
    let mut combined = FeatureTable::new(first.rows, columns, values, first.labels)?;
    combined.sort_by_segment();
    Ok(combined)
}
