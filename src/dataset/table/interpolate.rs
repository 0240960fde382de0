use ndarray::ArrayViewMut1;

use super::FeatureTable;

impl FeatureTable {
    /// Replace non-finite cells by linear interpolation down each column.
    ///
    /// Gaps between two finite cells are interpolated by row position. Cells
    /// after the last finite cell take that value. Leading cells are
    /// backfilled from the first finite cell as well, unlike a forward-only
    /// linear fill that leaves them missing, so every column with a finite
    /// cell comes out fully finite. Columns without any finite cell are left
    /// unchanged. Returns the number of repaired cells.
    pub fn interpolate_non_finite(&mut self) -> usize {
        self.values
            .columns_mut()
            .into_iter()
            .map(interpolate_column)
            .sum()
    }
}

fn interpolate_column(mut column: ArrayViewMut1<'_, f64>) -> usize {
    let finite: Vec<usize> = column
        .iter()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .map(|(idx, _)| idx)
        .collect();
    let (Some(&first), Some(&last)) = (finite.first(), finite.last()) else {
        return 0;
    };
    if finite.len() == column.len() {
        return 0;
    }

    let (head, tail) = (column[first], column[last]);
    let mut repaired = 0;
    for idx in (0..first).chain(last + 1..column.len()) {
        column[idx] = if idx < first { head } else { tail };
        repaired += 1;
    }
    for pair in finite.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let (lo_value, hi_value) = (column[lo], column[hi]);
        let span = (hi - lo) as f64;
        for idx in lo + 1..hi {
            let t = (idx - lo) as f64 / span;
            column[idx] = lo_value + (hi_value - lo_value) * t;
            repaired += 1;
        }
    }
    repaired
}
