//! Minimum temperature of uniform positivity.
//!
//! For every density row the scan records the first temperature index where
//! the quantity is strictly positive. Rows that never turn positive are
//! clamped to the last temperature index. The reported threshold is the
//! maximum over rows, so the worst row dominates: at that temperature every
//! row has already reached a positive value at or below it.
//!
//! The clamp means a single never-positive row pins the threshold to the top
//! of the temperature axis. `clamped_rows` exposes how many rows did so, since
//! such a threshold reflects data quality rather than a physical transition.

use crate::domain::ValueGrid;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdScan {
    /// Index into the valid temperature axis.
    pub index: usize,
    pub temperature: f64,
    /// First row whose first-positive index equals `index`.
    pub dominant_row: usize,
    pub clamped_rows: usize,
    pub row_count: usize,
    pub column_count: usize,
}

impl ThresholdScan {
    /// True when the threshold sits on the last temperature because some row
    /// never turned positive.
    pub fn is_clamp_dominated(&self) -> bool {
        self.clamped_rows > 0 && self.index + 1 == self.column_count
    }
}

/// First strictly positive column per row, clamped to the last column.
pub fn first_positive_indices(grid: &ValueGrid) -> Vec<usize> {
    let last = grid.cols().saturating_sub(1);
    grid.row_iter()
        .map(|row| row.iter().position(|value| *value > 0.0).unwrap_or(last))
        .collect()
}

/// Scans `grid` (rows = valid densities, columns = valid temperatures).
///
/// Returns `None` when there are no rows or no temperatures.
pub fn scan_min_positive_temperature(
    temperatures: &[f64],
    grid: &ValueGrid,
) -> Option<ThresholdScan> {
    if temperatures.is_empty() || grid.rows() == 0 || grid.cols() == 0 {
        return None;
    }

    let indices = first_positive_indices(grid);
    let mut clamped_rows = 0;
    for row in grid.row_iter() {
        if !row.iter().any(|value| *value > 0.0) {
            clamped_rows += 1;
        }
    }

    let (dominant_row, index) = indices.iter().copied().enumerate().fold(
        (0, 0),
        |(best_row, best_index), (row, index)| {
            if index > best_index {
                (row, index)
            } else {
                (best_row, best_index)
            }
        },
    );

    let temperature = *temperatures.get(index)?;
    Some(ThresholdScan {
        index,
        temperature,
        dominant_row,
        clamped_rows,
        row_count: grid.rows(),
        column_count: grid.cols(),
    })
}
