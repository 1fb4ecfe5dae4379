//! Region partitioning
//!
//! Splits a `rows x cols` grid into one rectangle per worker. Up to four
//! workers get horizontal strips; more get a near-square block layout.
//! Whatever the worker count, the rectangles tile the grid exactly.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Half-open rectangle `[row_start, row_end) x [col_start, col_end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionBounds {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl RegionBounds {
    pub const fn new(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> Self {
        Self {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    /// Region covering a whole `rows x cols` grid
    pub const fn full(rows: usize, cols: usize) -> Self {
        Self::new(0, rows, 0, cols)
    }

    pub fn rows(&self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    pub fn cols(&self) -> usize {
        self.col_end.saturating_sub(self.col_start)
    }

    pub fn area(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Whether the global cell `(row, col)` lies inside
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row_start..self.row_end).contains(&row) && (self.col_start..self.col_end).contains(&col)
    }
}

/// Near-square layout used above four workers: `(grid_rows, grid_cols)`
fn block_layout(worker_count: usize) -> (usize, usize) {
    let mut grid_rows = (worker_count as f64).sqrt() as usize;
    while grid_rows * grid_rows > worker_count {
        grid_rows -= 1;
    }
    while (grid_rows + 1) * (grid_rows + 1) <= worker_count {
        grid_rows += 1;
    }
    let grid_rows = grid_rows.max(1);
    let grid_cols = worker_count.div_ceil(grid_rows);
    (grid_rows, grid_cols)
}

/// Bounds of worker `worker_index` out of `worker_count`
///
/// - 1 worker: the whole grid
/// - 2..=4 workers: horizontal strips, the last absorbing the remainder
/// - more: `floor(sqrt(n))` block rows of `ceil(n / rows)` blocks; a short
///   last block row splits the columns among the workers it actually holds
///
/// # Errors
///
/// [`SimError::InvalidWorkerCount`] for zero workers,
/// [`SimError::InvalidWorkerIndex`] for an index outside `[0, worker_count)`
pub fn partition(
    total_rows: usize,
    total_cols: usize,
    worker_count: usize,
    worker_index: usize,
) -> SimResult<RegionBounds> {
    if worker_count == 0 {
        return Err(SimError::InvalidWorkerCount {
            count: worker_count,
            max: crate::config::MAX_WORKERS,
        });
    }
    if worker_index >= worker_count {
        return Err(SimError::InvalidWorkerIndex {
            index: worker_index,
            count: worker_count,
        });
    }

    if worker_count == 1 {
        return Ok(RegionBounds::full(total_rows, total_cols));
    }

    if worker_count <= 4 {
        let strip = total_rows / worker_count;
        let row_start = worker_index * strip;
        let row_end = if worker_index == worker_count - 1 {
            total_rows
        } else {
            row_start + strip
        };
        return Ok(RegionBounds::new(row_start, row_end, 0, total_cols));
    }

    let (grid_rows, grid_cols) = block_layout(worker_count);
    let block_row = worker_index / grid_cols;
    let block_col = worker_index % grid_cols;

    // The last block row may be short; it divides the columns among its own workers.
    let cols_in_row = if block_row == grid_rows - 1 {
        worker_count - block_row * grid_cols
    } else {
        grid_cols
    };

    let rows_per_block = total_rows / grid_rows;
    let cols_per_block = total_cols / cols_in_row;

    let row_start = block_row * rows_per_block;
    let row_end = if block_row == grid_rows - 1 {
        total_rows
    } else {
        row_start + rows_per_block
    };
    let col_start = block_col * cols_per_block;
    let col_end = if block_col == cols_in_row - 1 {
        total_cols
    } else {
        col_start + cols_per_block
    };

    Ok(RegionBounds::new(row_start, row_end, col_start, col_end))
}

/// Bounds of every worker, indexed by worker id
///
/// # Errors
///
/// [`SimError::InvalidWorkerCount`] for zero workers
pub fn partition_all(
    total_rows: usize,
    total_cols: usize,
    worker_count: usize,
) -> SimResult<Vec<RegionBounds>> {
    (0..worker_count.max(1))
        .map(|index| partition(total_rows, total_cols, worker_count, index))
        .collect()
}

/// Check that `regions` cover the grid exactly once
///
/// # Errors
///
/// [`SimError::PartitionOverlap`] for the first doubly covered cell, else
/// [`SimError::PartitionGap`] for the first uncovered one
pub fn verify_coverage(
    total_rows: usize,
    total_cols: usize,
    regions: &[RegionBounds],
) -> SimResult<()> {
    let mut hits = vec![0_u16; total_rows * total_cols];
    for bounds in regions {
        if bounds.row_end > total_rows || bounds.col_end > total_cols {
            return Err(SimError::invalid_config(
                "partition",
                format!("region {bounds:?} extends past the {total_rows}x{total_cols} grid"),
            ));
        }
        for row in bounds.row_start..bounds.row_end {
            for col in bounds.col_start..bounds.col_end {
                let hit = &mut hits[row * total_cols + col];
                if *hit > 0 {
                    return Err(SimError::PartitionOverlap { row, col });
                }
                *hit += 1;
            }
        }
    }
    match hits.iter().position(|&h| h == 0) {
        Some(idx) => Err(SimError::PartitionGap {
            row: idx / total_cols,
            col: idx % total_cols,
        }),
        None => Ok(()),
    }
}
