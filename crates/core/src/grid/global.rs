//! Global snapshot stitched from every region
//!
//! Only the coordinator builds one of these, once per step, and drops it
//! after the frame sink has seen it.

use super::region::Region;
use crate::core_types::{Cell, Field, OwnerId};
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Cell counts by category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FireStats {
    pub trees: usize,
    pub fires: usize,
    pub burned: usize,
    pub ash: usize,
    pub empty: usize,
    pub water: usize,
    pub total: usize,
}

impl FireStats {
    pub fn from_cells(cells: &[Cell]) -> Self {
        let mut stats = Self {
            total: cells.len(),
            ..Self::default()
        };
        for cell in cells {
            match cell {
                Cell::Tree(_) => stats.trees += 1,
                Cell::Fire(_) | Cell::OwnedFire(_) => stats.fires += 1,
                Cell::Burned => stats.burned += 1,
                Cell::Ash => stats.ash += 1,
                Cell::Empty => stats.empty += 1,
                Cell::Water => stats.water += 1,
            }
        }
        stats
    }
}

/// Full-grid snapshot for one step
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalGrid {
    /// Step the snapshot belongs to
    pub step: u64,
    pub cells: Field<Cell>,
    pub owners: Field<OwnerId>,
    /// Region owner that supplied each cell
    pub sources: Field<OwnerId>,
}

impl GlobalGrid {
    /// Stitch regions into a `rows x cols` grid
    ///
    /// Reports may come in any order; only their bounds matter. Every cell
    /// must be written exactly once.
    ///
    /// # Errors
    ///
    /// [`SimError::Assembly`] on a malformed region, a region outside the
    /// grid, an overlap, or a cell no region covers
    pub fn assemble<'a>(
        rows: usize,
        cols: usize,
        regions: impl IntoIterator<Item = &'a Region>,
    ) -> SimResult<Self> {
        let mut cells: Field<Option<Cell>> = Field::with_value(rows, cols, None);
        let mut owners = Field::with_value(rows, cols, 0);
        let mut sources = Field::with_value(rows, cols, 0);

        for region in regions {
            region
                .validate()
                .map_err(|e| SimError::Assembly(e.to_string()))?;
            let b = region.bounds;
            if b.row_end > rows || b.col_end > cols {
                return Err(SimError::Assembly(format!(
                    "region of worker {} ({:?}) lies outside the {}x{} grid",
                    region.owner_id, b, rows, cols
                )));
            }
            for r in 0..b.rows() {
                let (gr, gc0) = region.to_global(r, 0);
                for c in 0..b.cols() {
                    let gc = gc0 + c;
                    if cells.get(gr, gc).is_some() {
                        return Err(SimError::Assembly(format!(
                            "cell ({gr}, {gc}) reported twice (second time by worker {})",
                            region.owner_id
                        )));
                    }
                    cells.set(gr, gc, Some(region.cells.get(r, c)));
                    owners.set(gr, gc, region.owners.get(r, c));
                    sources.set(gr, gc, region.owner_id);
                }
            }
        }

        let data = cells
            .data
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                cell.ok_or_else(|| {
                    SimError::Assembly(format!(
                        "cell ({}, {}) missing from every region",
                        idx / cols.max(1),
                        idx % cols.max(1)
                    ))
                })
            })
            .collect::<SimResult<Vec<Cell>>>()?;

        Ok(Self {
            step: 0,
            cells: Field { data, rows, cols },
            owners,
            sources,
        })
    }

    /// Tag the snapshot with its step
    #[must_use]
    pub fn at_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    pub fn rows(&self) -> usize {
        self.cells.rows
    }

    pub fn cols(&self) -> usize {
        self.cells.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells.get(row, col)
    }

    /// `(state code, intensity level or owner id)` for the renderer
    ///
    /// Non-fire cells carry the owner of their region so the renderer can
    /// outline ownership.
    pub fn render_pair(&self, row: usize, col: usize) -> (u8, u16) {
        let cell = self.cells.get(row, col);
        match cell {
            Cell::Fire(_) | Cell::OwnedFire(_) => (cell.code(), cell.tag()),
            _ => (cell.code(), self.owners.get(row, col)),
        }
    }

    pub fn stats(&self) -> FireStats {
        FireStats::from_cells(self.cells.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{FireIntensity, FuelAge};
    use crate::grid::partition::RegionBounds;

    fn strip(owner: OwnerId, rows: std::ops::Range<usize>, cell: Cell) -> Region {
        Region::uniform(
            RegionBounds::new(rows.start, rows.end, 0, 4),
            owner,
            cell,
            0.0,
            0.5,
            25.0,
        )
    }

    #[test]
    fn test_assemble_in_any_order() {
        let top = strip(0, 0..2, Cell::Water);
        let bottom = strip(1, 2..5, Cell::Tree(FuelAge::Young));
        let grid = GlobalGrid::assemble(5, 4, [&bottom, &top]).unwrap().at_step(3);
        assert_eq!(grid.step, 3);

        assert_eq!(grid.cell(1, 3), Cell::Water);
        assert_eq!(grid.cell(4, 0), Cell::Tree(FuelAge::Young));
        assert_eq!(grid.sources.get(0, 0), 0);
        assert_eq!(grid.sources.get(2, 0), 1);
        assert_eq!(grid.stats().water, 8);
        assert_eq!(grid.stats().trees, 12);
        assert_eq!(grid.stats().total, 20);
    }

    #[test]
    fn test_assemble_rejects_missing_region() {
        let top = strip(0, 0..2, Cell::Water);
        let err = GlobalGrid::assemble(5, 4, [&top]).unwrap_err();
        assert!(matches!(err, SimError::Assembly(_)));
    }

    #[test]
    fn test_assemble_rejects_overlap() {
        let a = strip(0, 0..3, Cell::Water);
        let b = strip(1, 2..5, Cell::Water);
        assert!(GlobalGrid::assemble(5, 4, [&a, &b]).is_err());
    }

    #[test]
    fn test_render_pair() {
        let mut region = strip(2, 0..2, Cell::Tree(FuelAge::Old));
        region.set_cell(0, 1, Cell::Fire(FireIntensity::High));
        region.set_cell(1, 1, Cell::OwnedFire(2));
        let grid = GlobalGrid::assemble(2, 4, [&region]).unwrap();

        assert_eq!(grid.render_pair(0, 0), (Cell::TREE_OLD, 2));
        assert_eq!(grid.render_pair(0, 1), (Cell::FIRE_HIGH, 2));
        assert_eq!(grid.render_pair(1, 1), (Cell::FIRE_LOW, 2));
    }

    #[test]
    fn test_stats_counts_both_fire_models() {
        let cells = [
            Cell::Fire(FireIntensity::Low),
            Cell::OwnedFire(1),
            Cell::Burned,
            Cell::Ash,
            Cell::Empty,
        ];
        let stats = FireStats::from_cells(&cells);
        assert_eq!(stats.fires, 2);
        assert_eq!(stats.burned, 1);
        assert_eq!(stats.ash, 1);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.total, 5);
    }
}
