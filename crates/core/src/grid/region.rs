//! A worker's exclusively owned rectangle of the landscape

use super::partition::RegionBounds;
use crate::core_types::{Cell, Field, OwnerId};
use crate::error::{SimError, SimResult};
use std::sync::Arc;

/// Static per-cell conditions; generated once, never mutated
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainFields {
    /// 0-100
    pub elevation: Field<f32>,
    /// 0.0-1.0
    pub humidity: Field<f32>,
    /// Degrees Celsius
    pub temperature: Field<f32>,
}

impl TerrainFields {
    /// Same conditions everywhere
    pub fn uniform(rows: usize, cols: usize, elevation: f32, humidity: f32, temperature: f32) -> Self {
        Self {
            elevation: Field::with_value(rows, cols, elevation),
            humidity: Field::with_value(rows, cols, humidity),
            temperature: Field::with_value(rows, cols, temperature),
        }
    }
}

/// Region state owned by one worker
///
/// `cells` and `owners` change every step; `terrain` is shared between
/// successive snapshots so handing a region to the coordinator only copies
/// the mutable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub bounds: RegionBounds,
    /// Worker that owns this region
    pub owner_id: OwnerId,
    pub cells: Field<Cell>,
    /// Owner tag carried alongside each cell's state
    pub owners: Field<OwnerId>,
    pub terrain: Arc<TerrainFields>,
}

impl Region {
    /// Build a region, checking every field against `bounds`
    ///
    /// # Errors
    ///
    /// [`SimError::MalformedRegion`] if any field has the wrong shape
    pub fn new(
        bounds: RegionBounds,
        owner_id: OwnerId,
        cells: Field<Cell>,
        terrain: TerrainFields,
    ) -> SimResult<Self> {
        let owners = Field::with_value(cells.rows, cells.cols, owner_id);
        let region = Self {
            bounds,
            owner_id,
            cells,
            owners,
            terrain: Arc::new(terrain),
        };
        region.validate()?;
        Ok(region)
    }

    /// Region filled with one cell state under uniform conditions
    pub fn uniform(
        bounds: RegionBounds,
        owner_id: OwnerId,
        cell: Cell,
        elevation: f32,
        humidity: f32,
        temperature: f32,
    ) -> Self {
        let (rows, cols) = (bounds.rows(), bounds.cols());
        Self {
            bounds,
            owner_id,
            cells: Field::with_value(rows, cols, cell),
            owners: Field::with_value(rows, cols, owner_id),
            terrain: Arc::new(TerrainFields::uniform(
                rows,
                cols,
                elevation,
                humidity,
                temperature,
            )),
        }
    }

    /// Check that every field matches the bounds
    ///
    /// # Errors
    ///
    /// [`SimError::MalformedRegion`] naming the first offending field
    pub fn validate(&self) -> SimResult<()> {
        let expected = (self.bounds.rows(), self.bounds.cols());
        let shapes = [
            ("cells", self.cells.shape(), self.cells.is_consistent()),
            ("owners", self.owners.shape(), self.owners.is_consistent()),
            (
                "elevation",
                self.terrain.elevation.shape(),
                self.terrain.elevation.is_consistent(),
            ),
            (
                "humidity",
                self.terrain.humidity.shape(),
                self.terrain.humidity.is_consistent(),
            ),
            (
                "temperature",
                self.terrain.temperature.shape(),
                self.terrain.temperature.is_consistent(),
            ),
        ];
        for (name, shape, consistent) in shapes {
            if shape != expected || !consistent {
                return Err(SimError::MalformedRegion {
                    worker: self.owner_id,
                    reason: format!(
                        "{name} field is {}x{} (consistent: {consistent}), bounds need {}x{}",
                        shape.0, shape.1, expected.0, expected.1
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.cells.rows
    }

    pub fn cols(&self) -> usize {
        self.cells.cols
    }

    /// Cell at local coordinates
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells.get(row, col)
    }

    /// Overwrite a cell; the owner tag follows owned fire
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells.set(row, col, cell);
        if let Cell::OwnedFire(owner) = cell {
            self.owners.set(row, col, owner);
        }
    }

    pub fn elevation(&self, row: usize, col: usize) -> f32 {
        self.terrain.elevation.get(row, col)
    }

    pub fn humidity(&self, row: usize, col: usize) -> f32 {
        self.terrain.humidity.get(row, col)
    }

    pub fn temperature(&self, row: usize, col: usize) -> f32 {
        self.terrain.temperature.get(row, col)
    }

    /// Number of cells matching `pred`
    pub fn count(&self, pred: impl Fn(Cell) -> bool) -> usize {
        self.cells.as_slice().iter().filter(|&&c| pred(c)).count()
    }

    pub fn burning_cells(&self) -> usize {
        self.count(Cell::is_burning)
    }

    /// Local -> global coordinates
    pub fn to_global(&self, row: usize, col: usize) -> (usize, usize) {
        (self.bounds.row_start + row, self.bounds.col_start + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{FireIntensity, FuelAge};

    #[test]
    fn test_uniform_region_is_valid() {
        let bounds = RegionBounds::new(10, 14, 0, 6);
        let region = Region::uniform(bounds, 2, Cell::Tree(FuelAge::Mature), 10.0, 0.5, 25.0);
        assert!(region.validate().is_ok());
        assert_eq!((region.rows(), region.cols()), (4, 6));
        assert_eq!(region.owners.get(3, 5), 2);
        assert_eq!(region.to_global(1, 2), (11, 2));
    }

    #[test]
    fn test_new_rejects_shape_mismatch() {
        let bounds = RegionBounds::new(0, 4, 0, 4);
        let cells = Field::with_value(4, 4, Cell::Empty);
        let terrain = TerrainFields::uniform(4, 3, 0.0, 0.5, 25.0);
        let err = Region::new(bounds, 0, cells, terrain).unwrap_err();
        assert!(matches!(err, SimError::MalformedRegion { worker: 0, .. }));
    }

    #[test]
    fn test_set_cell_tracks_owner() {
        let bounds = RegionBounds::full(3, 3);
        let mut region = Region::uniform(bounds, 1, Cell::Tree(FuelAge::Old), 0.0, 0.5, 25.0);
        region.set_cell(1, 1, Cell::OwnedFire(4));
        assert_eq!(region.owners.get(1, 1), 4);
        region.set_cell(0, 0, Cell::Fire(FireIntensity::Low));
        assert_eq!(region.owners.get(0, 0), 1);
        assert_eq!(region.burning_cells(), 2);
    }
}
