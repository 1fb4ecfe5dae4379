//! Row-major 2-D field storage
//!
//! Every per-cell quantity a region tracks (state, owner, elevation,
//! humidity, temperature) lives in one of these.

use serde::{Deserialize, Serialize};

/// Field data container
///
/// Stores 2-D values as a flat `Vec<T>` in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field<T> {
    /// Values in row-major order (row * cols + col)
    pub data: Vec<T>,
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl<T: Copy> Field<T> {
    /// Create a field with every cell set to `value`
    #[must_use]
    pub fn with_value(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    /// Create a field by evaluating `f(row, col)` for every cell, row by row
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { data, rows, cols }
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col]
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col] = value;
    }
}

impl<T> Field<T> {
    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get mutable reference to field data
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the field has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the backing buffer matches the declared shape
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.rows * self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_with_value() {
        let field = Field::with_value(5, 4, 42.0_f32);
        assert_eq!(field.shape(), (5, 4));
        assert_eq!(field.len(), 20);
        assert!(field.data.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_field_get_set() {
        let mut field = Field::with_value(10, 10, 0.0_f32);
        field.set(3, 4, 123.45);
        assert_eq!(field.get(3, 4), 123.45);

        // Verify row-major indexing
        let index = 3 * 10 + 4;
        assert_eq!(field.data[index], 123.45);
    }

    #[test]
    fn test_field_from_fn_is_row_major() {
        let field = Field::from_fn(2, 3, |r, c| r * 10 + c);
        assert_eq!(field.as_slice(), &[0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_field_consistency() {
        let mut field = Field::with_value(2, 2, 1_u8);
        assert!(field.is_consistent());
        field.data.pop();
        assert!(!field.is_consistent());
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = Field::with_value(10, 10, 0_u8);
        let _ = field.get(10, 5);
    }
}
