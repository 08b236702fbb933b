// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Occupancy grid for one geometry instance.

A `Mesh` is built once by the rasterizer and never mutated afterwards.
Occupied cells are tissue, unoccupied cells are void.
*/

use core::fmt;

use ndarray::Array2;

use crate::types::{GeometryError, GeometryResult, GridPos};

/// Immutable 2D occupancy grid (rows x columns)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    grid: Array2<bool>,
}

impl Mesh {
    /// Wrap an existing occupancy array
    pub fn from_array(grid: Array2<bool>) -> Self {
        Self { grid }
    }

    /// Parse an ASCII drawing, `#` = occupied, anything else = void.
    ///
    /// All rows must have the same length.
    ///
    /// ```
    /// use branchwave_geometry::Mesh;
    ///
    /// let mesh = Mesh::from_ascii(&["##.", ".##"]).unwrap();
    /// assert_eq!(mesh.shape(), (2, 3));
    /// assert_eq!(mesh.occupied_count(), 4);
    /// ```
    pub fn from_ascii(rows: &[&str]) -> GeometryResult<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut grid = Array2::from_elem((height, width), false);
        for (row, line) in rows.iter().enumerate() {
            let line_width = line.chars().count();
            if line_width != width {
                return Err(GeometryError::InvalidDimension {
                    name: "row width",
                    value: line_width,
                    reason: "all rows of an ASCII mesh must have the same width",
                });
            }
            for (col, ch) in line.chars().enumerate() {
                grid[[row, col]] = ch == '#';
            }
        }
        Ok(Self { grid })
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.grid.dim()
    }

    pub fn rows(&self) -> usize {
        self.grid.nrows()
    }

    pub fn cols(&self) -> usize {
        self.grid.ncols()
    }

    /// Occupancy at `pos`; positions outside the grid are void
    pub fn is_occupied(&self, pos: GridPos) -> bool {
        self.grid.get([pos.row, pos.col]).copied().unwrap_or(false)
    }

    /// Occupancy at `pos`, erroring when `pos` is outside the grid
    pub fn occupancy(&self, pos: GridPos) -> GeometryResult<bool> {
        self.grid
            .get([pos.row, pos.col])
            .copied()
            .ok_or(GeometryError::OutOfBounds {
                pos,
                shape: self.shape(),
            })
    }

    pub fn occupied_count(&self) -> usize {
        self.grid.iter().filter(|&&occupied| occupied).count()
    }

    /// Occupied positions in row-major scan order (increasing row, then column)
    pub fn occupied_positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.grid
            .indexed_iter()
            .filter(|(_, &occupied)| occupied)
            .map(|((row, col), _)| GridPos::new(row, col))
    }

    /// Number of occupied cells in one row
    pub fn row_occupancy(&self, row: usize) -> usize {
        if row >= self.rows() {
            return 0;
        }
        self.grid.row(row).iter().filter(|&&occupied| occupied).count()
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.grid
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.grid.rows() {
            for &occupied in row.iter() {
                f.write_str(if occupied { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
