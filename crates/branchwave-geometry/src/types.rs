// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for geometry operations.
*/

use core::fmt;
use serde::{Deserialize, Serialize};

/// Grid position as (row, column), row 0 at the top of the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighbor one column to the right
    pub const fn right(self) -> Self {
        Self::new(self.row, self.col + 1)
    }

    /// Neighbor one row down
    pub const fn down(self) -> Self {
        Self::new(self.row + 1, self.col)
    }

    /// True when the two positions share an edge (4-neighborhood)
    pub fn is_adjacent_to(self, other: GridPos) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl From<(usize, usize)> for GridPos {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Dense index of an occupied cell (0..N-1, row-major scan order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub usize);

impl CellId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell {}", self.0)
    }
}

/// Result type for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors that can occur while building geometry artifacts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Degenerate branch angle {theta} degrees: must lie strictly between 0 and 180")]
    DegenerateAngle { theta: f64 },

    #[error("Invalid slope {slope}: must be finite and positive")]
    InvalidSlope { slope: f64 },

    #[error("Invalid dimension {name} = {value}: {reason}")]
    InvalidDimension {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    #[error("Invalid conductance {0}: must be finite and positive")]
    InvalidConductance(f64),

    #[error("Position {0} is not an occupied cell")]
    PositionNotOccupied(GridPos),

    #[error("Out of bounds: position {pos} not in grid {shape:?}")]
    OutOfBounds { pos: GridPos, shape: (usize, usize) },

    #[error("Region '{0}' contains no cells")]
    EmptyRegion(String),

    #[error("Geometry is disconnected: {components} components")]
    Disconnected { components: usize },
}
