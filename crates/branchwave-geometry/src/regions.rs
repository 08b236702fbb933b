// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spatial regions: stimulation strips and measurement strips.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::connectivity::CellIndex;
use crate::rasterizer::BranchGeometry;
use crate::types::{CellId, GeometryError, GeometryResult, GridPos};

/// End of the main channel that gets paced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulationSide {
    #[default]
    Left,
    Right,
}

impl fmt::Display for StimulationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StimulationSide::Left => write!(f, "left"),
            StimulationSide::Right => write!(f, "right"),
        }
    }
}

impl core::str::FromStr for StimulationSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(StimulationSide::Left),
            "right" => Ok(StimulationSide::Right),
            other => Err(format!("unknown stimulation side '{}'", other)),
        }
    }
}

/// Named, ordered set of grid positions (sorted row-major, no duplicates)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRegion {
    name: String,
    positions: Vec<GridPos>,
}

impl CellRegion {
    pub fn new(name: impl Into<String>, positions: impl IntoIterator<Item = GridPos>) -> Self {
        let mut positions: Vec<GridPos> = positions.into_iter().collect();
        positions.sort_unstable();
        positions.dedup();
        Self {
            name: name.into(),
            positions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[GridPos] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Every main-channel row at each of `columns`.
///
/// Used both for stimulation strips and for the vertical measurement strips
/// the activation extractor averages over.
pub fn main_channel_columns(
    geometry: &BranchGeometry,
    name: &str,
    columns: impl IntoIterator<Item = usize>,
) -> GeometryResult<CellRegion> {
    let shape = geometry.grid_shape()?;
    let rows = geometry.main_channel_rows();

    let mut positions = Vec::new();
    for col in columns {
        if col >= shape.1 {
            return Err(GeometryError::OutOfBounds {
                pos: GridPos::new(rows.start, col),
                shape,
            });
        }
        positions.extend(rows.clone().map(|row| GridPos::new(row, col)));
    }

    if positions.is_empty() {
        return Err(GeometryError::EmptyRegion(name.to_string()));
    }
    Ok(CellRegion::new(name, positions))
}

/// Leftmost or rightmost `width` columns of the main channel
pub fn stimulation_region(
    geometry: &BranchGeometry,
    side: StimulationSide,
    width: usize,
) -> GeometryResult<CellRegion> {
    let (_, cols) = geometry.grid_shape()?;
    if width == 0 || width > cols {
        return Err(GeometryError::InvalidDimension {
            name: "stimulation width",
            value: width,
            reason: "must be between 1 and the grid width",
        });
    }
    let columns = match side {
        StimulationSide::Left => 0..width,
        StimulationSide::Right => cols - width..cols,
    };
    main_channel_columns(geometry, &format!("stimulation ({})", side), columns)
}

impl CellIndex {
    /// Resolve every position of `region` to its cell id.
    ///
    /// Fails if any position is void; the ids come back in region order.
    pub fn resolve_region(&self, region: &CellRegion) -> GeometryResult<Vec<CellId>> {
        if region.is_empty() {
            return Err(GeometryError::EmptyRegion(region.name().to_string()));
        }
        region
            .positions()
            .iter()
            .map(|&pos| self.require_index(pos))
            .collect()
    }
}
