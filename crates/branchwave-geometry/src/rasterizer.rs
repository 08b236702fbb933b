// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Geometry rasterizer.

Turns parametric branch dimensions into an occupancy grid: a horizontal main
channel merged with one or two angled branches. Grid extent always comes from
the parameters, never from the rasterized content.

Four layouts are supported (row 0 is the top row):

| Layout         | Grid                         | Main channel rows |
|----------------|------------------------------|-------------------|
| `SingleSlope`  | `(w1 + l2) x l1`             | `0..w1`           |
| `DoubleSlope`  | `(2*l2 + w1) x l1`           | `l2..l2+w1`       |
| `SingleAngle`  | `(h + w1) x (2*l1 + L)`      | `h..h+w1`         |
| `DoubleAngle`  | `(2*h + w1) x (2*l1 + L)`    | `h..h+w1`         |

with `L = round(w2 / sin(theta))`, the length of the junction along the main
channel.
*/

use core::fmt;
use core::ops::Range;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mesh::Mesh;
use crate::types::{GeometryError, GeometryResult};

/// Tolerance applied to branch row boundaries so that exact integer
/// boundaries survive floating-point rounding of the trigonometry.
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Upper bound on rows x columns of a rasterized grid
pub const MAX_GRID_CELLS: usize = 1 << 28;

fn default_scale() -> usize {
    1
}

/// Branch described by its slope (rows per column)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopeBranchParams {
    /// Length of the main channel (grid width)
    pub l1: usize,
    /// Width of the main channel
    pub w1: usize,
    /// Height of the branch (rows below/above the main channel)
    pub l2: usize,
    /// Width of the branch, measured along a row
    pub w2: usize,
    /// Length of main channel before the branch begins
    pub l_solo: usize,
    /// Rows advanced per column of horizontal offset
    pub slope: f64,
    /// Uniform factor applied to every length
    #[serde(default = "default_scale")]
    pub scale: usize,
}

impl Default for SlopeBranchParams {
    fn default() -> Self {
        Self {
            l1: 15,
            w1: 2,
            l2: 5,
            w2: 3,
            l_solo: 3,
            slope: 1.0,
            scale: 1,
        }
    }
}

/// Branch described by its angle to the main channel, in degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleBranchParams {
    /// Length of the main channel before and after the junction
    pub l1: usize,
    /// Width of the main channel
    pub w1: usize,
    /// Vertical extent of the branch
    pub h: usize,
    /// Width of the branch perpendicular to its edges
    pub w2: usize,
    /// Angle between branch and main channel, degrees in (0, 180)
    pub theta: f64,
    /// Uniform factor applied to every length (not to the angle)
    #[serde(default = "default_scale")]
    pub scale: usize,
}

impl Default for AngleBranchParams {
    fn default() -> Self {
        Self {
            l1: 15,
            w1: 3,
            h: 5,
            w2: 4,
            theta: 45.0,
            scale: 1,
        }
    }
}

/// Parametric branch geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchGeometry {
    /// Main channel with one branch hanging below it
    SingleSlope(SlopeBranchParams),
    /// Main channel with mirrored branches above and below
    DoubleSlope(SlopeBranchParams),
    /// Main channel with one branch rising above it
    SingleAngle(AngleBranchParams),
    /// Main channel with mirrored branches above and below
    DoubleAngle(AngleBranchParams),
}

impl Default for BranchGeometry {
    fn default() -> Self {
        BranchGeometry::SingleAngle(AngleBranchParams {
            l1: 60,
            w1: 5,
            h: 20,
            w2: 5,
            theta: 150.0,
            scale: 1,
        })
    }
}

/// Non-fatal finding about a rasterized geometry.
///
/// When a geometry raises no advisory its occupied cells form a single
/// 4-connected component. With an advisory the grid is still produced, but
/// it may be disconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "advisory", rename_all = "snake_case")]
pub enum GeometryAdvisory {
    /// Main channel too short for the branch to fit; branch cells are clipped
    MainChannelTooShort { required: f64, actual: usize },
    /// Successive branch rows share less than one column
    BranchTooThin { span: f64, shift: f64 },
}

impl fmt::Display for GeometryAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryAdvisory::MainChannelTooShort { required, actual } => write!(
                f,
                "min l1 for diagonal branch to fit is {:.3}, got {}",
                required, actual
            ),
            GeometryAdvisory::BranchTooThin { span, shift } => write!(
                f,
                "branch rows span {:.3} columns but shift {:.3} per row; rows only touch diagonally",
                span, shift
            ),
        }
    }
}

/// Output of the rasterizer
#[derive(Debug, Clone)]
pub struct Rasterization {
    pub mesh: Mesh,
    pub advisories: Vec<GeometryAdvisory>,
}

impl Rasterization {
    /// No advisory was raised
    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }
}

/// Concrete, scaled description of one geometry, ready to fill
struct Layout {
    shape: (usize, usize),
    main_rows: Range<usize>,
    /// Branch row width in columns
    span: f64,
    /// Column shift between successive branch rows
    shift: f64,
    /// (row, first column) for every branch row
    bands: Vec<(usize, f64)>,
    /// Main channel length needed for the branch to fit
    required_length: f64,
    actual_length: usize,
    branch_rows: usize,
}

impl SlopeBranchParams {
    pub fn validate(&self) -> GeometryResult<()> {
        if !self.slope.is_finite() || self.slope <= 0.0 {
            return Err(GeometryError::InvalidSlope { slope: self.slope });
        }
        check_positive("scale", self.scale)?;
        check_positive("l1", self.l1)?;
        check_positive("w1", self.w1)?;
        check_positive("w2", self.w2)?;
        Ok(())
    }

    /// Main-channel length required for the branch to fit inside the grid
    pub fn min_main_length(&self) -> f64 {
        let s = self.scale;
        if self.l2 * s == 0 {
            return 0.0;
        }
        (self.l_solo * s) as f64 + (self.w2 * s) as f64 + (self.l2 * s - 1) as f64 / self.slope
    }

    fn layout(&self, double: bool) -> GeometryResult<Layout> {
        self.validate()?;
        let s = self.scale;
        let (l1, w1, l2, w2, l_solo) = (
            self.l1 * s,
            self.w1 * s,
            self.l2 * s,
            self.w2 * s,
            (self.l_solo * s) as f64,
        );

        let rows = if double { 2 * l2 + w1 } else { w1 + l2 };
        let shape = check_grid(rows, l1)?;
        let main_rows = if double { l2..l2 + w1 } else { 0..w1 };

        let mut bands = Vec::with_capacity(if double { 2 * l2 } else { l2 });
        if double {
            // Upper branch leans toward the junction as it approaches the channel
            for y in 0..l2 {
                bands.push((y, l_solo + (l2 - y - 1) as f64 / self.slope));
            }
            for y in l2 + w1..2 * l2 + w1 {
                bands.push((y, l_solo + (y - w1 - l2) as f64 / self.slope));
            }
        } else {
            for y in w1..w1 + l2 {
                bands.push((y, l_solo + (y - w1) as f64 / self.slope));
            }
        }

        Ok(Layout {
            shape,
            main_rows,
            span: w2 as f64,
            shift: 1.0 / self.slope,
            bands,
            required_length: self.min_main_length(),
            actual_length: l1,
            branch_rows: l2,
        })
    }
}

impl AngleBranchParams {
    pub fn validate(&self) -> GeometryResult<()> {
        let theta = self.theta;
        if !theta.is_finite() || theta <= 0.0 || theta >= 180.0 {
            return Err(GeometryError::DegenerateAngle { theta });
        }
        let sin = theta.to_radians().sin();
        if sin.abs() < f64::EPSILON {
            return Err(GeometryError::DegenerateAngle { theta });
        }
        check_positive("scale", self.scale)?;
        check_positive("w1", self.w1)?;
        check_positive("w2", self.w2)?;
        Ok(())
    }

    /// Cotangent of the branch angle
    pub fn cot(&self) -> f64 {
        let theta = self.theta.to_radians();
        theta.cos() / theta.sin()
    }

    /// Junction length along the main channel: `round(w2 / sin(theta))`
    pub fn intersection_length(&self) -> usize {
        let w2 = (self.w2 * self.scale) as f64;
        (w2 / self.theta.to_radians().sin()).round() as usize
    }

    /// Length of `l1` required for the branch to stay inside the grid
    pub fn min_main_length(&self) -> f64 {
        let h = self.h * self.scale;
        if h == 0 {
            return 0.0;
        }
        (h - 1) as f64 * self.cot().abs()
    }

    fn layout(&self, double: bool) -> GeometryResult<Layout> {
        self.validate()?;
        let s = self.scale;
        let (l1, w1, h) = (self.l1 * s, self.w1 * s, self.h * s);
        let cot = self.cot();

        let span = (w2_over_sin(self.w2 * s, self.theta)).round();
        if !span.is_finite() || span >= MAX_GRID_CELLS as f64 {
            return Err(GeometryError::DegenerateAngle { theta: self.theta });
        }
        let len_intersection = span as usize;

        let rows = if double { 2 * h + w1 } else { h + w1 };
        let shape = check_grid(rows, 2 * l1 + len_intersection)?;

        let origin = l1 as f64;
        let mut bands = Vec::with_capacity(if double { 2 * h } else { h });
        for y in 0..h {
            bands.push((y, origin + (h - y - 1) as f64 * cot));
        }
        if double {
            for y in h + w1..2 * h + w1 {
                bands.push((y, origin + (y - w1 - h) as f64 * cot));
            }
        }

        Ok(Layout {
            shape,
            main_rows: h..h + w1,
            span,
            shift: cot.abs(),
            bands,
            required_length: self.min_main_length(),
            actual_length: l1,
            branch_rows: h,
        })
    }
}

fn w2_over_sin(w2: usize, theta: f64) -> f64 {
    w2 as f64 / theta.to_radians().sin()
}

fn check_positive(name: &'static str, value: usize) -> GeometryResult<()> {
    if value == 0 {
        return Err(GeometryError::InvalidDimension {
            name,
            value,
            reason: "must be positive",
        });
    }
    Ok(())
}

fn check_grid(rows: usize, cols: usize) -> GeometryResult<(usize, usize)> {
    match rows.checked_mul(cols) {
        Some(cells) if cells <= MAX_GRID_CELLS => Ok((rows, cols)),
        _ => Err(GeometryError::InvalidDimension {
            name: "grid cells",
            value: rows.saturating_mul(cols),
            reason: "grid exceeds MAX_GRID_CELLS",
        }),
    }
}

impl BranchGeometry {
    /// Short name used in logs and records
    pub fn kind(&self) -> &'static str {
        match self {
            BranchGeometry::SingleSlope(_) => "single_slope",
            BranchGeometry::DoubleSlope(_) => "double_slope",
            BranchGeometry::SingleAngle(_) => "single_angle",
            BranchGeometry::DoubleAngle(_) => "double_angle",
        }
    }

    /// True for the mirrored two-branch layouts
    pub fn is_double(&self) -> bool {
        matches!(
            self,
            BranchGeometry::DoubleSlope(_) | BranchGeometry::DoubleAngle(_)
        )
    }

    /// Validate parameters without rasterizing
    pub fn validate(&self) -> GeometryResult<()> {
        match self {
            BranchGeometry::SingleSlope(p) | BranchGeometry::DoubleSlope(p) => p.validate(),
            BranchGeometry::SingleAngle(p) | BranchGeometry::DoubleAngle(p) => p.validate(),
        }
    }

    fn layout(&self) -> GeometryResult<Layout> {
        match self {
            BranchGeometry::SingleSlope(p) => p.layout(false),
            BranchGeometry::DoubleSlope(p) => p.layout(true),
            BranchGeometry::SingleAngle(p) => p.layout(false),
            BranchGeometry::DoubleAngle(p) => p.layout(true),
        }
    }

    /// (rows, columns) of the grid, computed from the parameters alone
    pub fn grid_shape(&self) -> GeometryResult<(usize, usize)> {
        Ok(self.layout()?.shape)
    }

    /// Rows occupied by the main channel (after scaling)
    pub fn main_channel_rows(&self) -> Range<usize> {
        match self {
            BranchGeometry::SingleSlope(p) => 0..p.w1 * p.scale,
            BranchGeometry::DoubleSlope(p) => {
                let (l2, w1) = (p.l2 * p.scale, p.w1 * p.scale);
                l2..l2 + w1
            }
            BranchGeometry::SingleAngle(p) | BranchGeometry::DoubleAngle(p) => {
                let (h, w1) = (p.h * p.scale, p.w1 * p.scale);
                h..h + w1
            }
        }
    }

    /// Mirror image of `row` about the channel's horizontal axis.
    ///
    /// Only defined for the double layouts.
    pub fn mirror_row(&self, row: usize) -> Option<usize> {
        if !self.is_double() {
            return None;
        }
        let (rows, _) = self.grid_shape().ok()?;
        (row < rows).then(|| rows - 1 - row)
    }

    /// Branch angle in degrees; slope layouts report `atan(slope)`
    pub fn branch_angle_degrees(&self) -> f64 {
        match self {
            BranchGeometry::SingleSlope(p) | BranchGeometry::DoubleSlope(p) => {
                p.slope.atan().to_degrees()
            }
            BranchGeometry::SingleAngle(p) | BranchGeometry::DoubleAngle(p) => p.theta,
        }
    }

    /// Branch width over main channel width (`w2 / w1`)
    pub fn width_ratio(&self) -> f64 {
        let (w1, w2) = match self {
            BranchGeometry::SingleSlope(p) | BranchGeometry::DoubleSlope(p) => (p.w1, p.w2),
            BranchGeometry::SingleAngle(p) | BranchGeometry::DoubleAngle(p) => (p.w1, p.w2),
        };
        w2 as f64 / w1 as f64
    }

    /// Rasterize into an occupancy grid.
    ///
    /// Invalid parameters (degenerate angle, non-positive slope, zero widths)
    /// are hard errors. A geometry that does not fit is still produced and
    /// reported through [`Rasterization::advisories`].
    pub fn rasterize(&self) -> GeometryResult<Rasterization> {
        let layout = self.layout()?;
        let (rows, cols) = layout.shape;
        let mut grid = Array2::from_elem((rows, cols), false);

        // Main channel spans the full width unconditionally
        for row in layout.main_rows.clone() {
            grid.row_mut(row).fill(true);
        }

        for &(row, start) in &layout.bands {
            for col in band_columns(start, layout.span, cols) {
                grid[[row, col]] = true;
            }
        }

        let mut advisories = Vec::new();
        if (layout.actual_length as f64) < layout.required_length - BOUNDARY_TOLERANCE {
            advisories.push(GeometryAdvisory::MainChannelTooShort {
                required: layout.required_length,
                actual: layout.actual_length,
            });
        }
        if layout.branch_rows >= 2 && layout.span - layout.shift < 1.0 - BOUNDARY_TOLERANCE {
            advisories.push(GeometryAdvisory::BranchTooThin {
                span: layout.span,
                shift: layout.shift,
            });
        }
        for advisory in &advisories {
            warn!("[RASTERIZER] ⚠️ {} geometry: {}", self.kind(), advisory);
        }

        let mesh = Mesh::from_array(grid);
        debug!(
            "[RASTERIZER] {} geometry rasterized: {}x{} grid, {} occupied cells",
            self.kind(),
            rows,
            cols,
            mesh.occupied_count()
        );

        Ok(Rasterization { mesh, advisories })
    }
}

/// Columns `x` with `start <= x < start + span`, clipped to the grid
fn band_columns(start: f64, span: f64, cols: usize) -> Range<usize> {
    let lo = start - BOUNDARY_TOLERANCE;
    let hi = start + span - BOUNDARY_TOLERANCE;
    let first = lo.ceil().max(0.0) as usize;
    let end = (hi.ceil().max(0.0) as usize).min(cols);
    first.min(end)..end
}
