// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Activation-time extraction.

The activation time of a measurement strip is the time of the first sample
whose equal-weight mean over the strip's cells is strictly above a
threshold. A strip that never crosses yields [`ActivationTime::NotActivated`],
which callers must branch on before doing arithmetic.
*/

use core::fmt;

use branchwave_geometry::{CellId, CellIndex, CellRegion};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::time_series::TimeSeries;

/// First threshold crossing of a strip, or the explicit "no activation" value.
///
/// Serialized as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum ActivationTime {
    At(f64),
    NotActivated,
}

impl ActivationTime {
    pub fn time(self) -> Option<f64> {
        match self {
            ActivationTime::At(t) => Some(t),
            ActivationTime::NotActivated => None,
        }
    }

    pub fn is_activated(self) -> bool {
        matches!(self, ActivationTime::At(_))
    }
}

impl From<Option<f64>> for ActivationTime {
    fn from(value: Option<f64>) -> Self {
        match value {
            // NaN was the historical "never activated" marker
            Some(t) if t.is_finite() => ActivationTime::At(t),
            _ => ActivationTime::NotActivated,
        }
    }
}

impl From<ActivationTime> for Option<f64> {
    fn from(value: ActivationTime) -> Self {
        value.time()
    }
}

impl fmt::Display for ActivationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationTime::At(t) => write!(f, "t={}", t),
            ActivationTime::NotActivated => write!(f, "not activated"),
        }
    }
}

/// First sample time at which the mean over `cells` exceeds `threshold`
pub fn extract_activation_time(
    series: &TimeSeries,
    cells: &[CellId],
    threshold: f64,
) -> AnalysisResult<ActivationTime> {
    let mean = series.strip_mean(cells)?;
    let crossing = mean.iter().position(|&v| v > threshold);
    Ok(match crossing {
        Some(sample) => ActivationTime::At(series.times()[sample]),
        None => ActivationTime::NotActivated,
    })
}

/// Extracts activation times of spatial strips, resolving positions through
/// the cell index the series was produced with
#[derive(Debug, Clone, Copy)]
pub struct ActivationTimeExtractor<'a> {
    index: &'a CellIndex,
    threshold: f64,
}

impl<'a> ActivationTimeExtractor<'a> {
    pub fn new(index: &'a CellIndex, threshold: f64) -> Self {
        Self { index, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn extract(&self, series: &TimeSeries, strip: &CellRegion) -> AnalysisResult<ActivationTime> {
        if strip.is_empty() {
            return Err(AnalysisError::EmptyStrip(strip.name().to_string()));
        }
        if series.channel_count() != self.index.len() {
            return Err(AnalysisError::ShapeMismatch(format!(
                "series has {} channels but geometry has {} cells",
                series.channel_count(),
                self.index.len()
            )));
        }

        let cells = self.index.resolve_region(strip)?;
        let activation = extract_activation_time(series, &cells, self.threshold)?;
        debug!(
            "[ANALYSIS] Strip '{}' ({} cells): {}",
            strip.name(),
            cells.len(),
            activation
        );
        Ok(activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchwave_geometry::{GridPos, Mesh};
    use ndarray::{array, Array2};

    fn ramp() -> TimeSeries {
        // cell 0 rises at t=2, cell 1 at t=3
        TimeSeries::new(
            array![0.0, 1.0, 2.0, 3.0, 4.0],
            array![[-1.0, -1.0], [-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [1.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_single_cell_crossing() {
        let series = ramp();
        assert_eq!(
            extract_activation_time(&series, &[CellId(0)], 0.0).unwrap(),
            ActivationTime::At(2.0)
        );
    }

    #[test]
    fn test_strip_uses_mean() {
        let series = ramp();
        // mean at t=2 is exactly 0, which is not strictly above the threshold
        assert_eq!(
            extract_activation_time(&series, &[CellId(0), CellId(1)], 0.0).unwrap(),
            ActivationTime::At(3.0)
        );
        assert_eq!(
            extract_activation_time(&series, &[CellId(0), CellId(1)], -0.5).unwrap(),
            ActivationTime::At(2.0)
        );
    }

    #[test]
    fn test_no_crossing_is_sentinel() {
        let series = ramp();
        let result = extract_activation_time(&series, &[CellId(1)], 5.0).unwrap();
        assert_eq!(result, ActivationTime::NotActivated);
        assert!(!result.is_activated());
        assert_eq!(result.time(), None);
    }

    #[test]
    fn test_serialized_as_number_or_null() {
        assert_eq!(serde_json::to_string(&ActivationTime::At(1.5)).unwrap(), "1.5");
        assert_eq!(serde_json::to_string(&ActivationTime::NotActivated).unwrap(), "null");
        let parsed: ActivationTime = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, ActivationTime::NotActivated);
        assert_eq!(ActivationTime::from(Some(f64::NAN)), ActivationTime::NotActivated);
    }

    #[test]
    fn test_extractor_resolves_positions() {
        let mesh = Mesh::from_ascii(&["#.", "##"]).unwrap();
        let index = CellIndex::from_mesh(&mesh);
        let series = TimeSeries::new(
            array![0.0, 1.0],
            array![[0.0, 0.0, 0.0], [0.0, 0.0, 2.0]],
        )
        .unwrap();
        let extractor = ActivationTimeExtractor::new(&index, 0.5);

        let strip = CellRegion::new("right", [GridPos::new(1, 1)]);
        assert_eq!(
            extractor.extract(&series, &strip).unwrap(),
            ActivationTime::At(1.0)
        );

        let void = CellRegion::new("void", [GridPos::new(0, 1)]);
        assert!(matches!(
            extractor.extract(&series, &void),
            Err(AnalysisError::Geometry(_))
        ));

        let empty = CellRegion::new("empty", Vec::<GridPos>::new());
        assert!(matches!(
            extractor.extract(&series, &empty),
            Err(AnalysisError::EmptyStrip(name)) if name == "empty"
        ));
    }

    #[test]
    fn test_extractor_checks_channel_count() {
        let mesh = Mesh::from_ascii(&["##"]).unwrap();
        let index = CellIndex::from_mesh(&mesh);
        let series = TimeSeries::new(array![0.0], Array2::zeros((1, 3))).unwrap();
        let strip = CellRegion::new("left", [GridPos::new(0, 0)]);
        assert!(matches!(
            ActivationTimeExtractor::new(&index, 0.0).extract(&series, &strip),
            Err(AnalysisError::ShapeMismatch(_))
        ));
    }
}
