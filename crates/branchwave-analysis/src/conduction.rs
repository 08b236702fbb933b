// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Conduction time between the left and right measurement strips.

use core::fmt;

use branchwave_geometry::StimulationSide;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationTime;

/// Delay between two activations, or the explicit "undefined" value when
/// either side never activated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum ConductionTime {
    Defined(f64),
    Undefined,
}

impl ConductionTime {
    pub fn value(self) -> Option<f64> {
        match self {
            ConductionTime::Defined(v) => Some(v),
            ConductionTime::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, ConductionTime::Defined(_))
    }
}

impl From<Option<f64>> for ConductionTime {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => ConductionTime::Defined(v),
            _ => ConductionTime::Undefined,
        }
    }
}

impl From<ConductionTime> for Option<f64> {
    fn from(value: ConductionTime) -> Self {
        value.value()
    }
}

impl fmt::Display for ConductionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConductionTime::Defined(v) => write!(f, "{}", v),
            ConductionTime::Undefined => write!(f, "undefined"),
        }
    }
}

/// Direction of the subtraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    /// Always `right - left`, whichever side was paced
    #[default]
    LeftToRight,
    /// `right - left` when the left side was paced, `left - right` when the
    /// right side was, so the delay is measured along the wave
    StimulationAware(StimulationSide),
}

/// Conduction time from the left and right strip activations
pub fn conduction_time(
    left: ActivationTime,
    right: ActivationTime,
    convention: SignConvention,
) -> ConductionTime {
    let (ActivationTime::At(left), ActivationTime::At(right)) = (left, right) else {
        return ConductionTime::Undefined;
    };
    if !left.is_finite() || !right.is_finite() {
        return ConductionTime::Undefined;
    }
    let delay = match convention {
        SignConvention::StimulationAware(StimulationSide::Right) => left - right,
        SignConvention::LeftToRight | SignConvention::StimulationAware(StimulationSide::Left) => {
            right - left
        }
    };
    ConductionTime::Defined(delay)
}
