// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property tests for activation detection and conduction arithmetic

use branchwave_analysis::*;
use branchwave_geometry::CellId;
use ndarray::{Array1, Array2};
use proptest::prelude::*;

/// Series whose strip of `width` cells steps from -1 to +1 at `crossing`
/// (or never, when `crossing == samples`)
fn step_series(samples: usize, width: usize, crossing: usize) -> TimeSeries {
    let times = Array1::from_iter((0..samples).map(|i| i as f64 * 0.5));
    let values = Array2::from_shape_fn((samples, width + 1), |(sample, channel)| {
        if channel == width {
            // unrelated cell, always well above threshold
            100.0
        } else if sample >= crossing {
            1.0
        } else {
            -1.0
        }
    });
    TimeSeries::new(times, values).expect("valid series")
}

proptest! {
    #[test]
    fn prop_detects_exact_crossing_sample(
        samples in 1usize..60,
        width in 1usize..6,
        crossing_frac in 0.0f64..1.0,
    ) {
        let crossing = ((samples as f64) * crossing_frac) as usize;
        let series = step_series(samples, width, crossing);
        let strip: Vec<CellId> = (0..width).map(CellId).collect();

        let result = extract_activation_time(&series, &strip, 0.0).unwrap();
        prop_assert_eq!(result, ActivationTime::At(crossing as f64 * 0.5));
    }

    #[test]
    fn prop_never_crossing_is_sentinel(samples in 1usize..60, width in 1usize..6) {
        let series = step_series(samples, width, samples);
        let strip: Vec<CellId> = (0..width).map(CellId).collect();
        prop_assert_eq!(
            extract_activation_time(&series, &strip, 0.0).unwrap(),
            ActivationTime::NotActivated
        );
    }

    #[test]
    fn prop_extraction_is_reproducible(samples in 1usize..40, crossing_frac in 0.0f64..1.0) {
        let crossing = ((samples as f64) * crossing_frac) as usize;
        let series = step_series(samples, 3, crossing);
        let strip = [CellId(2), CellId(0), CellId(1)];
        let first = extract_activation_time(&series, &strip, 0.0).unwrap();
        let second = extract_activation_time(&series, &strip, 0.0).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_conduction_antisymmetric(left in -1e3f64..1e3, right in -1e3f64..1e3) {
        let forward = conduction_time(
            ActivationTime::At(left),
            ActivationTime::At(right),
            SignConvention::LeftToRight,
        );
        let backward = conduction_time(
            ActivationTime::At(right),
            ActivationTime::At(left),
            SignConvention::LeftToRight,
        );
        prop_assert_eq!(forward.value().map(|v| -v), backward.value());
    }

    #[test]
    fn prop_sentinel_never_becomes_number(t in -1e3f64..1e3) {
        let result = conduction_time(
            ActivationTime::At(t),
            ActivationTime::NotActivated,
            SignConvention::StimulationAware(branchwave_geometry::StimulationSide::Right),
        );
        prop_assert_eq!(result, ConductionTime::Undefined);
    }
}
