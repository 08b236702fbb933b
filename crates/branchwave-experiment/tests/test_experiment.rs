// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pipeline tests against a solver whose wave advances one cell per time unit

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use branchwave_analysis::{
    conduction_time, ActivationTime, ActivationTimeExtractor, ConductionTime, RunStore,
    SignConvention, TimeSeries,
};
use branchwave_config::BranchwaveConfig;
use branchwave_experiment::*;
use branchwave_geometry::{
    AngleBranchParams, BranchGeometry, CellRegion, GeometryError, GridPos, SlopeBranchParams,
    StimulationSide,
};
use ndarray::{Array1, Array2};
use tempfile::TempDir;

const RESTING: f64 = -85.0;
const EXCITED: f64 = 20.0;

/// Each cell depolarizes `delay_per_hop` after its nearest paced cell,
/// measured in graph hops
struct HopDelaySolver {
    delay_per_hop: f64,
}

impl CableSolver for HopDelaySolver {
    fn name(&self) -> &str {
        "hop-delay"
    }

    fn solve(&self, request: &SolveRequest, cancel: &CancellationToken) -> SolverResult<TimeSeries> {
        let mut neighbours = vec![Vec::new(); request.cell_count];
        for &(source, target, _) in &request.edges {
            neighbours[source].push(target);
            neighbours[target].push(source);
        }

        let mut hops = vec![None; request.cell_count];
        let mut queue = VecDeque::new();
        for &cell in &request.paced_cells {
            hops[cell] = Some(0usize);
            queue.push_back(cell);
        }
        while let Some(cell) = queue.pop_front() {
            cancel.check()?;
            let next = hops[cell].map(|h| h + 1);
            for &n in &neighbours[cell] {
                if hops[n].is_none() {
                    hops[n] = next;
                    queue.push_back(n);
                }
            }
        }

        let samples = (request.duration / request.log_interval).round() as usize + 1;
        let times = Array1::from_iter((0..samples).map(|i| i as f64 * request.log_interval));
        let values = Array2::from_shape_fn((samples, request.cell_count), |(s, c)| {
            match hops[c] {
                Some(h) if times[s] >= h as f64 * self.delay_per_hop => EXCITED,
                _ => RESTING,
            }
        });
        TimeSeries::new(times, values).map_err(|e| SolverError::Failed(e.to_string()))
    }
}

fn solver() -> Arc<dyn CableSolver> {
    Arc::new(HopDelaySolver { delay_per_hop: 1.0 })
}

/// 8 x 43 grid: main channel rows 5..8, vertical branch above columns 20..23
fn straight_branch_config(output: &TempDir) -> BranchwaveConfig {
    let mut config = BranchwaveConfig::default();
    config.geometry = BranchGeometry::SingleAngle(AngleBranchParams {
        l1: 20,
        w1: 3,
        h: 5,
        w2: 3,
        theta: 90.0,
        scale: 1,
    });
    config.stimulation.width = 2;
    config.measurement.left_column = 5;
    config.measurement.right_column = 35;
    config.solver.duration = 100.0;
    config.solver.log_interval = 1.0;
    config.solver.step_size = 0.1;
    config.solver.timeout_secs = 30;
    config.run.run_name = "straight".to_string();
    config.run.output_dir = output.path().to_path_buf();
    config
}

#[test]
fn test_left_paced_run() {
    let output = TempDir::new().unwrap();
    let config = straight_branch_config(&output);

    let outcome = BranchExperiment::from_config(&config)
        .unwrap()
        .run(solver())
        .unwrap();

    assert!(outcome.advisories.is_empty());
    assert_eq!(outcome.series.channel_count(), 144);
    assert_eq!(outcome.record.active_left, ActivationTime::At(4.0));
    assert_eq!(outcome.record.active_right, ActivationTime::At(34.0));
    assert_eq!(outcome.conduction_time, ConductionTime::Defined(30.0));
    assert!(outcome.record.run_id.ends_with("-straight"));
}

#[test]
fn test_right_paced_run_mirrors() {
    let output = TempDir::new().unwrap();
    let mut config = straight_branch_config(&output);
    config.stimulation.side = StimulationSide::Right;
    config.run.persist = false;

    let outcome = BranchExperiment::from_config(&config)
        .unwrap()
        .run(solver())
        .unwrap();

    // Paced columns 41 and 42
    assert_eq!(outcome.record.active_left, ActivationTime::At(36.0));
    assert_eq!(outcome.record.active_right, ActivationTime::At(6.0));
    assert_eq!(outcome.conduction_time, ConductionTime::Defined(-30.0));
    assert_eq!(
        outcome
            .record
            .conduction_time(outcome.record.stimulation_aware_convention()),
        ConductionTime::Defined(30.0)
    );
    assert!(outcome.run_dir.is_none());
}

#[test]
fn test_double_branch_mirrored_strips_activate_together() {
    let output = TempDir::new().unwrap();
    let mut config = straight_branch_config(&output);
    // 13 x 43 grid, branches above and below the channel at columns 20..23
    config.geometry = BranchGeometry::DoubleAngle(AngleBranchParams {
        l1: 20,
        w1: 3,
        h: 5,
        w2: 3,
        theta: 90.0,
        scale: 1,
    });
    config.run.persist = false;

    let experiment = BranchExperiment::from_config(&config).unwrap();
    let prepared = experiment.prepare().unwrap();
    let outcome = experiment.run(solver()).unwrap();

    assert_eq!(config.geometry.mirror_row(0), Some(12));
    let upper = CellRegion::new("upper tip", (20..23).map(|col| GridPos::new(0, col)));
    let lower = CellRegion::new("lower tip", (20..23).map(|col| GridPos::new(12, col)));

    let extractor = ActivationTimeExtractor::new(prepared.graph.index(), config.measurement.threshold);
    let upper_time = extractor.extract(&outcome.series, &upper).unwrap();
    let lower_time = extractor.extract(&outcome.series, &lower).unwrap();

    // Tip cells sit 24, 25 and 26 hops from the paced columns; the strip mean
    // only goes positive once all three are excited
    assert_eq!(upper_time, ActivationTime::At(26.0));
    assert_eq!(lower_time, upper_time);
    assert_eq!(
        conduction_time(upper_time, lower_time, SignConvention::LeftToRight),
        ConductionTime::Defined(0.0)
    );
}

#[test]
fn test_run_is_persisted_and_reloadable() {
    let output = TempDir::new().unwrap();
    let config = straight_branch_config(&output);

    let outcome = BranchExperiment::from_config(&config)
        .unwrap()
        .run(solver())
        .unwrap();
    let run_dir = outcome.run_dir.clone().unwrap();
    assert!(run_dir.starts_with(output.path()));

    let store = RunStore::new(output.path());
    assert_eq!(store.load(&outcome.record.run_id).unwrap(), outcome.record);
    assert_eq!(store.load_series(&outcome.record.run_id).unwrap(), outcome.series);
}

#[test]
fn test_horizon_too_short_is_not_an_error() {
    let output = TempDir::new().unwrap();
    let mut config = straight_branch_config(&output);
    config.solver.duration = 20.0;
    config.run.persist = false;

    let outcome = BranchExperiment::from_config(&config)
        .unwrap()
        .run(solver())
        .unwrap();

    assert_eq!(outcome.record.active_left, ActivationTime::At(4.0));
    assert_eq!(outcome.record.active_right, ActivationTime::NotActivated);
    assert_eq!(outcome.conduction_time, ConductionTime::Undefined);
}

#[test]
fn test_disconnected_geometry_fails_before_solving() {
    let output = TempDir::new().unwrap();
    let mut config = straight_branch_config(&output);
    // One-cell-wide branch stepping four columns per row: three islands
    config.geometry = BranchGeometry::SingleSlope(SlopeBranchParams {
        l1: 20,
        w1: 2,
        l2: 3,
        w2: 1,
        l_solo: 2,
        slope: 0.25,
        scale: 1,
    });
    config.measurement.right_column = 15;

    let experiment = BranchExperiment::from_config(&config).unwrap();
    match experiment.run(solver()) {
        Err(ExperimentError::Geometry(GeometryError::Disconnected { components })) => {
            assert_eq!(components, 3)
        }
        other => panic!("expected disconnected geometry, got {:?}", other.map(|o| o.record)),
    }

    config.connectivity.require_connected = false;
    config.run.persist = false;
    let outcome = BranchExperiment::from_config(&config)
        .unwrap()
        .run(solver())
        .unwrap();
    assert_eq!(outcome.conduction_time, ConductionTime::Defined(10.0));
}

#[test]
fn test_invalid_config_rejected() {
    let output = TempDir::new().unwrap();
    let mut config = straight_branch_config(&output);
    config.measurement.right_column = 43;

    assert!(matches!(
        BranchExperiment::from_config(&config),
        Err(ExperimentError::Config(_))
    ));
}

/// Never finishes unless cancelled
struct StalledSolver;

impl CableSolver for StalledSolver {
    fn solve(&self, _request: &SolveRequest, cancel: &CancellationToken) -> SolverResult<TimeSeries> {
        loop {
            cancel.check()?;
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

#[test]
fn test_solver_timeout_is_solver_failure() {
    let output = TempDir::new().unwrap();
    let config = straight_branch_config(&output);
    let experiment = BranchExperiment::from_config(&config).unwrap();
    let runner = SolverRunner::new(Arc::new(StalledSolver)).with_timeout(Duration::from_millis(50));

    let err = experiment
        .run_with(&runner, &CancellationToken::new())
        .unwrap_err();
    assert!(err.is_solver_failure());
    assert!(matches!(
        err,
        ExperimentError::Solver(SolverError::TimedOut { .. })
    ));
    // Nothing persisted for a failed run
    assert!(RunStore::new(output.path()).load_all().unwrap().is_empty());
}
