// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
The branch conduction experiment.

Pipeline: rasterize the geometry, build the connectivity graph, require it to
be connected, resolve the paced cells, solve, extract the activation time of
the left and right measurement strips, and record the run.
*/

use std::path::PathBuf;
use std::sync::Arc;

use branchwave_analysis::{
    new_run_id, ActivationTimeExtractor, ConductionTime, RunRecord, RunStore, SignConvention,
    TimeSeries,
};
use branchwave_config::{validate_config, BranchwaveConfig};
use branchwave_geometry::{
    build_connectivity, main_channel_columns, stimulation_region, CellId, CellRegion,
    ConnectivityGraph, GeometryAdvisory,
};
use tracing::{info, warn};

use crate::error::{ExperimentError, ExperimentResult};
use crate::runner::SolverRunner;
use crate::solver::{CableSolver, CancellationToken, SolveRequest};

/// Geometry-side artifacts of an experiment, ready to hand to a solver
#[derive(Debug, Clone)]
pub struct PreparedExperiment {
    pub graph: ConnectivityGraph,
    pub advisories: Vec<GeometryAdvisory>,
    pub stimulation: CellRegion,
    pub paced_cells: Vec<CellId>,
    pub left_strip: CellRegion,
    pub right_strip: CellRegion,
}

/// Result of one experiment run
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub record: RunRecord,
    /// `right - left`, left-to-right convention
    pub conduction_time: ConductionTime,
    pub advisories: Vec<GeometryAdvisory>,
    pub series: TimeSeries,
    /// Where the run was persisted, if it was
    pub run_dir: Option<PathBuf>,
}

/// One configured branch experiment
#[derive(Debug, Clone)]
pub struct BranchExperiment {
    config: BranchwaveConfig,
}

impl BranchExperiment {
    /// Validate `config` and wrap it
    pub fn from_config(config: &BranchwaveConfig) -> ExperimentResult<Self> {
        validate_config(config)?;
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &BranchwaveConfig {
        &self.config
    }

    /// Rasterize, build and check the graph, and resolve the strips
    pub fn prepare(&self) -> ExperimentResult<PreparedExperiment> {
        let config = &self.config;
        let geometry = &config.geometry;

        let rasterization = geometry.rasterize()?;
        for advisory in &rasterization.advisories {
            warn!("[EXPERIMENT] {}", advisory);
        }

        let graph = build_connectivity(&rasterization.mesh, config.connectivity.conductance)?;
        if config.connectivity.require_connected {
            graph.ensure_connected()?;
        } else if !graph.is_connected() {
            warn!(
                "[EXPERIMENT] Geometry splits into {} components; simulating anyway",
                graph.connected_components().len()
            );
        }

        let stimulation =
            stimulation_region(geometry, config.stimulation.side, config.stimulation.width)?;
        let paced_cells = graph.index().resolve_region(&stimulation)?;

        let measurement = &config.measurement;
        let left_strip = main_channel_columns(geometry, "left", [measurement.left_column])?;
        let right_strip = main_channel_columns(geometry, "right", [measurement.right_column])?;
        // Fail before the solve rather than after it
        graph.index().resolve_region(&left_strip)?;
        graph.index().resolve_region(&right_strip)?;

        info!(
            "[EXPERIMENT] Prepared {} geometry: {} cells, {} edges, {} paced cells ({})",
            geometry.kind(),
            graph.cell_count(),
            graph.edge_count(),
            paced_cells.len(),
            config.stimulation.side
        );

        Ok(PreparedExperiment {
            graph,
            advisories: rasterization.advisories,
            stimulation,
            paced_cells,
            left_strip,
            right_strip,
        })
    }

    /// Run with the configured timeout
    pub fn run(&self, solver: Arc<dyn CableSolver>) -> ExperimentResult<ExperimentOutcome> {
        let runner = SolverRunner::new(solver).with_timeout_secs(self.config.solver.timeout_secs);
        self.run_with(&runner, &CancellationToken::new())
    }

    /// Run the full pipeline through `runner`, honouring `cancel`
    pub fn run_with(
        &self,
        runner: &SolverRunner,
        cancel: &CancellationToken,
    ) -> ExperimentResult<ExperimentOutcome> {
        let config = &self.config;
        let prepared = self.prepare()?;

        let request = SolveRequest::new(&prepared.graph, &prepared.paced_cells, &config.solver);
        let series = runner.run_with_token(request, cancel)?;

        let extractor =
            ActivationTimeExtractor::new(prepared.graph.index(), config.measurement.threshold);
        let active_left = extractor.extract(&series, &prepared.left_strip)?;
        let active_right = extractor.extract(&series, &prepared.right_strip)?;

        let record = RunRecord {
            run_id: new_run_id(&config.run.run_name),
            geometry: config.geometry.clone(),
            conductance: config.connectivity.conductance,
            stimulation: config.stimulation.clone(),
            measurement: config.measurement.clone(),
            model: config.solver.model.clone(),
            active_left,
            active_right,
        };
        let conduction_time = record.conduction_time(SignConvention::default());

        info!(
            "[EXPERIMENT] Run {}: left {}, right {}, conduction time {}",
            record.run_id,
            active_left,
            active_right,
            conduction_time
        );

        let run_dir = if config.run.persist {
            let store = RunStore::new(&config.run.output_dir);
            let voltage = config.run.save_voltage_data.then_some(&series);
            let dir = store
                .save(&record, voltage)
                .map_err(|e| ExperimentError::Persistence(e.to_string()))?;
            Some(dir)
        } else {
            None
        };

        Ok(ExperimentOutcome {
            record,
            conduction_time,
            advisories: prepared.advisories,
            series,
            run_dir,
        })
    }
}
