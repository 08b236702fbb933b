// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Seam to the external cable solver.

The electrophysiology itself lives outside this crate. A solver receives the
connectivity graph in interchange form (cell count plus `(source, target,
conductance)` triples, each edge bidirectional), the paced cells and the
integration settings, and returns one channel per cell.

Long solves must poll the [`CancellationToken`] and return
[`SolverError::Cancelled`] once it trips.
*/

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use branchwave_analysis::TimeSeries;
use branchwave_config::SolverConfig;
use branchwave_geometry::{CellId, ConnectivityGraph};
use serde::Serialize;

use crate::error::{SolverError, SolverResult};

/// Shared cancellation flag; clones observe the same flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once tripped, for `?` inside solver loops
    pub fn check(&self) -> SolverResult<()> {
        if self.is_cancelled() {
            Err(SolverError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One batch simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveRequest {
    pub cell_count: usize,
    /// `(source, target, conductance)`, each edge bidirectional
    pub edges: Vec<(usize, usize, f64)>,
    pub paced_cells: Vec<usize>,
    pub duration: f64,
    pub log_interval: f64,
    pub step_size: f64,
    pub double_precision: bool,
    pub model: BTreeMap<String, f64>,
}

impl SolveRequest {
    pub fn new(graph: &ConnectivityGraph, paced_cells: &[CellId], solver: &SolverConfig) -> Self {
        Self {
            cell_count: graph.cell_count(),
            edges: graph.edge_triples(),
            paced_cells: paced_cells.iter().map(|id| id.index()).collect(),
            duration: solver.duration,
            log_interval: solver.log_interval,
            step_size: solver.step_size,
            double_precision: solver.double_precision,
            model: solver.model.clone(),
        }
    }
}

/// External reaction-diffusion solver
pub trait CableSolver: Send + Sync {
    /// Name used for the worker thread and in logs
    fn name(&self) -> &str {
        "cable-solver"
    }

    /// Run the simulation; the series must carry one channel per cell in
    /// cell-id order
    fn solve(&self, request: &SolveRequest, cancel: &CancellationToken) -> SolverResult<TimeSeries>;
}
