// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for solver invocation and the experiment pipeline

use std::time::Duration;

use branchwave_analysis::AnalysisError;
use branchwave_config::ConfigError;
use branchwave_geometry::GeometryError;

/// Result type for solver invocations
pub type SolverResult<T> = Result<T, SolverError>;

/// Result type for experiment runs
pub type ExperimentResult<T> = Result<T, ExperimentError>;

/// Failures of the external solver.
///
/// A run that completes but never activates a strip is not a solver failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("Solver cancelled")]
    Cancelled,

    #[error("Solver timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error("Solver failed: {0}")]
    Failed(String),

    #[error("Solver panicked")]
    Panicked,

    #[error("Solver returned invalid output: {0}")]
    InvalidOutput(String),
}

/// Errors that can occur while running an experiment
#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Failed to persist run: {0}")]
    Persistence(String),
}

impl ExperimentError {
    /// True when the solver, not the geometry or analysis, failed
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, ExperimentError::Solver(_))
    }
}
