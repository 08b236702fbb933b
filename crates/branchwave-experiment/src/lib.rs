// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Branchwave Experiment
//!
//! Orchestrates one conduction experiment end to end:
//! - **Solver seam**: [`CableSolver`] trait implemented by the external
//!   reaction-diffusion solver, with [`CancellationToken`]
//! - **Runner**: [`SolverRunner`] runs a solver on a worker thread with a
//!   wall-clock limit
//! - **Pipeline**: [`BranchExperiment`] from configuration to
//!   [`ExperimentOutcome`], persisted through the analysis run store
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use branchwave_config::BranchwaveConfig;
//! use branchwave_experiment::{BranchExperiment, CableSolver};
//!
//! # fn solver() -> Arc<dyn CableSolver> { unimplemented!() }
//! let experiment = BranchExperiment::from_config(&BranchwaveConfig::default())?;
//! let outcome = experiment.run(solver())?;
//! println!("conduction time: {}", outcome.conduction_time);
//! # Ok::<(), branchwave_experiment::ExperimentError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod experiment;
pub mod runner;
pub mod solver;

pub use error::{ExperimentError, ExperimentResult, SolverError, SolverResult};
pub use experiment::{BranchExperiment, ExperimentOutcome, PreparedExperiment};
pub use runner::SolverRunner;
pub use solver::{CableSolver, CancellationToken, SolveRequest};
