//! # Branchwave - conduction experiments on branching channels
//!
//! Branchwave turns a parametric branching-channel geometry into the cell
//! network an excitable-tissue solver consumes, and turns the solver's
//! voltage traces back into activation and conduction times.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! branchwave = "0.1"  # Default: everything but file logging
//! ```
//!
//! ## Feature Flags
//!
//! - **`experiment`** (default): solver seam, experiment pipeline
//! - **`observability`** (default): tracing subscriber setup and per-crate debug flags
//! - **`file-logging`**: JSON log files per run, via `tracing-appender`
//!
//! ## Usage Examples
//!
//! ### Geometry to solver interchange
//!
//! ```rust
//! use branchwave::prelude::*;
//!
//! let geometry = BranchGeometry::DoubleAngle(AngleBranchParams {
//!     l1: 8,
//!     w1: 3,
//!     h: 5,
//!     w2: 3,
//!     theta: 30.0,
//!     scale: 1,
//! });
//! let raster = geometry.rasterize()?;
//! let graph = build_connectivity(&raster.mesh, 0.25)?;
//!
//! assert_eq!(graph.cell_count(), 126);
//! assert_eq!(graph.edge_count(), 203);
//! let edges = graph.edge_triples(); // (source, target, conductance)
//! # let _ = edges;
//! # Ok::<(), GeometryError>(())
//! ```
//!
//! ### Conduction time from a voltage table
//!
//! ```rust,no_run
//! use branchwave::prelude::*;
//!
//! let config = BranchwaveConfig::default();
//! let raster = config.geometry.rasterize()?;
//! let graph = build_connectivity(&raster.mesh, config.connectivity.conductance)?;
//!
//! let series = TimeSeries::from_csv_path("df_voltage.csv")?;
//! let extractor = ActivationTimeExtractor::new(graph.index(), 0.0);
//! let left = main_channel_columns(&config.geometry, "left", [20])?;
//! let right = main_channel_columns(&config.geometry, "right", [120])?;
//!
//! let delay = conduction_time(
//!     extractor.extract(&series, &left)?,
//!     extractor.extract(&series, &right)?,
//!     SignConvention::LeftToRight,
//! );
//! println!("conduction time: {}", delay);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: branchwave-geometry                        │
//! │  (rasterizer, cell index, connectivity graph, regions)  │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Analysis: branchwave-analysis                          │
//! │  (time series, activation, conduction, run store)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Configuration: branchwave-config                       │
//! │  (TOML + environment + CLI overrides)                   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Orchestration: branchwave-experiment                   │
//! │  (external solver seam, pipeline)                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

// Re-export foundation
pub use branchwave_geometry as geometry;

// Re-export analysis and configuration
pub use branchwave_analysis as analysis;
pub use branchwave_config as config;

// Re-export orchestration
#[cfg(feature = "experiment")]
pub use branchwave_experiment as experiment;

#[cfg(feature = "observability")]
pub use branchwave_observability as observability;

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::geometry::{
        build_connectivity, main_channel_columns, stimulation_region, AngleBranchParams,
        BranchGeometry, CellId, CellIndex, CellRegion, ConnectivityGraph, GeometryAdvisory,
        GeometryError, GridPos, Mesh, SlopeBranchParams, StimulationSide,
    };

    pub use crate::analysis::{
        conduction_time, extract_activation_time, ActivationTime, ActivationTimeExtractor,
        ConductionTime, RunRecord, RunStore, SignConvention, SweepKey, SweepTable, TimeSeries,
    };

    pub use crate::config::{load_config, validate_config, BranchwaveConfig};

    #[cfg(feature = "experiment")]
    pub use crate::experiment::{
        BranchExperiment, CableSolver, CancellationToken, ExperimentOutcome, SolveRequest,
        SolverError, SolverRunner,
    };
}
