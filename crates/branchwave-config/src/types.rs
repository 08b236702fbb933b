// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `branchwave_configuration.toml`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use branchwave_analysis::{MeasurementSettings, StimulationSettings};
pub use branchwave_geometry::BranchGeometry;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BranchwaveConfig {
    /// Tagged geometry (`kind = "single_angle"`, ...); a present section
    /// must list every dimension of its kind
    pub geometry: BranchGeometry,
    pub connectivity: ConnectivityConfig,
    pub stimulation: StimulationSettings,
    pub measurement: MeasurementSettings,
    pub solver: SolverConfig,
    pub run: RunConfig,
    pub logging: LoggingConfig,
}

/// Connectivity graph configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Uniform cell-to-cell conductance
    pub conductance: f64,
    /// Refuse to simulate a geometry that splits into several components
    pub require_connected: bool,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            conductance: 0.25,
            require_connected: true,
        }
    }
}

/// Channel conductance multipliers of the ORd model, all 1 by default
pub const DEFAULT_MODEL_MULTIPLIERS: [&str; 7] = [
    "ina_mult",
    "ito_mult",
    "ical_mult",
    "ikr_mult",
    "iks_mult",
    "inaca_mult",
    "tjca_mult",
];

/// Cable solver configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Simulated time horizon
    pub duration: f64,
    /// Interval between logged samples
    pub log_interval: f64,
    /// Integration time step
    pub step_size: f64,
    /// Wall-clock limit in seconds; 0 waits indefinitely
    pub timeout_secs: u64,
    /// 64-bit instead of 32-bit arithmetic in the solver
    pub double_precision: bool,
    /// Model parameters (conductance multipliers and the like), by name
    pub model: BTreeMap<String, f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let model = DEFAULT_MODEL_MULTIPLIERS
            .into_iter()
            .map(|name| (name.to_string(), 1.0))
            .collect();
        Self {
            duration: 1000.0,
            log_interval: 5.0,
            step_size: 2e-3,
            timeout_secs: 3600,
            double_precision: false,
            model,
        }
    }
}

/// Run naming and persistence
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub run_name: String,
    /// Root under which each run gets its own directory
    pub output_dir: PathBuf,
    /// Persist anything at all
    pub persist: bool,
    /// Also write the full voltage table
    pub save_voltage_data: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_name: "branch".to_string(),
            output_dir: PathBuf::from("output"),
            persist: true,
            save_voltage_data: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub log_dir: PathBuf,
    /// Also write JSON logs under `log_dir/run_<timestamp>/`
    pub file_logging: bool,
    /// Keep this many run folders in `log_dir`
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            file_logging: false,
            retention_runs: 10,
        }
    }
}
