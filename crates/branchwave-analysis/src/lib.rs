// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Branchwave Analysis
//!
//! Post-processing of solver output:
//! - **TimeSeries**: per-cell channels, ingested from `time, cell 0, ...` tables
//! - **Activation**: first threshold crossing of a strip's mean signal
//! - **Conduction**: delay between the left and right strip activations
//! - **Records**: per-run JSON records and the directory-per-run store
//! - **Sweep**: deterministic aggregation of many runs
//!
//! "Never activated" and "undefined delay" are ordinary values
//! ([`ActivationTime::NotActivated`], [`ConductionTime::Undefined`]), not
//! errors and never NaN.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod activation;
pub mod conduction;
pub mod error;
pub mod records;
pub mod sweep;
pub mod time_series;

pub use activation::{extract_activation_time, ActivationTime, ActivationTimeExtractor};
pub use conduction::{conduction_time, ConductionTime, SignConvention};
pub use error::{AnalysisError, AnalysisResult};
pub use records::{
    make_run_id, new_run_id, MeasurementSettings, RunRecord, RunStore, StimulationSettings,
    RUN_RECORD_FILE, VOLTAGE_FILE,
};
pub use sweep::{
    ConductionRecord, SweepKey, SweepSeries, SweepTable, DEFAULT_SWEEP_KEYS, SWEEP_CSV_HEADER,
};
pub use time_series::{channel_name, parse_channel_name, TimeSeries, CELL_COLUMN_PREFIX, TIME_COLUMN};
