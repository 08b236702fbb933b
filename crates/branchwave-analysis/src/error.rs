// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use branchwave_geometry::{CellId, GeometryError};
use thiserror::Error;

/// Analysis errors.
///
/// A strip that never crosses its threshold is NOT an error; see
/// [`ActivationTime::NotActivated`](crate::ActivationTime::NotActivated).
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Time series has no 'time' column")]
    MissingTimeColumn,

    #[error("Invalid column '{0}': expected 'time' or 'cell <index>'")]
    InvalidColumn(String),

    #[error("Channel for {0} appears more than once")]
    DuplicateChannel(CellId),

    #[error("No channel for {0}: channels must cover cell 0..{1} without gaps")]
    MissingChannel(CellId, usize),

    #[error("Time must be finite and non-decreasing: sample {index} has t={time} after t={previous}")]
    NonMonotonicTime {
        index: usize,
        time: f64,
        previous: f64,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Measurement strip '{0}' contains no cells")]
    EmptyStrip(String),

    #[error("Invalid value '{value}' in row {row}, column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
