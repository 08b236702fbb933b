// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module checks that configuration values are within range and
//! consistent with the configured geometry (measurement columns inside the
//! grid, stimulation narrower than the channel, and so on).

use crate::{BranchwaveConfig, ConfigError, ConfigResult};

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Geometry parameters that can be rasterized
/// - Measurement and stimulation strips inside the grid
/// - Positive finite conductance and solver times
/// - Required names and a known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &BranchwaveConfig) -> ConfigResult<()> {
    let errors = collect_validation_errors(config);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

/// Every validation problem in `config`, in section order
pub fn collect_validation_errors(config: &BranchwaveConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    validate_geometry(config, &mut errors);
    validate_connectivity(config, &mut errors);
    validate_solver(config, &mut errors);
    validate_required_fields(config, &mut errors);

    errors
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Geometry plus everything placed on it
fn validate_geometry(config: &BranchwaveConfig, errors: &mut Vec<ConfigValidationError>) {
    let cols = match config.geometry.grid_shape() {
        Ok((_, cols)) => cols,
        Err(e) => {
            // Strip checks need a grid width
            errors.push(invalid("geometry", e.to_string()));
            return;
        }
    };

    let measurement = &config.measurement;
    for (field, column) in [
        ("measurement.left_column", measurement.left_column),
        ("measurement.right_column", measurement.right_column),
    ] {
        if column >= cols {
            errors.push(invalid(
                field,
                format!("column {} is outside the grid width {}", column, cols),
            ));
        }
    }
    if measurement.left_column == measurement.right_column {
        errors.push(invalid(
            "measurement.right_column",
            "must differ from measurement.left_column",
        ));
    }
    if !measurement.threshold.is_finite() {
        errors.push(invalid("measurement.threshold", "must be finite"));
    }

    let width = config.stimulation.width;
    if width == 0 || width > cols {
        errors.push(invalid(
            "stimulation.width",
            format!("{} must be between 1 and the grid width {}", width, cols),
        ));
    }
}

fn validate_connectivity(config: &BranchwaveConfig, errors: &mut Vec<ConfigValidationError>) {
    let conductance = config.connectivity.conductance;
    if !conductance.is_finite() || conductance <= 0.0 {
        errors.push(invalid(
            "connectivity.conductance",
            format!("{} must be positive and finite", conductance),
        ));
    }
}

fn validate_solver(config: &BranchwaveConfig, errors: &mut Vec<ConfigValidationError>) {
    let solver = &config.solver;
    let times = [
        ("solver.duration", solver.duration),
        ("solver.log_interval", solver.log_interval),
        ("solver.step_size", solver.step_size),
    ];

    let mut all_positive = true;
    for (field, value) in times {
        if !value.is_finite() || value <= 0.0 {
            errors.push(invalid(field, format!("{} must be positive and finite", value)));
            all_positive = false;
        }
    }

    if all_positive {
        if solver.step_size > solver.log_interval {
            errors.push(invalid(
                "solver.step_size",
                "must not exceed solver.log_interval",
            ));
        }
        if solver.log_interval > solver.duration {
            errors.push(invalid(
                "solver.log_interval",
                "must not exceed solver.duration",
            ));
        }
    }

    for (name, value) in &solver.model {
        if !value.is_finite() {
            errors.push(invalid(&format!("solver.model.{}", name), "must be finite"));
        }
    }
}

fn validate_required_fields(config: &BranchwaveConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.run.run_name.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "run.run_name".to_string(),
        });
    }

    if config.run.output_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "run.output_dir".to_string(),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(invalid(
            "logging.level",
            format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
}
