// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{BranchwaveConfig, ConfigError, ConfigResult};
use branchwave_geometry::{BranchGeometry, StimulationSide};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the configuration file searched for on disk
pub const CONFIG_FILE_NAME: &str = "branchwave_configuration.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "BRANCHWAVE_CONFIG_PATH";

/// Find the branchwave configuration file
///
/// Search order:
/// 1. `BRANCHWAVE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./branchwave_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        search_paths.extend(cwd.ancestors().skip(1).take(5).map(|dir| dir.join(CONFIG_FILE_NAME)));
    }

    if let Some(path) = search_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found, contains invalid TOML, or
/// an override value cannot be parsed. Call
/// [`validate_config`](crate::validate_config) on the result before use.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<BranchwaveConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config = load_config_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Parse configuration from TOML text, without overrides
pub fn load_config_str(content: &str) -> ConfigResult<BranchwaveConfig> {
    Ok(toml::from_str(content)?)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `BRANCHWAVE_RUN_NAME` -> `run.run_name`
/// - `BRANCHWAVE_OUTPUT_DIR` -> `run.output_dir`
/// - `BRANCHWAVE_LOG_LEVEL` -> `logging.level`
/// - `BRANCHWAVE_SOLVER_TIMEOUT_SECS` -> `solver.timeout_secs`
/// - `BRANCHWAVE_CONDUCTANCE` -> `connectivity.conductance`
pub fn apply_environment_overrides(config: &mut BranchwaveConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("BRANCHWAVE_RUN_NAME") {
        config.run.run_name = value;
    }
    if let Ok(value) = env::var("BRANCHWAVE_OUTPUT_DIR") {
        config.run.output_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("BRANCHWAVE_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("BRANCHWAVE_SOLVER_TIMEOUT_SECS") {
        config.solver.timeout_secs = parse_value("BRANCHWAVE_SOLVER_TIMEOUT_SECS", &value)?;
    }
    if let Ok(value) = env::var("BRANCHWAVE_CONDUCTANCE") {
        config.connectivity.conductance = parse_value("BRANCHWAVE_CONDUCTANCE", &value)?;
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"theta": "120", "run_name": "sweep"}`)
///
/// Keys that are not configuration keys are ignored. A geometry dimension
/// that does not exist for the configured geometry kind (`theta` on a slope
/// geometry, say) is an error.
pub fn apply_cli_overrides(
    config: &mut BranchwaveConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        let key = key.as_str();
        match key {
            "l1" | "w1" | "h" | "l2" | "w2" | "l_solo" | "slope" | "theta" | "scale" => {
                set_geometry_value(&mut config.geometry, key, value)?
            }
            "conductance" => config.connectivity.conductance = parse_value(key, value)?,
            "require_connected" => config.connectivity.require_connected = parse_flag(key, value)?,
            "stim_width" => config.stimulation.width = parse_value(key, value)?,
            "stim_side" => config.stimulation.side = parse_value::<StimulationSide>(key, value)?,
            "threshold" => config.measurement.threshold = parse_value(key, value)?,
            "left_column" => config.measurement.left_column = parse_value(key, value)?,
            "right_column" => config.measurement.right_column = parse_value(key, value)?,
            "duration" => config.solver.duration = parse_value(key, value)?,
            "log_interval" => config.solver.log_interval = parse_value(key, value)?,
            "step_size" => config.solver.step_size = parse_value(key, value)?,
            "timeout_secs" => config.solver.timeout_secs = parse_value(key, value)?,
            "run_name" => config.run.run_name = value.clone(),
            "output_dir" => config.run.output_dir = PathBuf::from(value),
            "save_voltage_data" => config.run.save_voltage_data = parse_flag(key, value)?,
            "log_level" => config.logging.level = value.clone(),
            _ => {}
        }
    }
    Ok(())
}

fn set_geometry_value(geometry: &mut BranchGeometry, key: &str, value: &str) -> ConfigResult<()> {
    let kind = geometry.kind();
    match geometry {
        BranchGeometry::SingleSlope(p) | BranchGeometry::DoubleSlope(p) => match key {
            "l1" => p.l1 = parse_value(key, value)?,
            "w1" => p.w1 = parse_value(key, value)?,
            "l2" => p.l2 = parse_value(key, value)?,
            "w2" => p.w2 = parse_value(key, value)?,
            "l_solo" => p.l_solo = parse_value(key, value)?,
            "slope" => p.slope = parse_value(key, value)?,
            "scale" => p.scale = parse_value(key, value)?,
            _ => return Err(not_applicable(key, kind)),
        },
        BranchGeometry::SingleAngle(p) | BranchGeometry::DoubleAngle(p) => match key {
            "l1" => p.l1 = parse_value(key, value)?,
            "w1" => p.w1 = parse_value(key, value)?,
            "h" => p.h = parse_value(key, value)?,
            "w2" => p.w2 = parse_value(key, value)?,
            "theta" => p.theta = parse_value(key, value)?,
            "scale" => p.scale = parse_value(key, value)?,
            _ => return Err(not_applicable(key, kind)),
        },
    }
    Ok(())
}

fn not_applicable(key: &str, kind: &str) -> ConfigError {
    ConfigError::InvalidValue(format!("'{}' does not apply to {} geometry", key, kind))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!("{} = '{}'", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchwave_geometry::AngleBranchParams;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 5] = [
        "BRANCHWAVE_RUN_NAME",
        "BRANCHWAVE_OUTPUT_DIR",
        "BRANCHWAVE_LOG_LEVEL",
        "BRANCHWAVE_SOLVER_TIMEOUT_SECS",
        "BRANCHWAVE_CONDUCTANCE",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    fn angle(config: &BranchwaveConfig) -> &AngleBranchParams {
        match &config.geometry {
            BranchGeometry::SingleAngle(p) | BranchGeometry::DoubleAngle(p) => p,
            other => panic!("expected angled geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var(CONFIG_PATH_ENV, "/definitely/not/here.toml");
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[geometry]").unwrap();
        writeln!(file, "kind = \"double_angle\"").unwrap();
        writeln!(file, "l1 = 8").unwrap();
        writeln!(file, "w1 = 3").unwrap();
        writeln!(file, "h = 5").unwrap();
        writeln!(file, "w2 = 3").unwrap();
        writeln!(file, "theta = 30.0").unwrap();
        writeln!(file, "[measurement]").unwrap();
        writeln!(file, "threshold = 0.5").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.geometry.kind(), "double_angle");
        assert_eq!(angle(&config).scale, 1);
        assert_eq!(config.measurement.threshold, 0.5);
        // untouched sections keep their defaults
        assert_eq!(config.measurement.left_column, 20);
        assert_eq!(config.connectivity.conductance, 0.25);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            load_config_str("[geometry\nkind ="),
            Err(ConfigError::ParseError(_))
        ));
        // unknown geometry kind
        assert!(matches!(
            load_config_str("[geometry]\nkind = \"triple\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = BranchwaveConfig::default();

        env::set_var("BRANCHWAVE_RUN_NAME", "env-run");
        env::set_var("BRANCHWAVE_CONDUCTANCE", "0.5");
        env::set_var("BRANCHWAVE_SOLVER_TIMEOUT_SECS", "60");

        let result = apply_environment_overrides(&mut config);
        clear_override_vars();

        result.unwrap();
        assert_eq!(config.run.run_name, "env-run");
        assert_eq!(config.connectivity.conductance, 0.5);
        assert_eq!(config.solver.timeout_secs, 60);
    }

    #[test]
    fn test_environment_override_unparsable() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = BranchwaveConfig::default();

        env::set_var("BRANCHWAVE_CONDUCTANCE", "quarter");
        let result = apply_environment_overrides(&mut config);
        clear_override_vars();

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = BranchwaveConfig::default();
        let cli_args = HashMap::from([
            ("theta".to_string(), "120".to_string()),
            ("w2".to_string(), "7".to_string()),
            ("stim_side".to_string(), "right".to_string()),
            ("run_name".to_string(), "cli-run".to_string()),
            ("unrelated_flag".to_string(), "whatever".to_string()),
        ]);

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(angle(&config).theta, 120.0);
        assert_eq!(angle(&config).w2, 7);
        assert_eq!(config.stimulation.side, StimulationSide::Right);
        assert_eq!(config.run.run_name, "cli-run");
    }

    #[test]
    fn test_cli_override_for_other_geometry_kind() {
        let mut config = BranchwaveConfig::default();
        let cli_args = HashMap::from([("slope".to_string(), "2.0".to_string())]);
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_cli_flag_overrides() {
        let mut config = BranchwaveConfig::default();
        let cli_args = HashMap::from([
            ("require_connected".to_string(), "No".to_string()),
            ("save_voltage_data".to_string(), "1".to_string()),
        ]);
        apply_cli_overrides(&mut config, &cli_args).unwrap();
        assert!(!config.connectivity.require_connected);
        assert!(config.run.save_voltage_data);

        let mut config = BranchwaveConfig::default();
        let cli_args = HashMap::from([("require_connected".to_string(), "ture".to_string())]);
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(config.connectivity.require_connected);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[run]").unwrap();
        writeln!(file, "run_name = \"file-run\"").unwrap();
        writeln!(file, "[connectivity]").unwrap();
        writeln!(file, "conductance = 0.1").unwrap();

        env::set_var("BRANCHWAVE_RUN_NAME", "env-run");
        env::set_var("BRANCHWAVE_CONDUCTANCE", "0.2");

        let cli_args = HashMap::from([("run_name".to_string(), "cli-run".to_string())]);
        let config = load_config(Some(&config_path), Some(&cli_args));
        clear_override_vars();
        let config = config.unwrap();

        // CLI wins for run name, env wins for conductance (no CLI override)
        assert_eq!(config.run.run_name, "cli-run");
        assert_eq!(config.connectivity.conductance, 0.2);
    }
}
