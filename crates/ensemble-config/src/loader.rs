// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)
//!
//! The merged result is validated before it is returned.

use crate::validation::validate_config;
use crate::{ConfigError, ConfigResult, EnsembleConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "ensemble_configuration.toml";

/// Find the ensemble configuration file
///
/// Search order:
/// 1. `ENSEMBLE_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("ENSEMBLE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by ENSEMBLE_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Ensemble configuration file '{}' not found in any of these locations:\n{}\n\nSet ENSEMBLE_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load, override and validate the configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<EnsembleConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: EnsembleConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ENSEMBLE_TIMESTEP_US` -> `system.machine_timestep_us`
/// - `ENSEMBLE_LOG_LEVEL` -> `logging.level`
/// - `ENSEMBLE_RECORD_SPIKES` -> `recording.record_spikes`
/// - `ENSEMBLE_TRANSMISSION_DELAY` -> `transmission.delay`
pub fn apply_environment_overrides(config: &mut EnsembleConfig) {
    if let Ok(value) = env::var("ENSEMBLE_TIMESTEP_US") {
        if let Ok(timestep) = value.parse::<u32>() {
            config.system.machine_timestep_us = timestep;
        }
    }
    if let Ok(value) = env::var("ENSEMBLE_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("ENSEMBLE_RECORD_SPIKES") {
        config.recording.record_spikes = parse_flag(&value);
    }
    if let Ok(value) = env::var("ENSEMBLE_TRANSMISSION_DELAY") {
        if let Ok(delay) = value.parse::<u32>() {
            config.transmission.delay = delay;
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// Recognised keys: `timestep_us`, `log_level`, `record_spikes`,
/// `transmission_delay`, `real_time`, `log_dir`.
pub fn apply_cli_overrides(config: &mut EnsembleConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("timestep_us") {
        if let Ok(timestep) = value.parse::<u32>() {
            config.system.machine_timestep_us = timestep;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("record_spikes") {
        config.recording.record_spikes = parse_flag(value);
    }
    if let Some(value) = cli_args.get("transmission_delay") {
        if let Ok(delay) = value.parse::<u32>() {
            config.transmission.delay = delay;
        }
    }
    if let Some(value) = cli_args.get("real_time") {
        config.system.real_time = parse_flag(value);
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 4] = [
        "ENSEMBLE_TIMESTEP_US",
        "ENSEMBLE_LOG_LEVEL",
        "ENSEMBLE_RECORD_SPIKES",
        "ENSEMBLE_TRANSMISSION_DELAY",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("ENSEMBLE_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("ENSEMBLE_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");

        env::set_var("ENSEMBLE_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("ENSEMBLE_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[system]").unwrap();
        writeln!(file, "machine_timestep_us = 250").unwrap();
        writeln!(file, "[populations]").unwrap();
        writeln!(file, "lengths = [10, 20]").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.system.machine_timestep_us, 250);
        assert_eq!(config.n_neurons(), 30);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[system\nbroken").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = EnsembleConfig::default();

        env::set_var("ENSEMBLE_TIMESTEP_US", "2000");
        env::set_var("ENSEMBLE_RECORD_SPIKES", "yes");
        env::set_var("ENSEMBLE_TRANSMISSION_DELAY", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.system.machine_timestep_us, 2000);
        assert!(config.recording.record_spikes);
        assert_eq!(config.transmission.delay, 1);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = EnsembleConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("transmission_delay".to_string(), "8".to_string());
        cli_args.insert("real_time".to_string(), "false".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.transmission.delay, 8);
        assert!(!config.system.real_time);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();
        writeln!(file, "[transmission]").unwrap();
        writeln!(file, "delay = 2").unwrap();

        env::set_var("ENSEMBLE_LOG_LEVEL", "debug");
        env::set_var("ENSEMBLE_TRANSMISSION_DELAY", "3");

        let mut cli_args = HashMap::new();
        cli_args.insert("log_level".to_string(), "trace".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for the level, env wins for the delay (no CLI override)
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.transmission.delay, 3);
    }
}
