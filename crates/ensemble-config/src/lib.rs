// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Ensemble Configuration System
//!
//! Type-safe configuration loader for an ensemble processing element with
//! support for:
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//! - Validation of shapes, indices and decoder-row ownership
//! - Encoding of the system and PES configuration regions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ensemble_config::load_config;
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! println!("Neurons: {}", config.n_neurons());
//! println!("Timestep: {} us", config.system.machine_timestep_us);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod regions;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    CONFIG_FILE_NAME,
};
pub use regions::{pes_region_words, population_layout, pes_rule_set};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ensemble_neural::EnsembleError> for ConfigError {
    fn from(err: ensemble_neural::EnsembleError) -> Self {
        ConfigError::InvalidValue(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
