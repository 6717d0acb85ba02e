// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module checks that configuration values are consistent before any
//! state is allocated. The learning engine relies on these checks: it never
//! validates error signal indices or decoder row ranges at runtime.

use crate::{ConfigError, ConfigResult, EnsembleConfig, FilterKind};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    PopulationMismatch { declared: u32, sum: u64 },
    ShapeMismatch { field: String, expected: u64, actual: u64 },
    IndexOutOfRange { field: String, index: u64, limit: u64 },
    OverlappingDecoderRows { first_rule: usize, second_rule: usize },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PopulationMismatch { declared, sum } => {
                write!(
                    f,
                    "Population lengths sum to {} but populations.n_neurons = {}",
                    sum, declared
                )
            }
            Self::ShapeMismatch {
                field,
                expected,
                actual,
            } => {
                write!(f, "{} has {} values, expected {}", field, actual, expected)
            }
            Self::IndexOutOfRange {
                field,
                index,
                limit,
            } => {
                write!(f, "{} = {} is out of range (limit {})", field, index, limit)
            }
            Self::OverlappingDecoderRows {
                first_rule,
                second_rule,
            } => {
                write!(
                    f,
                    "PES rules {} and {} update overlapping decoder rows",
                    first_rule, second_rule
                )
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
/// - Population lengths matching the declared neuron count
/// - Neuron, encoder and decoder shapes
/// - Filter dimensions
/// - PES error signal indices, decoder row ranges and row ownership
/// - Positive timing values
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &EnsembleConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_populations(config, &mut errors);
    validate_shapes(config, &mut errors);
    validate_filters(config, &mut errors);
    validate_pes_rules(config, &mut errors);
    validate_value_ranges(config, &mut errors);

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

fn validate_populations(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    let sum = config.n_neurons();
    if config.populations.lengths.is_empty() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "populations.lengths".to_string(),
            reason: "at least one population is required".to_string(),
        });
    }
    if sum > u64::from(u32::MAX) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "populations.lengths".to_string(),
            reason: format!("{} neurons exceed the addressable column range", sum),
        });
    }
    if let Some(declared) = config.populations.n_neurons {
        if u64::from(declared) != sum {
            errors.push(ConfigValidationError::PopulationMismatch { declared, sum });
        }
    }
}

fn check_optional_len(
    field: &str,
    actual: usize,
    expected: u64,
    errors: &mut Vec<ConfigValidationError>,
) {
    if actual != 0 && actual as u64 != expected {
        errors.push(ConfigValidationError::ShapeMismatch {
            field: field.to_string(),
            expected,
            actual: actual as u64,
        });
    }
}

fn validate_shapes(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    let n_neurons = config.n_neurons();
    let neurons = &config.neurons;

    check_optional_len("neurons.gains", neurons.gains.len(), n_neurons, errors);
    check_optional_len("neurons.biases", neurons.biases.len(), n_neurons, errors);
    check_optional_len(
        "neurons.encoders",
        neurons.encoders.len(),
        n_neurons.saturating_mul(u64::from(config.system.n_input_dimensions)),
        errors,
    );
    check_optional_len(
        "decoders.values",
        config.decoders.values.len(),
        n_neurons.saturating_mul(u64::from(config.system.n_output_dimensions)),
        errors,
    );
    check_optional_len(
        "transmission.keys",
        config.transmission.keys.len(),
        u64::from(config.system.n_output_dimensions),
        errors,
    );
}

fn validate_filters(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    for (index, filter) in config.modulatory_filters.iter().enumerate() {
        if filter.dimensions == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("modulatory_filters[{}].dimensions", index),
                reason: "must be > 0".to_string(),
            });
        }
        if filter.time_constant < 0.0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("modulatory_filters[{}].time_constant", index),
                reason: "must be >= 0".to_string(),
            });
        }
    }

    for (index, filter) in config.input_filters.iter().enumerate() {
        let expected = match filter.kind {
            FilterKind::Input | FilterKind::LearntEncoder => config.system.n_input_dimensions,
            FilterKind::Inhibitory => 1,
        };
        if filter.dimensions != expected {
            errors.push(ConfigValidationError::ShapeMismatch {
                field: format!("input_filters[{}].dimensions", index),
                expected: u64::from(expected),
                actual: u64::from(filter.dimensions),
            });
        }
        if filter.time_constant < 0.0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("input_filters[{}].time_constant", index),
                reason: "must be >= 0".to_string(),
            });
        }
    }
}

fn validate_pes_rules(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    let n_filters = config.modulatory_filters.len();
    let n_rows = u64::from(config.system.n_output_dimensions);
    let mut ranges: Vec<(usize, u64, u64)> = Vec::new();

    for (index, rule) in config.pes_rules.iter().enumerate() {
        if rule.activity_filter_index < -1 {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("pes_rules[{}].activity_filter_index", index),
                reason: "must be -1 (unfiltered) or a filter index".to_string(),
            });
        }

        let Some(filter) = config
            .modulatory_filters
            .get(rule.error_signal_index as usize)
        else {
            errors.push(ConfigValidationError::IndexOutOfRange {
                field: format!("pes_rules[{}].error_signal_index", index),
                index: u64::from(rule.error_signal_index),
                limit: n_filters as u64,
            });
            continue;
        };

        let start = u64::from(rule.decoder_row);
        let end = start + u64::from(filter.dimensions);
        if end > n_rows {
            errors.push(ConfigValidationError::IndexOutOfRange {
                field: format!("pes_rules[{}].decoder_row", index),
                index: end,
                limit: n_rows,
            });
        }

        for &(other, other_start, other_end) in &ranges {
            if start < other_end && other_start < end {
                errors.push(ConfigValidationError::OverlappingDecoderRows {
                    first_rule: other,
                    second_rule: index,
                });
            }
        }
        ranges.push((index, start, end));
    }
}

fn validate_value_ranges(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.system.machine_timestep_us == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "system.machine_timestep_us".to_string(),
            reason: "must be > 0".to_string(),
        });
    }
    if config.system.tau_rc <= 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "system.tau_rc".to_string(),
            reason: "must be > 0".to_string(),
        });
    }
    if config.system.tau_ref < 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "system.tau_ref".to_string(),
            reason: "must be >= 0".to_string(),
        });
    }
    if config.transmission.delay == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "transmission.delay".to_string(),
            reason: "must be > 0".to_string(),
        });
    }
}
