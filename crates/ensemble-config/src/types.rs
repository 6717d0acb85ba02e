// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `ensemble_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub system: SystemConfig,
    pub populations: PopulationsConfig,
    pub neurons: NeuronsConfig,
    pub decoders: DecodersConfig,
    pub pes_rules: Vec<PesRuleConfig>,
    pub modulatory_filters: Vec<FilterConfig>,
    pub input_filters: Vec<InputFilterConfig>,
    pub transmission: TransmissionConfig,
    pub recording: RecordingConfig,
    pub logging: LoggingConfig,
}

impl EnsembleConfig {
    /// Total neuron count (sum of population lengths)
    pub fn n_neurons(&self) -> u64 {
        self.populations.lengths.iter().map(|&l| u64::from(l)).sum()
    }

    /// Tick length in seconds
    pub fn dt(&self) -> f32 {
        self.system.machine_timestep_us as f32 * 1e-6
    }

    /// Input filters of one kind, in declared order
    pub fn input_filters_of(
        &self,
        kind: FilterKind,
    ) -> impl Iterator<Item = &InputFilterConfig> {
        self.input_filters.iter().filter(move |f| f.kind == kind)
    }
}

/// Ensemble-wide parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Dimensionality of the represented input vector
    pub n_input_dimensions: u32,
    /// Decoder rows (output vector length)
    pub n_output_dimensions: u32,
    /// Tick period in microseconds
    pub machine_timestep_us: u32,
    /// Refractory period in seconds
    pub tau_ref: f32,
    /// Membrane time constant in seconds
    pub tau_rc: f32,
    /// Pace ticks against the wall clock; `false` runs back-to-back
    pub real_time: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            n_input_dimensions: 1,
            n_output_dimensions: 1,
            machine_timestep_us: 1000,
            tau_ref: 0.002,
            tau_rc: 0.02,
            real_time: true,
        }
    }
}

/// Population partition of the neuron index space
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulationsConfig {
    pub lengths: Vec<u32>,
    /// Declared neuron count; checked against the sum of `lengths` when present
    pub n_neurons: Option<u32>,
}

impl Default for PopulationsConfig {
    fn default() -> Self {
        Self {
            lengths: vec![32],
            n_neurons: None,
        }
    }
}

/// Per-neuron parameters
///
/// Empty vectors fall back to the scalar defaults (encoders fall back to zero).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuronsConfig {
    pub gains: Vec<f32>,
    pub biases: Vec<f32>,
    /// Row-major `n_neurons × n_input_dimensions`
    pub encoders: Vec<f32>,
    pub default_gain: f32,
    pub default_bias: f32,
}

impl Default for NeuronsConfig {
    fn default() -> Self {
        Self {
            gains: Vec::new(),
            biases: Vec::new(),
            encoders: Vec::new(),
            default_gain: 1.0,
            default_bias: 0.0,
        }
    }
}

/// Initial decoder matrix
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecodersConfig {
    /// Row-major `n_output_dimensions × n_neurons`; empty starts from zero
    pub values: Vec<f32>,
}

fn unfiltered_activity() -> i32 {
    -1
}

/// One PES learning rule
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PesRuleConfig {
    pub learning_rate: f32,
    pub error_signal_index: u32,
    pub decoder_row: u32,
    /// `-1` learns from the unfiltered spike vector
    #[serde(default = "unfiltered_activity")]
    pub activity_filter_index: i32,
}

/// Packet route into a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    pub key: u32,
    pub mask: u32,
    /// Bits of the key selecting the dimension
    pub dimension_mask: u32,
}

/// First-order low-pass input filter
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    pub dimensions: u32,
    /// Synaptic time constant in seconds; 0 passes input straight through
    pub time_constant: f32,
    pub routes: Vec<RouteConfig>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            dimensions: 1,
            time_constant: 0.0,
            routes: Vec::new(),
        }
    }
}

/// Which input collection a filter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    Input,
    Inhibitory,
    LearntEncoder,
}

/// Input, inhibitory or learnt-encoder filter
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InputFilterConfig {
    pub kind: FilterKind,
    pub dimensions: u32,
    pub time_constant: f32,
    pub routes: Vec<RouteConfig>,
}

impl InputFilterConfig {
    pub fn filter(&self) -> FilterConfig {
        FilterConfig {
            dimensions: self.dimensions,
            time_constant: self.time_constant,
            routes: self.routes.clone(),
        }
    }
}

/// Output hand-off
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransmissionConfig {
    /// Ticks between output transmissions
    pub delay: u32,
    /// Packet key per output dimension; empty uses the dimension index
    pub keys: Vec<u32>,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            delay: 1,
            keys: Vec::new(),
        }
    }
}

/// Per-run recording
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub record_spikes: bool,
    /// Buffer size in ticks for runs without a tick count; later ticks are dropped
    pub unbounded_run_ticks: u32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            record_spikes: false,
            unbounded_run_ticks: 10_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily-rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}
