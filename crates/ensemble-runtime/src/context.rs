// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation context
//!
//! All state one ensemble element owns, built once at initialisation and
//! passed by `&mut` into the tick handler. Nothing here is global.

use ensemble_config::{pes_region_words, population_layout, validate_config, EnsembleConfig};
use ensemble_neural::{
    try_alloc_filled, DecoderMatrix, EnsembleError, LifEnsemble, LifParameters, NeuralValue,
    PopulationLayout, SpikeVector,
};
use ensemble_plasticity::{EncoderLearning, NoEncoderLearning, PesRuleSet};
use tracing::info;

use crate::error::Result;
use crate::filters::InputFilters;
use crate::recording::SpikeRecorder;
use crate::state::TimerMode;
use crate::transmit::DelayedTransmitter;

pub struct SimulationContext<V: NeuralValue> {
    pub layout: PopulationLayout,
    pub decoder: DecoderMatrix<V>,
    pub rules: PesRuleSet<V>,
    pub encoder_learning: Box<dyn EncoderLearning<V>>,
    pub neurons: LifEnsemble<V>,
    pub filters: InputFilters<V>,
    pub spikes: SpikeVector,
    pub recorder: SpikeRecorder,
    pub transmitter: DelayedTransmitter,
    pub timer: TimerMode,
    /// Summed feedforward input, refreshed every tick
    pub input: Vec<V>,
    /// Decoded output vector, refreshed every tick
    pub output: Vec<V>,
}

fn values_or<V: NeuralValue>(
    values: &[f32],
    len: usize,
    default: f32,
    what: &'static str,
) -> std::result::Result<Vec<V>, EnsembleError> {
    if values.is_empty() {
        return try_alloc_filled(len, V::from_f32(default), what);
    }
    let mut out = Vec::new();
    out.try_reserve_exact(values.len())
        .map_err(|_| EnsembleError::AllocationFailure {
            what,
            requested_bytes: values.len().saturating_mul(core::mem::size_of::<V>()),
        })?;
    out.extend(values.iter().map(|&v| V::from_f32(v)));
    Ok(out)
}

impl<V: NeuralValue> SimulationContext<V> {
    /// Build every component from a configuration
    ///
    /// The configuration is validated first, so rule row ranges and error
    /// signal indices are known to be in range before any tick runs. The
    /// decoder matrix is allocated next since it is by far the largest
    /// structure. Any failure is fatal to the element.
    ///
    /// Learning rates are read back from the S16.15 PES region, so they are
    /// quantised to a step of 2^-15 even when `V` is `f32`.
    pub fn from_config(config: &EnsembleConfig) -> Result<Self> {
        validate_config(config)?;

        let n_rows = config.system.n_output_dimensions as usize;
        let n_neurons = usize::try_from(config.n_neurons()).map_err(|_| {
            EnsembleError::AllocationFailure {
                what: "decoder matrix",
                requested_bytes: usize::MAX,
            }
        })?;
        let decoder = if config.decoders.values.is_empty() {
            DecoderMatrix::new(n_rows, n_neurons)?
        } else {
            let values = values_or(&config.decoders.values, 0, 0.0, "decoder matrix")?;
            DecoderMatrix::from_rows(n_rows, n_neurons, values)?
        };

        let layout = population_layout(config)?;
        // Rule tables go through the same region words the host writes
        let rules = PesRuleSet::<V>::load(&pes_region_words(config)?)?;

        let n_input = config.system.n_input_dimensions as usize;
        let neuron_config = &config.neurons;
        let params = LifParameters::from_time_constants(
            config.dt(),
            config.system.tau_ref,
            config.system.tau_rc,
        );
        let encoders = values_or(
            &neuron_config.encoders,
            n_neurons.saturating_mul(n_input),
            0.0,
            "encoders",
        )?;
        let gains: Vec<V> = values_or(
            &neuron_config.gains,
            n_neurons,
            neuron_config.default_gain,
            "gains",
        )?;
        let bias = values_or(
            &neuron_config.biases,
            n_neurons,
            neuron_config.default_bias,
            "biases",
        )?;
        let neurons = LifEnsemble::new(params, &layout, n_input, encoders, &gains, bias)?;

        let filters = InputFilters::from_config(config)?;
        let spikes = SpikeVector::for_layout(&layout)?;
        let recorder = SpikeRecorder::new(
            config.recording.record_spikes,
            layout.n_words(),
            config.recording.unbounded_run_ticks,
        );

        info!(
            "[CONTEXT] {} neurons in {} populations, {} -> {} dimensions, {} PES rules",
            layout.n_neurons(),
            layout.n_populations(),
            n_input,
            n_rows,
            rules.len()
        );

        Ok(Self {
            decoder,
            rules,
            encoder_learning: Box::new(NoEncoderLearning),
            neurons,
            filters,
            spikes,
            recorder,
            transmitter: DelayedTransmitter::new(config.transmission.delay),
            timer: TimerMode::from_timestep_us(
                config.system.machine_timestep_us,
                config.system.real_time,
            ),
            input: try_alloc_filled(n_input, V::zero(), "input vector")?,
            output: try_alloc_filled(n_rows, V::zero(), "output vector")?,
            layout,
        })
    }

    /// Replace the encoder-learning rule
    pub fn with_encoder_learning(mut self, rule: Box<dyn EncoderLearning<V>>) -> Self {
        self.encoder_learning = rule;
        self
    }
}
