// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LIF (Leaky Integrate-and-Fire) Ensemble
//!
//! ## Model Dynamics
//!
//! ```text
//! Input current (per neuron n):
//!     J = bias[n] + Σ_d (gain[n] · encoder[n][d]) · x[d] − inhibition
//!
//! Membrane update (Euler, per tick):
//!     if refractory[n] > 0:
//!         refractory[n] −= 1, skip
//!     v += (J − v) · dt/τ_rc
//!     v  = max(v, 0)
//!
//! Firing:
//!     if v > 1:
//!         set spike bit, v = 0, refractory[n] = t_ref
//! ```
//!
//! Encoders are stored pre-multiplied by the neuron gain.

use crate::types::{
    EnsembleError, NeuralValue, PopulationLayout, Result, SpikeVector, SPIKE_WORD_BITS,
};
use crate::utils::try_alloc_filled;

/// LIF constants shared by every neuron of the slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifParameters<V: NeuralValue> {
    /// Refractory period in ticks
    pub t_ref_ticks: u32,

    /// Ratio of the tick length to the membrane time constant
    pub dt_over_t_rc: V,
}

impl<V: NeuralValue> LifParameters<V> {
    pub fn new(t_ref_ticks: u32, dt_over_t_rc: V) -> Self {
        Self {
            t_ref_ticks,
            dt_over_t_rc,
        }
    }

    /// Derive tick-based constants from time constants in seconds
    pub fn from_time_constants(dt: f32, tau_ref: f32, tau_rc: f32) -> Self {
        Self {
            t_ref_ticks: (tau_ref / dt).round() as u32,
            dt_over_t_rc: V::from_f32(dt / tau_rc),
        }
    }
}

impl<V: NeuralValue> Default for LifParameters<V> {
    /// 1 ms tick, τ_ref = 2 ms, τ_rc = 20 ms
    fn default() -> Self {
        Self::from_time_constants(0.001, 0.002, 0.02)
    }
}

/// Neuron state for one ensemble slice
#[derive(Debug, Clone)]
pub struct LifEnsemble<V: NeuralValue> {
    params: LifParameters<V>,
    n_input_dimensions: usize,
    encoders: Vec<V>,
    bias: Vec<V>,
    voltages: Vec<V>,
    refractory: Vec<u32>,
}

impl<V: NeuralValue> LifEnsemble<V> {
    /// Build the ensemble state
    ///
    /// `encoders` is row-major `n_neurons × n_input_dimensions`; it is scaled
    /// by `gains` in place.
    pub fn new(
        params: LifParameters<V>,
        layout: &PopulationLayout,
        n_input_dimensions: usize,
        mut encoders: Vec<V>,
        gains: &[V],
        bias: Vec<V>,
    ) -> Result<Self> {
        let n_neurons = layout.n_neurons() as usize;
        if n_neurons.checked_mul(n_input_dimensions) != Some(encoders.len()) {
            return Err(EnsembleError::ConfigurationMismatch(format!(
                "expected {} x {} encoder values, found {}",
                n_neurons,
                n_input_dimensions,
                encoders.len()
            )));
        }
        if gains.len() != n_neurons || bias.len() != n_neurons {
            return Err(EnsembleError::ConfigurationMismatch(format!(
                "expected {} gains and biases, found {} and {}",
                n_neurons,
                gains.len(),
                bias.len()
            )));
        }

        if n_input_dimensions > 0 {
            for (row, &gain) in encoders.chunks_mut(n_input_dimensions).zip(gains) {
                for value in row {
                    *value = value.saturating_mul(gain);
                }
            }
        }

        Ok(Self {
            params,
            n_input_dimensions,
            encoders,
            bias,
            voltages: try_alloc_filled(n_neurons, V::zero(), "membrane voltages")?,
            refractory: try_alloc_filled(n_neurons, 0u32, "refractory counters")?,
        })
    }

    pub fn params(&self) -> &LifParameters<V> {
        &self.params
    }

    pub fn n_neurons(&self) -> usize {
        self.voltages.len()
    }

    pub fn n_input_dimensions(&self) -> usize {
        self.n_input_dimensions
    }

    pub fn voltages(&self) -> &[V] {
        &self.voltages
    }

    #[inline]
    fn input_current(&self, neuron: usize, input: &[V]) -> V {
        let start = neuron * self.n_input_dimensions;
        self.encoders[start..start + self.n_input_dimensions]
            .iter()
            .zip(input)
            .fold(self.bias[neuron], |acc, (&e, &x)| {
                acc.saturating_add(e.saturating_mul(x))
            })
    }

    /// Advance every neuron by one tick and write the spike vector
    ///
    /// Returns the number of neurons that fired.
    pub fn step(
        &mut self,
        input: &[V],
        inhibition: V,
        layout: &PopulationLayout,
        spikes: &mut SpikeVector,
    ) -> u32 {
        spikes.clear();
        let mut fired = 0;

        for population in layout.populations() {
            for offset in 0..population.length {
                let n = (population.first_neuron + offset) as usize;

                if self.refractory[n] > 0 {
                    self.refractory[n] -= 1;
                    continue;
                }

                let current = self.input_current(n, input).saturating_sub(inhibition);
                let v = self.voltages[n];
                let mut v = v.saturating_add(
                    current
                        .saturating_sub(v)
                        .saturating_mul(self.params.dt_over_t_rc),
                );
                if v < V::zero() {
                    v = V::zero();
                }

                if v > V::one() {
                    v = V::zero();
                    self.refractory[n] = self.params.t_ref_ticks;
                    spikes.set_at(
                        population.first_word + (offset / SPIKE_WORD_BITS) as usize,
                        offset % SPIKE_WORD_BITS,
                    );
                    fired += 1;
                }
                self.voltages[n] = v;
            }
        }

        fired
    }
}
