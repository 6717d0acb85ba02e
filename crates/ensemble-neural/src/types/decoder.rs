// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dense decoder matrix
//!
//! Row-major `n_rows × n_neurons`: entry `(row, column)` lives at
//! `row * n_neurons + column`. Rows are output dimensions, columns are
//! neurons. Allocated once; learning mutates it in place.

use super::error::{EnsembleError, Result};
use super::numeric::NeuralValue;
use super::population::PopulationLayout;
use super::spikes::SpikeVector;
use crate::utils::try_alloc_filled;

#[derive(Debug, Clone, PartialEq)]
pub struct DecoderMatrix<V: NeuralValue> {
    n_rows: usize,
    n_neurons: usize,
    values: Vec<V>,
}

impl<V: NeuralValue> DecoderMatrix<V> {
    /// Zero-filled matrix
    pub fn new(n_rows: usize, n_neurons: usize) -> Result<Self> {
        let len = n_rows
            .checked_mul(n_neurons)
            .ok_or(EnsembleError::AllocationFailure {
                what: "decoder matrix",
                requested_bytes: usize::MAX,
            })?;
        Ok(Self {
            n_rows,
            n_neurons,
            values: try_alloc_filled(len, V::zero(), "decoder matrix")?,
        })
    }

    /// Wrap row-major values
    pub fn from_rows(n_rows: usize, n_neurons: usize, values: Vec<V>) -> Result<Self> {
        if n_rows.checked_mul(n_neurons) != Some(values.len()) {
            return Err(EnsembleError::ConfigurationMismatch(format!(
                "decoder matrix of {} rows x {} neurons cannot hold {} values",
                n_rows,
                n_neurons,
                values.len()
            )));
        }
        Ok(Self {
            n_rows,
            n_neurons,
            values,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_neurons(&self) -> usize {
        self.n_neurons
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> V {
        self.values[row * self.n_neurons + column]
    }

    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: V) {
        self.values[row * self.n_neurons + column] = value;
    }

    /// One output dimension across all neurons
    pub fn row(&self, row: usize) -> &[V] {
        let start = row * self.n_neurons;
        &self.values[start..start + self.n_neurons]
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// Subtract `scale * vector[d]` from `(first_row + d, column)` for every `d`
    #[inline]
    pub fn subtract_scaled_column(
        &mut self,
        first_row: usize,
        column: usize,
        scale: V,
        vector: &[V],
    ) {
        let stride = self.n_neurons;
        let mut index = first_row * stride + column;
        for &value in vector {
            let entry = &mut self.values[index];
            *entry = entry.saturating_sub(scale.saturating_mul(value));
            index += stride;
        }
    }

    /// Sum decoder columns of every firing neuron into `output`
    ///
    /// `output` is cleared first; rows beyond `output.len()` are ignored.
    pub fn decode_into(&self, spikes: &SpikeVector, layout: &PopulationLayout, output: &mut [V]) {
        output.fill(V::zero());
        let rows = self.n_rows.min(output.len());
        spikes.for_each_firing(layout, |column| {
            let column = column as usize;
            for (row, out) in output.iter_mut().take(rows).enumerate() {
                *out = out.saturating_add(self.values[row * self.n_neurons + column]);
            }
        });
    }
}
