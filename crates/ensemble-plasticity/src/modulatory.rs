// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only view of the modulatory (error signal) filter outputs

use ensemble_neural::NeuralValue;

/// Ordered collection of filter output vectors
///
/// Refreshed once per tick by the input filter pipeline; learning rules only
/// ever borrow it immutably.
pub trait ModulatoryFilters<V: NeuralValue> {
    fn n_filters(&self) -> usize;

    /// Current output vector of filter `index`; its length is the filter dimension
    fn output(&self, index: usize) -> &[V];
}

impl<V: NeuralValue> ModulatoryFilters<V> for [Vec<V>] {
    fn n_filters(&self) -> usize {
        self.len()
    }

    fn output(&self, index: usize) -> &[V] {
        &self[index]
    }
}

impl<V: NeuralValue> ModulatoryFilters<V> for Vec<Vec<V>> {
    fn n_filters(&self) -> usize {
        self.len()
    }

    fn output(&self, index: usize) -> &[V] {
        &self[index]
    }
}
