// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Population layout of an ensemble slice
//!
//! Populations partition the neuron index space in declared order. In the
//! spike vector every population starts on a fresh 32-bit word, so a
//! population of length `L` occupies `ceil(L / 32)` words.

use super::error::{EnsembleError, Result};
use super::spikes::SPIKE_WORD_BITS;

/// One population within the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeuronPopulation {
    /// Position in declared order
    pub index: usize,
    /// Column of the first neuron in the decoder matrix
    pub first_neuron: u32,
    /// Number of neurons (may be 0)
    pub length: u32,
    /// Index of the first spike word belonging to this population
    pub first_word: usize,
}

impl NeuronPopulation {
    /// Number of spike words this population occupies
    #[inline]
    pub fn n_words(&self) -> usize {
        words_for(self.length)
    }

    /// Whether `neuron` (a global column) belongs to this population
    #[inline]
    pub fn contains(&self, neuron: u32) -> bool {
        neuron >= self.first_neuron && neuron - self.first_neuron < self.length
    }
}

/// Number of 32-bit spike words needed for `length` neurons
#[inline]
pub const fn words_for(length: u32) -> usize {
    length.div_ceil(SPIKE_WORD_BITS) as usize
}

/// Ordered population lengths plus derived totals
///
/// Invariant: the sum of population lengths equals [`PopulationLayout::n_neurons`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationLayout {
    lengths: Vec<u32>,
    n_neurons: u32,
    n_words: usize,
}

impl PopulationLayout {
    /// Build a layout whose total neuron count is the sum of `lengths`
    pub fn new(lengths: Vec<u32>) -> Result<Self> {
        let total: u64 = lengths.iter().map(|&l| u64::from(l)).sum();
        let n_neurons = u32::try_from(total).map_err(|_| {
            EnsembleError::ConfigurationMismatch(format!(
                "population lengths sum to {} neurons, more than a u32 column index can address",
                total
            ))
        })?;
        Ok(Self::from_parts(lengths, n_neurons))
    }

    /// Build a layout and check it against a separately declared neuron count
    pub fn with_total(lengths: Vec<u32>, n_neurons: u32) -> Result<Self> {
        let layout = Self::new(lengths)?;
        if layout.n_neurons != n_neurons {
            return Err(EnsembleError::ConfigurationMismatch(format!(
                "population lengths sum to {} but the ensemble declares {} neurons",
                layout.n_neurons, n_neurons
            )));
        }
        Ok(layout)
    }

    /// A single population covering every neuron
    pub fn single(n_neurons: u32) -> Self {
        Self::from_parts(vec![n_neurons], n_neurons)
    }

    fn from_parts(lengths: Vec<u32>, n_neurons: u32) -> Self {
        let n_words = lengths.iter().map(|&l| words_for(l)).sum();
        Self {
            lengths,
            n_neurons,
            n_words,
        }
    }

    pub fn lengths(&self) -> &[u32] {
        &self.lengths
    }

    pub fn n_populations(&self) -> usize {
        self.lengths.len()
    }

    /// Total neuron count (decoder matrix column count)
    pub fn n_neurons(&self) -> u32 {
        self.n_neurons
    }

    /// Spike vector length in words
    pub fn n_words(&self) -> usize {
        self.n_words
    }

    /// Iterate populations in declared order
    pub fn populations(&self) -> impl Iterator<Item = NeuronPopulation> + '_ {
        let mut first_neuron = 0u32;
        let mut first_word = 0usize;
        self.lengths.iter().enumerate().map(move |(index, &length)| {
            let population = NeuronPopulation {
                index,
                first_neuron,
                length,
                first_word,
            };
            first_neuron += length;
            first_word += words_for(length);
            population
        })
    }

    /// Locate the spike word and MSB-first bit position of a neuron
    pub fn locate(&self, neuron: u32) -> Option<(usize, u32)> {
        self.populations()
            .find(|p| p.contains(neuron))
            .map(|p| {
                let offset = neuron - p.first_neuron;
                (
                    p.first_word + (offset / SPIKE_WORD_BITS) as usize,
                    offset % SPIKE_WORD_BITS,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_totals() {
        let layout = PopulationLayout::new(vec![32, 16]).unwrap();
        assert_eq!(layout.n_neurons(), 48);
        assert_eq!(layout.n_words(), 2);
        assert_eq!(layout.n_populations(), 2);
    }

    #[test]
    fn test_each_population_starts_a_fresh_word() {
        let layout = PopulationLayout::new(vec![5, 0, 40]).unwrap();
        let pops: Vec<_> = layout.populations().collect();
        assert_eq!(pops[0].first_word, 0);
        assert_eq!(pops[1].first_word, 1);
        assert_eq!(pops[1].n_words(), 0);
        assert_eq!(pops[2].first_word, 1);
        assert_eq!(pops[2].first_neuron, 5);
        assert_eq!(layout.n_words(), 3);
    }

    #[test]
    fn test_with_total_rejects_mismatch() {
        let err = PopulationLayout::with_total(vec![10, 10], 21).unwrap_err();
        assert!(matches!(err, EnsembleError::ConfigurationMismatch(_)));
        assert!(PopulationLayout::with_total(vec![10, 11], 21).is_ok());
    }

    #[test]
    fn test_locate() {
        let layout = PopulationLayout::new(vec![5, 40]).unwrap();
        assert_eq!(layout.locate(0), Some((0, 0)));
        assert_eq!(layout.locate(4), Some((0, 4)));
        assert_eq!(layout.locate(5), Some((1, 0)));
        assert_eq!(layout.locate(5 + 33), Some((2, 1)));
        assert_eq!(layout.locate(45), None);
    }
}
