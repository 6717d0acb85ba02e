// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Bit-packed spike vector
//!
//! One bit per neuron, grouped into 32-bit words, MSB-first: the first neuron
//! of a word is bit 31. Each population starts on a fresh word.
//!
//! ## Traversal
//!
//! ```text
//! for each population p (declared order):
//!     while neurons remain in p:
//!         n    = min(32, remaining)
//!         data = next word, bit = 0
//!         while bit < n:
//!             b = next_set_bit(data, bit)      (leading_zeros)
//!             if b < n:  column + b fired, bit = b + 1
//!             else:      bit = n
//!         column += n
//! ```
//!
//! Cost is proportional to the number of set bits plus the number of words,
//! never to the neuron count.

use super::error::Result;
use super::population::PopulationLayout;
use crate::utils::try_alloc_filled;

/// Number of neurons packed into one spike word
pub const SPIKE_WORD_BITS: u32 = 32;

/// Position (MSB-first) of the first set bit at or after `from`
///
/// Returns `None` when no such bit exists, including when `from >= 32`.
#[inline(always)]
pub fn next_set_bit(word: u32, from: u32) -> Option<u32> {
    let remaining = word.checked_shl(from).unwrap_or(0);
    if remaining == 0 {
        None
    } else {
        Some(from + remaining.leading_zeros())
    }
}

/// Spike record for one tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpikeVector {
    words: Vec<u32>,
}

impl SpikeVector {
    /// Allocate a zeroed vector sized for `layout`
    pub fn for_layout(layout: &PopulationLayout) -> Result<Self> {
        Ok(Self {
            words: try_alloc_filled(layout.n_words(), 0u32, "spike vector")?,
        })
    }

    /// Wrap words produced elsewhere (recordings, tests, host tooling)
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Reset every bit without touching the allocation
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Set bit `bit` (MSB-first) of word `word`
    #[inline]
    pub fn set_at(&mut self, word: usize, bit: u32) {
        debug_assert!(bit < SPIKE_WORD_BITS);
        if let Some(w) = self.words.get_mut(word) {
            *w |= 0x8000_0000u32 >> bit;
        }
    }

    /// Mark `neuron` (a global column) as fired; returns `false` if it is outside the layout
    pub fn set(&mut self, layout: &PopulationLayout, neuron: u32) -> bool {
        match layout.locate(neuron) {
            Some((word, bit)) if word < self.words.len() => {
                self.set_at(word, bit);
                true
            }
            _ => false,
        }
    }

    pub fn is_set(&self, layout: &PopulationLayout, neuron: u32) -> bool {
        layout
            .locate(neuron)
            .and_then(|(word, bit)| self.words.get(word).map(|w| w & (0x8000_0000u32 >> bit) != 0))
            .unwrap_or(false)
    }

    /// Number of set bits in the whole vector
    pub fn count_spikes(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Iterate the columns of firing neurons in increasing order
    pub fn firing<'a>(&'a self, layout: &'a PopulationLayout) -> FiringNeurons<'a> {
        debug_assert_eq!(self.words.len(), layout.n_words());
        FiringNeurons {
            words: self.words.iter(),
            lengths: layout.lengths().iter(),
            pop_remaining: 0,
            data: 0,
            bit: 0,
            word_len: 0,
            word_column: 0,
        }
    }

    /// Call `f` with the column of every firing neuron, in increasing order
    #[inline]
    pub fn for_each_firing<F: FnMut(u32)>(&self, layout: &PopulationLayout, f: F) {
        self.firing(layout).for_each(f);
    }
}

/// Iterator over firing neuron columns
///
/// Bits past a population's declared length are never reported, and a
/// zero-length population consumes no words.
#[derive(Debug, Clone)]
pub struct FiringNeurons<'a> {
    words: core::slice::Iter<'a, u32>,
    lengths: core::slice::Iter<'a, u32>,
    /// Neurons of the current population not yet loaded into a word
    pop_remaining: u32,
    /// Current word
    data: u32,
    /// Next untested bit of `data`
    bit: u32,
    /// Bits of `data` that belong to the current population
    word_len: u32,
    /// Column of bit 31 of `data`
    word_column: u32,
}

impl Iterator for FiringNeurons<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        loop {
            if self.bit < self.word_len {
                match next_set_bit(self.data, self.bit) {
                    Some(bit) if bit < self.word_len => {
                        self.bit = bit + 1;
                        return Some(self.word_column + bit);
                    }
                    // Nothing left in range: skip the untested tail of the word
                    _ => self.bit = self.word_len,
                }
                continue;
            }

            self.word_column += self.word_len;
            self.word_len = 0;
            self.bit = 0;
            if self.pop_remaining == 0 {
                self.pop_remaining = *self.lengths.next()?;
                continue;
            }
            self.data = *self.words.next()?;
            self.word_len = self.pop_remaining.min(SPIKE_WORD_BITS);
            self.pop_remaining -= self.word_len;
        }
    }
}

impl core::iter::FusedIterator for FiringNeurons<'_> {}
