// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # PES (Prescribed Error Sensitivity) decoder learning
//!
//! ## Update law
//!
//! ```text
//! for each rule r with unfiltered activity:
//!     E = modulatory_filters[r.error_signal_index]      (dimension D)
//!     for each neuron c that fired this tick:
//!         for d in 0..D:
//!             decoder[r.decoder_row + d][c] -= r.learning_rate · E[d]
//! ```
//!
//! ## Region layout
//!
//! ```text
//! word 0          rule count N
//! words 1 + 4i .. learning_rate (S16.15), error_signal_index,
//!                 decoder_row, activity_filter_index (i32, -1 = unfiltered)
//! ```

use ensemble_neural::{
    DecoderMatrix, EnsembleError, NeuralValue, PopulationLayout, Result, SpikeVector,
};
use tracing::{info, warn};

use crate::modulatory::ModulatoryFilters;

/// Words per rule record in the PES region
pub const PES_RECORD_WORDS: usize = 4;

/// Region encoding of [`ActivitySource::Unfiltered`]
pub const UNFILTERED_ACTIVITY_INDEX: i32 = -1;

const PES_REGION: &str = "pes";

/// Which activity signal a rule learns from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivitySource {
    /// The raw spike vector of the current tick
    Unfiltered,
    /// A filtered-activity trace, by index
    FilteredBy(u32),
}

impl ActivitySource {
    /// Decode the region word
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            UNFILTERED_ACTIVITY_INDEX => Ok(Self::Unfiltered),
            index if index >= 0 => Ok(Self::FilteredBy(index as u32)),
            other => Err(EnsembleError::InvalidActivityIndex(other)),
        }
    }

    /// Encode as the region word
    pub fn to_raw(self) -> Result<i32> {
        match self {
            Self::Unfiltered => Ok(UNFILTERED_ACTIVITY_INDEX),
            Self::FilteredBy(index) => i32::try_from(index).map_err(|_| {
                EnsembleError::ConfigurationMismatch(format!(
                    "activity filter index {} does not fit the region word",
                    index
                ))
            }),
        }
    }
}

/// One learning rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PesRule<V: NeuralValue> {
    pub learning_rate: V,
    /// Modulatory filter carrying this rule's error signal
    pub error_signal_index: u32,
    /// First decoder row updated; the rule owns `error dimension` rows from here
    pub decoder_row: u32,
    pub activity: ActivitySource,
}

impl<V: NeuralValue> PesRule<V> {
    pub fn unfiltered(learning_rate: V, error_signal_index: u32, decoder_row: u32) -> Self {
        Self {
            learning_rate,
            error_signal_index,
            decoder_row,
            activity: ActivitySource::Unfiltered,
        }
    }

    fn from_record(record: &[u32]) -> Result<Self> {
        Ok(Self {
            learning_rate: V::from_s1615_bits(record[0] as i32),
            error_signal_index: record[1],
            decoder_row: record[2],
            activity: ActivitySource::from_raw(record[3] as i32)?,
        })
    }

    fn to_record(&self) -> Result<[u32; PES_RECORD_WORDS]> {
        Ok([
            self.learning_rate.to_s1615_bits() as u32,
            self.error_signal_index,
            self.decoder_row,
            self.activity.to_raw()? as u32,
        ])
    }
}

/// Immutable, ordered rule table loaded at startup
#[derive(Debug, Clone, PartialEq)]
pub struct PesRuleSet<V: NeuralValue> {
    rules: Vec<PesRule<V>>,
}

impl<V: NeuralValue> Default for PesRuleSet<V> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<V: NeuralValue> PesRuleSet<V> {
    /// Build directly from rules (host side and tests)
    pub fn from_rules(rules: Vec<PesRule<V>>) -> Self {
        Self { rules }
    }

    /// Load the rule table from a PES configuration region
    ///
    /// A rule count of zero yields an empty table without allocating.
    pub fn load(region: &[u32]) -> Result<Self> {
        let (&count, records) = region.split_first().ok_or(EnsembleError::RegionTooShort {
            region: PES_REGION,
            expected_words: 1,
            actual_words: 0,
        })?;
        let count = count as usize;
        info!("PES learning: {} rules", count);

        if count == 0 {
            return Ok(Self::default());
        }

        let expected_words = count.saturating_mul(PES_RECORD_WORDS).saturating_add(1);
        if region.len() < expected_words {
            return Err(EnsembleError::RegionTooShort {
                region: PES_REGION,
                expected_words,
                actual_words: region.len(),
            });
        }

        let mut rules = Vec::new();
        rules
            .try_reserve_exact(count)
            .map_err(|_| EnsembleError::AllocationFailure {
                what: "PES rules",
                requested_bytes: count.saturating_mul(core::mem::size_of::<PesRule<V>>()),
            })?;

        for (index, record) in records.chunks_exact(PES_RECORD_WORDS).take(count).enumerate() {
            let rule = PesRule::<V>::from_record(record)?;
            info!(
                "  Rule {}: learning rate {:?}, error signal index {}, decoder row {}, activity {:?}",
                index,
                rule.learning_rate,
                rule.error_signal_index,
                rule.decoder_row,
                rule.activity
            );
            if let ActivitySource::FilteredBy(filter) = rule.activity {
                warn!(
                    "  Rule {} learns from filtered activity {}; only unfiltered rules are applied",
                    index, filter
                );
            }
            rules.push(rule);
        }

        Ok(Self { rules })
    }

    /// Encode as a PES configuration region
    pub fn to_region_words(&self) -> Result<Vec<u32>> {
        let mut words = Vec::with_capacity(1 + self.rules.len() * PES_RECORD_WORDS);
        words.push(u32::try_from(self.rules.len()).map_err(|_| {
            EnsembleError::ConfigurationMismatch(format!("{} PES rules", self.rules.len()))
        })?);
        for rule in &self.rules {
            words.extend_from_slice(&rule.to_record()?);
        }
        Ok(words)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[PesRule<V>] {
        &self.rules
    }

    /// Apply every unfiltered rule to the decoder for one tick
    ///
    /// The caller guarantees the layout matches the spike vector and decoder,
    /// that every error signal index is valid, and that rule row ranges are
    /// disjoint and inside the decoder. Cost is proportional to spikes fired.
    pub fn apply<M>(
        &self,
        spikes: &SpikeVector,
        decoder: &mut DecoderMatrix<V>,
        modulatory: &M,
        layout: &PopulationLayout,
    ) where
        M: ModulatoryFilters<V> + ?Sized,
    {
        debug_assert_eq!(spikes.len_words(), layout.n_words());
        debug_assert_eq!(decoder.n_neurons(), layout.n_neurons() as usize);

        for rule in &self.rules {
            // Filtered-activity rules are never applied here
            if rule.activity != ActivitySource::Unfiltered {
                continue;
            }

            let error = modulatory.output(rule.error_signal_index as usize);
            let first_row = rule.decoder_row as usize;
            debug_assert!(first_row + error.len() <= decoder.n_rows());

            spikes.for_each_firing(layout, |column| {
                decoder.subtract_scaled_column(
                    first_row,
                    column as usize,
                    rule.learning_rate,
                    error,
                );
            });
        }
    }
}
