// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration region builders
//!
//! Turns a validated [`EnsembleConfig`] into the layout and word-level PES
//! region an ensemble element loads at startup.
//!
//! ```text
//! PES region:
//!     n_rules, then per rule:
//!     learning_rate (S16.15), error_signal_index, decoder_row, activity_filter_index
//! ```

use ensemble_neural::{EnsembleError, NeuralValue, PopulationLayout, S1615};
use ensemble_plasticity::{ActivitySource, PesRule, PesRuleSet};

use crate::{ConfigResult, EnsembleConfig};

/// Population layout checked against the declared neuron count
pub fn population_layout(config: &EnsembleConfig) -> ConfigResult<PopulationLayout> {
    let lengths = config.populations.lengths.clone();
    let layout = match config.populations.n_neurons {
        Some(declared) => PopulationLayout::with_total(lengths, declared)?,
        None => PopulationLayout::new(lengths)?,
    };
    Ok(layout)
}

/// Rule table from the `[[pes_rules]]` sections
pub fn pes_rule_set<V: NeuralValue>(config: &EnsembleConfig) -> ConfigResult<PesRuleSet<V>> {
    let rules = config
        .pes_rules
        .iter()
        .map(|rule| {
            Ok(PesRule {
                learning_rate: V::from_f32(rule.learning_rate),
                error_signal_index: rule.error_signal_index,
                decoder_row: rule.decoder_row,
                activity: ActivitySource::from_raw(rule.activity_filter_index)?,
            })
        })
        .collect::<Result<Vec<_>, EnsembleError>>()?;
    Ok(PesRuleSet::from_rules(rules))
}

/// PES configuration region in S16.15
pub fn pes_region_words(config: &EnsembleConfig) -> ConfigResult<Vec<u32>> {
    Ok(pes_rule_set::<S1615>(config)?.to_region_words()?)
}
