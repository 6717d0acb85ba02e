// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Encoder learning seam
//!
//! The tick handler runs encoder learning right after PES. Implementations
//! plug in here; the default does nothing.

use ensemble_neural::{NeuralValue, PopulationLayout, SpikeVector};

use crate::modulatory::ModulatoryFilters;

/// Trait for encoder learning rules
pub trait EncoderLearning<V: NeuralValue>: Send {
    /// Apply one tick of encoder learning
    fn apply(
        &mut self,
        spikes: &SpikeVector,
        layout: &PopulationLayout,
        modulatory: &dyn ModulatoryFilters<V>,
        learnt_encoder_inputs: &dyn ModulatoryFilters<V>,
    );

    fn name(&self) -> &str;
}

/// Encoder learning disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEncoderLearning;

impl<V: NeuralValue> EncoderLearning<V> for NoEncoderLearning {
    fn apply(
        &mut self,
        _spikes: &SpikeVector,
        _layout: &PopulationLayout,
        _modulatory: &dyn ModulatoryFilters<V>,
        _learnt_encoder_inputs: &dyn ModulatoryFilters<V>,
    ) {
    }

    fn name(&self) -> &str {
        "NoEncoderLearning"
    }
}
