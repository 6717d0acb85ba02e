// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neural Types Module
//!
//! Core type definitions shared by the learning engine and the tick runtime.

pub mod decoder;
pub mod error;
pub mod numeric;
pub mod population;
pub mod spikes;

pub use decoder::DecoderMatrix;
pub use error::{EnsembleError, Result};
pub use numeric::{NeuralValue, S1615};
pub use population::{NeuronPopulation, PopulationLayout};
pub use spikes::{next_set_bit, FiringNeurons, SpikeVector, SPIKE_WORD_BITS};
