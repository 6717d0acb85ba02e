// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble Neural Types
//!
//! Everything one ensemble processing element needs to hold its neural state:
//! - **Types**: S16.15 fixed-point values, population layout, bit-packed spike
//!   vectors and the dense decoder matrix
//! - **Models**: the LIF neuron model used for spike generation
//! - **Utils**: fallible startup allocation
//!
//! All per-tick operations in this crate are allocation-free. Storage is
//! reserved once at startup and reused for the lifetime of the element.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod types;
pub mod utils;

// Neuron models
pub mod models;

// Re-export types
pub use types::{
    next_set_bit, DecoderMatrix, EnsembleError, FiringNeurons, NeuralValue, NeuronPopulation,
    PopulationLayout, Result, SpikeVector, S1615, SPIKE_WORD_BITS,
};

pub use models::{LifEnsemble, LifParameters};
pub use utils::try_alloc_filled;
