// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neuron Models
//!
//! Spike generation for an ensemble slice. The learning engine only reads the
//! spike vector a model writes, so any model producing the bit-packed layout
//! can drive it.

pub mod lif;

pub use lif::{LifEnsemble, LifParameters};
