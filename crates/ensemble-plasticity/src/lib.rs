// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble Plasticity
//!
//! Online decoder learning for a spiking ensemble.
//!
//! ## Components
//! - **PES**: rule table loading and the per-tick decoder update
//! - **Modulatory filters**: read-only error-signal view consumed by learning
//! - **Voja**: encoder-learning trait, run after PES each tick
//!
//! ## Architecture
//! - Depends only on `ensemble-neural` (no scheduler dependency)
//! - The decoder matrix is borrowed mutably for the duration of a pass, so
//!   no locking is involved

pub mod modulatory;
pub mod pes;
pub mod voja;

pub use modulatory::ModulatoryFilters;
pub use pes::{
    ActivitySource, PesRule, PesRuleSet, PES_RECORD_WORDS, UNFILTERED_ACTIVITY_INDEX,
};
pub use voja::{EncoderLearning, NoEncoderLearning};
