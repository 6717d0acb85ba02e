// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for ensemble startup
//!
//! Every variant here is raised while the element is being initialised.
//! Steady-state tick processing never produces an error.

/// Errors raised while loading or allocating ensemble state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnsembleError {
    /// A startup memory request could not be satisfied
    #[error("failed to allocate {what}: {requested_bytes} bytes")]
    AllocationFailure {
        what: &'static str,
        requested_bytes: usize,
    },

    /// A configuration region holds fewer words than its header declares
    #[error("region `{region}` too short: expected {expected_words} words, found {actual_words}")]
    RegionTooShort {
        region: &'static str,
        expected_words: usize,
        actual_words: usize,
    },

    /// Sizes or counts disagree with the declared neuron/population counts
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    /// Activity filter index that is neither the unfiltered sentinel nor a valid index
    #[error("invalid activity filter index {0}")]
    InvalidActivityIndex(i32),
}

pub type Result<T> = core::result::Result<T, EnsembleError>;
