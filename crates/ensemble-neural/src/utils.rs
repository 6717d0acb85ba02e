// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Utility functions for startup allocation

use crate::types::{EnsembleError, Result};

/// Allocate `len` copies of `value`, reporting failure instead of aborting
///
/// Only called during initialisation. A length of zero never allocates.
pub fn try_alloc_filled<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>> {
    let mut values = Vec::new();
    if len == 0 {
        return Ok(values);
    }
    values
        .try_reserve_exact(len)
        .map_err(|_| EnsembleError::AllocationFailure {
            what,
            requested_bytes: len.saturating_mul(core::mem::size_of::<T>()),
        })?;
    values.resize(len, value);
    Ok(values)
}
