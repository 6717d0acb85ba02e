// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Numeric type abstractions for decoder, error and membrane values
//!
//! Configuration regions carry values as signed 32-bit S16.15 words. The
//! element computes in that format by default ([`S1615`]); `f32` is provided
//! for host-side analysis and for exact arithmetic in tests.

use core::fmt;

/// Signed 32-bit fixed point with 15 fractional bits
pub type S1615 = fixed::types::I17F15;

/// Number of fractional bits in an S16.15 word
pub const S1615_FRAC_BITS: u32 = 15;

/// Trait for values stored in decoders, filters and neuron state
///
/// Arithmetic saturates instead of panicking or wrapping: the hot path runs
/// under a hard real-time budget and has no way to report an overflow.
pub trait NeuralValue:
    Copy + Clone + Send + Sync + fmt::Debug + PartialEq + PartialOrd + 'static
{
    fn from_f32(value: f32) -> Self;
    fn to_f32(self) -> f32;

    /// Decode a raw S16.15 region word
    fn from_s1615_bits(bits: i32) -> Self;

    /// Encode as a raw S16.15 region word
    fn to_s1615_bits(self) -> i32;

    fn zero() -> Self;
    fn one() -> Self;
    fn saturating_add(self, other: Self) -> Self;
    fn saturating_sub(self, other: Self) -> Self;
    fn saturating_mul(self, other: Self) -> Self;
}

impl NeuralValue for f32 {
    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_s1615_bits(bits: i32) -> Self {
        bits as f32 / (1u32 << S1615_FRAC_BITS) as f32
    }

    #[inline]
    fn to_s1615_bits(self) -> i32 {
        <S1615 as NeuralValue>::from_f32(self).to_bits()
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn one() -> Self {
        1.0
    }

    #[inline(always)]
    fn saturating_add(self, other: Self) -> Self {
        self + other
    }

    #[inline(always)]
    fn saturating_sub(self, other: Self) -> Self {
        self - other
    }

    #[inline(always)]
    fn saturating_mul(self, other: Self) -> Self {
        self * other
    }
}

impl NeuralValue for S1615 {
    #[inline]
    fn from_f32(value: f32) -> Self {
        if value.is_nan() {
            return S1615::ZERO;
        }
        S1615::saturating_from_num(value)
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self.to_num::<f32>()
    }

    #[inline(always)]
    fn from_s1615_bits(bits: i32) -> Self {
        S1615::from_bits(bits)
    }

    #[inline(always)]
    fn to_s1615_bits(self) -> i32 {
        self.to_bits()
    }

    #[inline(always)]
    fn zero() -> Self {
        S1615::ZERO
    }

    #[inline(always)]
    fn one() -> Self {
        S1615::ONE
    }

    #[inline(always)]
    fn saturating_add(self, other: Self) -> Self {
        S1615::saturating_add(self, other)
    }

    #[inline(always)]
    fn saturating_sub(self, other: Self) -> Self {
        S1615::saturating_sub(self, other)
    }

    #[inline(always)]
    fn saturating_mul(self, other: Self) -> Self {
        S1615::saturating_mul(self, other)
    }
}
