//! # launch_curve::math::core_arithmetic
//!
//! Checked fixed-point helpers shared by every other component.
//!
//! ## Features
//! - `Q64x64`: transparent wrapper for Q64.64 values with checked arithmetic.
//! - `mul_div_*`: `(a * b) / c` evaluated with a 256-bit intermediate, rounding direction chosen
//!   by the caller. Rounding decides which side (protocol or trader) keeps the remainder, so every
//!   call site names it explicitly.
//! - `pow_q64`: binary exponentiation of a Q64.64 base, used by the exponential fee scheduler.
//! - Narrowing helpers that fail with `MathOverflow` instead of truncating.
//!
//! ## Safety & Determinism
//! - All arithmetic is checked; nothing wraps or saturates silently.
//! - No floating point anywhere in this module.

use crate::error::CurveError;
use crate::utils::constants::{ONE_Q64, RESOLUTION};
use anchor_lang::prelude::*;
use ethnum::U256;
use primitive_types::U512;

/// Rounding direction for an integer division.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rounding {
    Up,
    Down,
}

// ---------- Core Fixed-Point Wrapper ---------------------------------------

#[repr(transparent)]
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord)]
/// A fixed-point number with 64 integer bits and 64 fractional bits, stored as a `u128`.
///
/// The value is interpreted as `raw / 2^64`.
pub struct Q64x64(u128);

impl Q64x64 {
    #[inline(always)]
    pub const fn raw(self) -> u128 {
        self.0
    }

    #[inline(always)]
    pub const fn from_raw(v: u128) -> Self {
        Self(v)
    }

    #[inline(always)]
    pub const fn from_int(x: u64) -> Self {
        Self((x as u128) << RESOLUTION)
    }

    #[inline(always)]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[inline(always)]
    pub const fn one() -> Self {
        Self(ONE_Q64)
    }

    /// `self * rhs`, truncated toward zero.
    #[inline(always)]
    pub fn checked_mul(self, rhs: Self) -> Result<Self> {
        let prod = (U256::from(self.0) * U256::from(rhs.0)) >> RESOLUTION;
        Ok(Self(u256_to_u128(prod)?))
    }

    /// `self / rhs`, truncated toward zero.
    #[inline(always)]
    pub fn checked_div(self, rhs: Self) -> Result<Self> {
        require!(rhs.0 != 0, CurveError::DivisionByZero);
        let num = U256::from(self.0) << RESOLUTION;
        Ok(Self(u256_to_u128(num / U256::from(rhs.0))?))
    }

    #[inline(always)]
    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        Ok(Self(self.0.checked_add(rhs.0).ok_or(CurveError::MathOverflow)?))
    }

    #[inline(always)]
    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        Ok(Self(self.0.checked_sub(rhs.0).ok_or(CurveError::MathUnderflow)?))
    }
}

// ---------- Narrowing -------------------------------------------------------

#[inline(always)]
pub fn u256_to_u128(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(CurveError::MathOverflow.into());
    }
    Ok(value.as_u128())
}

#[inline(always)]
pub fn u256_to_u64(value: U256) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(CurveError::MathOverflow.into());
    }
    Ok(value.as_u128() as u64)
}

#[inline(always)]
pub fn u512_to_u128(value: U512) -> Result<u128> {
    if value > U512::from(u128::MAX) {
        return Err(CurveError::MathOverflow.into());
    }
    Ok(value.low_u128())
}

#[inline(always)]
pub fn u128_to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| CurveError::MathOverflow.into())
}

// ---------- mul_div family --------------------------------------------------

/// `(a * b) / c` on 256-bit operands with explicit rounding.
///
/// Fails on a zero divisor or when `a * b` does not fit in 256 bits.
#[inline(always)]
pub fn mul_div_u256(a: U256, b: U256, c: U256, rounding: Rounding) -> Result<U256> {
    require!(c != U256::ZERO, CurveError::DivisionByZero);
    let prod = a.checked_mul(b).ok_or(CurveError::MathOverflow)?;
    let (q, r) = (prod / c, prod % c);
    match rounding {
        Rounding::Down => Ok(q),
        Rounding::Up if r == U256::ZERO => Ok(q),
        Rounding::Up => Ok(q + U256::ONE),
    }
}

#[inline(always)]
pub fn mul_div_u128(a: u128, b: u128, c: u128, rounding: Rounding) -> Result<u128> {
    let result = mul_div_u256(U256::from(a), U256::from(b), U256::from(c), rounding)?;
    u256_to_u128(result)
}

#[inline(always)]
pub fn mul_div_u64(a: u64, b: u64, c: u64, rounding: Rounding) -> Result<u64> {
    let result = mul_div_u256(U256::from(a), U256::from(b), U256::from(c), rounding)?;
    u256_to_u64(result)
}

/// Floor of `(x << offset) / y`.
#[inline(always)]
pub fn shl_div(x: u128, y: u128, offset: u32) -> Result<u128> {
    require!(y != 0, CurveError::DivisionByZero);
    let num = U256::from(x) << offset;
    u256_to_u128(num / U256::from(y))
}

/// `(a * b) / c` on 512-bit operands. Used by curve construction, where products of three
/// sqrt prices and an amount routinely exceed 256 bits.
#[inline(always)]
pub fn mul_div_u512(a: U512, b: U512, c: U512, rounding: Rounding) -> Result<U512> {
    require!(!c.is_zero(), CurveError::DivisionByZero);
    let prod = a.checked_mul(b).ok_or(CurveError::MathOverflow)?;
    let (q, r) = prod.div_mod(c);
    match rounding {
        Rounding::Down => Ok(q),
        Rounding::Up if r.is_zero() => Ok(q),
        Rounding::Up => Ok(q + U512::one()),
    }
}

// ---------- Power -----------------------------------------------------------

/// `base^exp` for a Q64.64 base, every intermediate product rounded down.
///
/// Only bases `<= 1.0` are used by the fee scheduler, which keeps every step in range; larger
/// bases fail with `MathOverflow` once the result leaves Q64.64.
pub fn pow_q64(base: Q64x64, exp: u64) -> Result<Q64x64> {
    let mut result = Q64x64::one();
    let mut squared = base;
    let mut e = exp;
    while e > 0 {
        if e & 1 == 1 {
            result = result.checked_mul(squared)?;
        }
        e >>= 1;
        if e > 0 {
            squared = squared.checked_mul(squared)?;
        }
    }
    Ok(result)
}
