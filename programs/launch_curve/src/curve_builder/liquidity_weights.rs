//! Sixteen geometric price steps between the initial and migration market caps, with the
//! liquidity of each step proportional to a caller-supplied weight.
//!
//! With `K_i` the weights and `L_i = l0·K_i`, the base released by the curve plus the base paired
//! with the migration quote must equal the supply left after vesting and leftover `T`:
//!
//! ```text
//! T = l0 · Σ K_i·Δ_i·(1/(p_{i-1}·p_i) + (100 − fee)/(100·pMax²))
//! ```
//!
//! Each `L_i` is evaluated directly from that closed form with a 2^256 scale.

use crate::curve_builder::finalize_config;
use crate::curve_builder::params::BuildCurveWithLiquidityWeightsParams;
use crate::curve_builder::supply::get_base_token_for_swap;
use crate::error::CurveError;
use crate::math::core_arithmetic::{mul_div_u64, u256_to_u64, u512_to_u128, Rounding};
use crate::math::liquidity_math::get_delta_amount_quote_unsigned_256;
use crate::math::price_math::sqrt_price_from_market_cap;
use crate::state::{ConfigParameters, LiquidityDistributionParameters};
use crate::utils::constants::{LIQUIDITY_WEIGHTS_SEGMENTS, ONE_Q64, RESOLUTION};
use anchor_lang::prelude::*;
use ethnum::U256;
use primitive_types::U512;
use rust_decimal::Decimal;
use tracing::debug;

/// `p0 = p_0 < p_1 < … < p_16 = p_max` with a constant ratio between neighbours.
pub fn get_geometric_ladder(
    p0: u128,
    p_max: u128,
) -> Result<[u128; LIQUIDITY_WEIGHTS_SEGMENTS + 1]> {
    require!(p0 > 0 && p0 < p_max, CurveError::InvalidLaunchParameters);
    let mut ratio = (U512::from(p_max) << RESOLUTION as usize) / U512::from(p0);
    // 16th root as four successive Q64.64 square roots
    for _ in 0..4 {
        ratio = (ratio << RESOLUTION as usize).integer_sqrt();
    }
    require!(
        ratio > U512::from(ONE_Q64),
        CurveError::InvalidLaunchParameters
    );

    let mut prices = [0u128; LIQUIDITY_WEIGHTS_SEGMENTS + 1];
    prices[0] = p0;
    for i in 1..LIQUIDITY_WEIGHTS_SEGMENTS {
        let next = (U512::from(prices[i - 1]) * ratio) >> RESOLUTION as usize;
        prices[i] = u512_to_u128(next)?;
        require!(prices[i] > prices[i - 1], CurveError::InvalidLaunchParameters);
    }
    prices[LIQUIDITY_WEIGHTS_SEGMENTS] = p_max;
    require!(
        prices[LIQUIDITY_WEIGHTS_SEGMENTS - 1] < p_max,
        CurveError::InvalidLaunchParameters
    );
    Ok(prices)
}

/// Quote needed to walk the whole curve from `sqrt_start_price`, unbounded by `u64`.
pub fn get_curve_quote_capacity(
    sqrt_start_price: u128,
    curve: &[LiquidityDistributionParameters],
) -> Result<U256> {
    let mut capacity = U256::ZERO;
    let mut lower = sqrt_start_price;
    for segment in curve {
        let amount = get_delta_amount_quote_unsigned_256(
            lower,
            segment.sqrt_price,
            segment.liquidity,
            Rounding::Up,
        )?;
        capacity = capacity
            .checked_add(amount)
            .ok_or(CurveError::MathOverflow)?;
        lower = segment.sqrt_price;
    }
    Ok(capacity)
}

// Weights as integers on a common decimal scale
fn scale_weights(
    weights: &[Decimal; LIQUIDITY_WEIGHTS_SEGMENTS],
) -> Result<[U512; LIQUIDITY_WEIGHTS_SEGMENTS]> {
    let max_scale = weights.iter().map(|w| w.scale()).max().unwrap_or(0);
    let mut scaled = [U512::zero(); LIQUIDITY_WEIGHTS_SEGMENTS];
    for (slot, weight) in scaled.iter_mut().zip(weights.iter()) {
        require!(
            *weight > Decimal::ZERO,
            CurveError::InvalidLaunchParameters
        );
        let mantissa =
            u128::try_from(weight.mantissa()).map_err(|_| CurveError::InvalidLaunchParameters)?;
        *slot = U512::from(mantissa) * U512::exp10((max_scale - weight.scale()) as usize);
    }
    Ok(scaled)
}

pub fn build_curve_with_liquidity_weights(
    params: &BuildCurveWithLiquidityWeightsParams,
) -> Result<ConfigParameters> {
    let base = &params.base;
    let prepared = base.prepare()?;
    let fee_percentage = base.migration_fee.fee_percentage;
    require!(
        fee_percentage < 100,
        CurveError::InvalidMigrationFeePercentage
    );

    let p0 = sqrt_price_from_market_cap(
        params.initial_market_cap,
        base.total_token_supply,
        base.token_base_decimal,
        base.token_quote_decimal,
    )?;
    let p_max = sqrt_price_from_market_cap(
        params.migration_market_cap,
        base.total_token_supply,
        base.token_base_decimal,
        base.token_quote_decimal,
    )?;
    let prices = get_geometric_ladder(p0, p_max)?;
    let weights = scale_weights(&params.liquidity_weights)?;

    let target = prepared
        .total_supply
        .checked_sub(prepared.locked_vesting_amount)
        .and_then(|v| v.checked_sub(prepared.leftover))
        .filter(|v| *v > 0)
        .ok_or(CurveError::InvalidTokenSupply)?;

    let scale = U512::one() << (RESOLUTION * 4) as usize;
    let p_max_squared = U512::from(p_max) * U512::from(p_max);
    let migration_term = U512::from(100 - fee_percentage as u64) * scale / p_max_squared;

    let mut denominator = U512::zero();
    for (i, weight) in weights.iter().enumerate() {
        let (lower, upper) = (U512::from(prices[i]), U512::from(prices[i + 1]));
        let swap_term = U512::from(100u8) * scale / (lower * upper);
        let term = weight
            .checked_mul(upper - lower)
            .and_then(|v| v.checked_mul(swap_term + migration_term))
            .ok_or(CurveError::MathOverflow)?;
        denominator = denominator
            .checked_add(term)
            .ok_or(CurveError::MathOverflow)?;
    }
    require!(!denominator.is_zero(), CurveError::InvalidLaunchParameters);

    let numerator = U512::from(target) * U512::from(100u8) * scale;
    let mut curve = Vec::with_capacity(LIQUIDITY_WEIGHTS_SEGMENTS);
    for (i, weight) in weights.iter().enumerate() {
        let liquidity = numerator
            .checked_mul(*weight)
            .ok_or(CurveError::MathOverflow)?
            / denominator;
        let liquidity = u512_to_u128(liquidity)?;
        require!(liquidity > 0, CurveError::InvalidLaunchParameters);
        curve.push(LiquidityDistributionParameters {
            sqrt_price: prices[i + 1],
            liquidity,
        });
    }

    let swap_amount = get_base_token_for_swap(p0, p_max, &curve)?;
    let migration_base_amount = target
        .checked_sub(swap_amount)
        .ok_or(CurveError::InvalidTokenSupply)?;
    let migration_quote_amount = u512_to_u128(
        (U512::from(migration_base_amount) * p_max_squared) >> (RESOLUTION * 2) as usize,
    )?;
    let migration_quote_amount =
        u64::try_from(migration_quote_amount).map_err(|_| CurveError::MathOverflow)?;

    let quote_capacity = get_curve_quote_capacity(p0, &curve)?;
    let migration_quote_threshold = mul_div_u64(
        migration_quote_amount,
        100,
        100 - fee_percentage as u64,
        Rounding::Up,
    )?;
    let migration_quote_threshold =
        u256_to_u64(U256::from(migration_quote_threshold).min(quote_capacity))?;
    require!(
        migration_quote_threshold > 0,
        CurveError::InvalidQuoteThreshold
    );
    debug!(
        swap_amount,
        migration_base_amount, migration_quote_threshold, "liquidity weights solved"
    );

    finalize_config(base, prepared, migration_quote_threshold, p0, curve)
}
