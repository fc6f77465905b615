//! Two liquidity segments over `p0 < p1 < p2`.
//!
//! With swap supply `S` and `C = threshold · 2^128`, the liquidities solve
//!
//! ```text
//! l0·(p1 − p0)/(p0·p1) + l1·(p2 − p1)/(p1·p2) = S
//! l0·(p1 − p0)         + l1·(p2 − p1)         = C
//! ```
//!
//! which gives
//!
//! ```text
//! l0 = p0·(S·p1·p2 − C) / ((p2 − p0)·(p1 − p0))
//! l1 = p2·(C − S·p0·p1) / ((p2 − p0)·(p2 − p1))
//! ```
//!
//! A mid price is feasible only when both are strictly positive, i.e. `S·p0·p1 < C < S·p1·p2`.

use crate::curve_builder::params::{
    BuildCurveBaseParams, BuildCurveWithMidPriceParams, BuildCurveWithTwoSegmentsParams,
};
use crate::curve_builder::supply::get_migration_base_token;
use crate::curve_builder::finalize_config;
use crate::error::CurveError;
use crate::math::core_arithmetic::{mul_div_u64, u512_to_u128, Rounding};
use crate::math::price_math::{sqrt_price_from_market_cap, sqrt_price_from_price, to_lamports};
use crate::state::{get_migration_quote_amount, ConfigParameters, LiquidityDistributionParameters};
use crate::utils::constants::RESOLUTION;
use anchor_lang::prelude::*;
use primitive_types::U512;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Derives a mid sqrt price from the outer sqrt prices.
pub type MidPriceCandidate = fn(u128, u128) -> Result<u128>;

/// `√(p0·p2)`
pub fn geometric_mid_price(p0: u128, p2: u128) -> Result<u128> {
    u512_to_u128((U512::from(p0) * U512::from(p2)).integer_sqrt())
}

/// `(p0·p2³)^¼`, closer to the migration price.
pub fn upper_mid_price(p0: u128, p2: u128) -> Result<u128> {
    let p2 = U512::from(p2);
    u512_to_u128((U512::from(p0) * p2 * p2 * p2).integer_sqrt().integer_sqrt())
}

/// `(p0³·p2)^¼`, closer to the start price.
pub fn lower_mid_price(p0: u128, p2: u128) -> Result<u128> {
    let p0 = U512::from(p0);
    u512_to_u128((p0 * p0 * p0 * U512::from(p2)).integer_sqrt().integer_sqrt())
}

/// Mid prices tried, in order, when none is given.
pub const MID_PRICE_CANDIDATES: [MidPriceCandidate; 3] =
    [geometric_mid_price, upper_mid_price, lower_mid_price];

/// `(l0, l1)` for the mid price `p1`, or `None` when either would not be strictly positive.
pub fn solve_two_segment(
    p0: u128,
    p1: u128,
    p2: u128,
    swap_amount: u64,
    migration_quote_threshold: u64,
) -> Result<Option<(u128, u128)>> {
    if !(p0 < p1 && p1 < p2) {
        return Ok(None);
    }
    let (p0, p1, p2) = (U512::from(p0), U512::from(p1), U512::from(p2));
    let s = U512::from(swap_amount);
    let c = U512::from(migration_quote_threshold) << (RESOLUTION * 2) as usize;

    let s_p1_p2 = s * p1 * p2;
    let s_p0_p1 = s * p0 * p1;
    if s_p1_p2 <= c || c <= s_p0_p1 {
        return Ok(None);
    }

    let span = p2 - p0;
    let l0 = p0 * (s_p1_p2 - c) / (span * (p1 - p0));
    let l1 = p2 * (c - s_p0_p1) / (span * (p2 - p1));
    if l0.is_zero() || l1.is_zero() {
        return Ok(None);
    }
    Ok(Some((u512_to_u128(l0)?, u512_to_u128(l1)?)))
}

/// First feasible `(p1, l0, l1)` among `candidates`.
///
/// # Errors
///
/// `InfeasibleCurve` when every candidate yields a non-positive liquidity.
pub fn select_mid_price(
    p0: u128,
    p2: u128,
    swap_amount: u64,
    migration_quote_threshold: u64,
    candidates: &[MidPriceCandidate],
) -> Result<(u128, u128, u128)> {
    for (index, candidate) in candidates.iter().enumerate() {
        let p1 = candidate(p0, p2)?;
        match solve_two_segment(p0, p1, p2, swap_amount, migration_quote_threshold)? {
            Some((l0, l1)) => {
                debug!(index, p1, l0, l1, "mid price accepted");
                return Ok((p1, l0, l1));
            }
            None => warn!(index, p1, "mid price infeasible"),
        }
    }
    err!(CurveError::InfeasibleCurve)
}

/// Two segments between the initial and migration market caps, mid price chosen from
/// [`MID_PRICE_CANDIDATES`].
pub fn build_curve_with_two_segments(
    params: &BuildCurveWithTwoSegmentsParams,
) -> Result<ConfigParameters> {
    build_two_segment_curve(
        &params.base,
        params.initial_market_cap,
        params.migration_market_cap,
        params.percentage_supply_on_migration,
        None,
    )
}

/// Two segments meeting at an explicit `mid_price`.
pub fn build_curve_with_mid_price(
    params: &BuildCurveWithMidPriceParams,
) -> Result<ConfigParameters> {
    build_two_segment_curve(
        &params.base,
        params.initial_market_cap,
        params.migration_market_cap,
        params.percentage_supply_on_migration,
        Some(params.mid_price),
    )
}

fn build_two_segment_curve(
    base: &BuildCurveBaseParams,
    initial_market_cap: Decimal,
    migration_market_cap: Decimal,
    percentage_supply_on_migration: Decimal,
    mid_price: Option<Decimal>,
) -> Result<ConfigParameters> {
    let prepared = base.prepare()?;
    require!(
        percentage_supply_on_migration > Decimal::ZERO
            && percentage_supply_on_migration < Decimal::ONE_HUNDRED,
        CurveError::InvalidLaunchParameters
    );

    let (base_decimal, quote_decimal) = (base.token_base_decimal, base.token_quote_decimal);
    let p0 = sqrt_price_from_market_cap(
        initial_market_cap,
        base.total_token_supply,
        base_decimal,
        quote_decimal,
    )?;
    let p2 = sqrt_price_from_market_cap(
        migration_market_cap,
        base.total_token_supply,
        base_decimal,
        quote_decimal,
    )?;
    require!(p0 < p2, CurveError::InvalidLaunchParameters);

    let migration_base_supply = Decimal::from(base.total_token_supply)
        .checked_mul(percentage_supply_on_migration)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(CurveError::MathOverflow)?;
    let migration_base_supply = to_lamports(migration_base_supply, base_decimal, Rounding::Down)?;
    let migration_quote_amount = u512_to_u128(
        (U512::from(migration_base_supply) * U512::from(p2) * U512::from(p2))
            >> (RESOLUTION * 2) as usize,
    )?;
    let migration_quote_amount =
        u64::try_from(migration_quote_amount).map_err(|_| CurveError::MathOverflow)?;
    let fee_percentage = base.migration_fee.fee_percentage;
    let migration_quote_threshold = mul_div_u64(
        migration_quote_amount,
        100,
        100 - fee_percentage.min(99) as u64,
        Rounding::Up,
    )?;
    require!(
        migration_quote_threshold > 0,
        CurveError::InvalidQuoteThreshold
    );

    let migration_base_amount = get_migration_base_token(
        get_migration_quote_amount(migration_quote_threshold, fee_percentage)?,
        p2,
        base.migration_option,
    )?;
    let swap_amount = prepared.swap_supply(migration_base_amount)?;

    let (p1, l0, l1) = match mid_price {
        Some(mid_price) => {
            let p1 = sqrt_price_from_price(mid_price, base_decimal, quote_decimal)?;
            require!(p0 < p1 && p1 < p2, CurveError::InvalidLaunchParameters);
            let (l0, l1) =
                solve_two_segment(p0, p1, p2, swap_amount, migration_quote_threshold)?
                    .ok_or(CurveError::InfeasibleCurve)?;
            (p1, l0, l1)
        }
        None => select_mid_price(
            p0,
            p2,
            swap_amount,
            migration_quote_threshold,
            &MID_PRICE_CANDIDATES,
        )?,
    };

    let curve = vec![
        LiquidityDistributionParameters {
            sqrt_price: p1,
            liquidity: l0,
        },
        LiquidityDistributionParameters {
            sqrt_price: p2,
            liquidity: l1,
        },
    ];
    finalize_config(base, prepared, migration_quote_threshold, p0, curve)
}
