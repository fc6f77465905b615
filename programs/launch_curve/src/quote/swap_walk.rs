//! Segment walkers. Buys walk the curve forward from the current price, sells walk it
//! backward down to the start price. Each walker returns what it could not fill instead of
//! failing, so exact and partial modes share one implementation.

use crate::math::core_arithmetic::{u256_to_u64, Rounding};
use crate::math::liquidity_math::{
    get_delta_amount_base_unsigned, get_delta_amount_base_unsigned_256,
    get_delta_amount_quote_unsigned, get_delta_amount_quote_unsigned_256,
    get_next_sqrt_price_from_input, get_next_sqrt_price_from_output,
};
use crate::state::LiquidityDistributionParameters;
use anchor_lang::prelude::*;
use ethnum::U256;
use tracing::trace;

/// Result of walking a known input through the curve.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapAmountFromInput {
    pub output_amount: u64,
    pub next_sqrt_price: u128,
    /// Input the curve could not absorb before its bound.
    pub amount_left: u64,
}

/// Result of walking a known output through the curve.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapAmountFromOutput {
    pub input_amount: u64,
    pub next_sqrt_price: u128,
    /// Output the curve could not release before its bound.
    pub amount_left: u64,
}

// Kernel deltas reject empty intervals; inside a walk an empty step just moves nothing.
fn delta_base(lower: u128, upper: u128, liquidity: u128, rounding: Rounding) -> Result<u64> {
    if lower >= upper {
        return Ok(0);
    }
    get_delta_amount_base_unsigned(lower, upper, liquidity, rounding)
}

fn delta_quote(lower: u128, upper: u128, liquidity: u128, rounding: Rounding) -> Result<u64> {
    if lower >= upper {
        return Ok(0);
    }
    get_delta_amount_quote_unsigned(lower, upper, liquidity, rounding)
}

/// Capacity of one step, kept wide: a segment up to `MAX_SQRT_PRICE` can hold far more
/// than a `u64` of quote.
#[derive(Copy, Clone, Debug)]
enum StepCapacity {
    /// `amount_left` ends inside the step.
    Partial,
    /// The step is consumed whole; the capacity fits in `amount_left`.
    Full(u64),
}

fn step_capacity(amount_left: u64, capacity: U256) -> Result<StepCapacity> {
    if U256::from(amount_left) < capacity {
        Ok(StepCapacity::Partial)
    } else {
        Ok(StepCapacity::Full(u256_to_u64(capacity)?))
    }
}

fn base_capacity(lower: u128, upper: u128, liquidity: u128, rounding: Rounding) -> Result<U256> {
    if lower >= upper {
        return Ok(U256::ZERO);
    }
    get_delta_amount_base_unsigned_256(lower, upper, liquidity, rounding)
}

fn quote_capacity(lower: u128, upper: u128, liquidity: u128, rounding: Rounding) -> Result<U256> {
    if lower >= upper {
        return Ok(U256::ZERO);
    }
    get_delta_amount_quote_unsigned_256(lower, upper, liquidity, rounding)
}

fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| crate::error::CurveError::MathOverflow.into())
}

/// Segments below the current price, top first: `(lower, liquidity)` of each interval.
fn segments_below(
    sqrt_start_price: u128,
    curve: &[LiquidityDistributionParameters],
) -> impl Iterator<Item = (u128, u128)> + '_ {
    (0..curve.len()).rev().map(move |i| {
        let lower = if i == 0 {
            sqrt_start_price
        } else {
            curve[i - 1].sqrt_price
        };
        (lower, curve[i].liquidity)
    })
}

/// Buy: quote in, base out, price moving up until `sqrt_price_limit`.
pub fn calculate_quote_to_base_from_amount_in(
    curve: &[LiquidityDistributionParameters],
    current_sqrt_price: u128,
    amount_in: u64,
    sqrt_price_limit: u128,
) -> Result<SwapAmountFromInput> {
    let mut total_output_amount = 0u64;
    let mut current_sqrt_price = current_sqrt_price;
    let mut amount_left = amount_in;

    for segment in curve {
        if amount_left == 0 || current_sqrt_price >= sqrt_price_limit {
            break;
        }
        let upper_sqrt_price = segment.sqrt_price.min(sqrt_price_limit);
        if upper_sqrt_price <= current_sqrt_price {
            continue;
        }

        let max_amount_in = quote_capacity(
            current_sqrt_price,
            upper_sqrt_price,
            segment.liquidity,
            Rounding::Up,
        )?;
        match step_capacity(amount_left, max_amount_in)? {
            StepCapacity::Partial => {
                let next_sqrt_price = get_next_sqrt_price_from_input(
                    current_sqrt_price,
                    segment.liquidity,
                    amount_left,
                    false,
                )?;
                let output_amount = delta_base(
                    current_sqrt_price,
                    next_sqrt_price,
                    segment.liquidity,
                    Rounding::Down,
                )?;
                total_output_amount = checked_add(total_output_amount, output_amount)?;
                current_sqrt_price = next_sqrt_price;
                amount_left = 0;
            }
            StepCapacity::Full(max_amount_in) => {
                let output_amount = delta_base(
                    current_sqrt_price,
                    upper_sqrt_price,
                    segment.liquidity,
                    Rounding::Down,
                )?;
                total_output_amount = checked_add(total_output_amount, output_amount)?;
                current_sqrt_price = upper_sqrt_price;
                amount_left -= max_amount_in;
            }
        }
        trace!(
            sqrt_price = current_sqrt_price,
            amount_left,
            "quote to base step"
        );
    }

    Ok(SwapAmountFromInput {
        output_amount: total_output_amount,
        next_sqrt_price: current_sqrt_price,
        amount_left,
    })
}

/// Sell: base in, quote out, price moving down until `sqrt_start_price`.
pub fn calculate_base_to_quote_from_amount_in(
    curve: &[LiquidityDistributionParameters],
    sqrt_start_price: u128,
    current_sqrt_price: u128,
    amount_in: u64,
) -> Result<SwapAmountFromInput> {
    let mut total_output_amount = 0u64;
    let mut current_sqrt_price = current_sqrt_price;
    let mut amount_left = amount_in;

    for (lower_sqrt_price, liquidity) in segments_below(sqrt_start_price, curve) {
        if amount_left == 0 {
            break;
        }
        if lower_sqrt_price >= current_sqrt_price {
            continue;
        }

        let max_amount_in =
            base_capacity(lower_sqrt_price, current_sqrt_price, liquidity, Rounding::Up)?;
        match step_capacity(amount_left, max_amount_in)? {
            StepCapacity::Partial => {
                let next_sqrt_price = get_next_sqrt_price_from_input(
                    current_sqrt_price,
                    liquidity,
                    amount_left,
                    true,
                )?;
                let output_amount =
                    delta_quote(next_sqrt_price, current_sqrt_price, liquidity, Rounding::Down)?;
                total_output_amount = checked_add(total_output_amount, output_amount)?;
                current_sqrt_price = next_sqrt_price;
                amount_left = 0;
            }
            StepCapacity::Full(max_amount_in) => {
                let output_amount =
                    delta_quote(lower_sqrt_price, current_sqrt_price, liquidity, Rounding::Down)?;
                total_output_amount = checked_add(total_output_amount, output_amount)?;
                current_sqrt_price = lower_sqrt_price;
                amount_left -= max_amount_in;
            }
        }
        trace!(
            sqrt_price = current_sqrt_price,
            amount_left,
            "base to quote step"
        );
    }

    Ok(SwapAmountFromInput {
        output_amount: total_output_amount,
        next_sqrt_price: current_sqrt_price,
        amount_left,
    })
}

/// Buy for a fixed base output.
pub fn calculate_quote_to_base_from_amount_out(
    curve: &[LiquidityDistributionParameters],
    current_sqrt_price: u128,
    amount_out: u64,
) -> Result<SwapAmountFromOutput> {
    let mut total_input_amount = 0u64;
    let mut current_sqrt_price = current_sqrt_price;
    let mut amount_left = amount_out;

    for segment in curve {
        if amount_left == 0 {
            break;
        }
        if segment.sqrt_price <= current_sqrt_price {
            continue;
        }

        let max_amount_out = base_capacity(
            current_sqrt_price,
            segment.sqrt_price,
            segment.liquidity,
            Rounding::Down,
        )?;
        match step_capacity(amount_left, max_amount_out)? {
            StepCapacity::Partial => {
                let next_sqrt_price = get_next_sqrt_price_from_output(
                    current_sqrt_price,
                    segment.liquidity,
                    amount_left,
                    false,
                )?;
                let input_amount = delta_quote(
                    current_sqrt_price,
                    next_sqrt_price,
                    segment.liquidity,
                    Rounding::Up,
                )?;
                total_input_amount = checked_add(total_input_amount, input_amount)?;
                current_sqrt_price = next_sqrt_price;
                amount_left = 0;
            }
            StepCapacity::Full(max_amount_out) => {
                let input_amount = delta_quote(
                    current_sqrt_price,
                    segment.sqrt_price,
                    segment.liquidity,
                    Rounding::Up,
                )?;
                total_input_amount = checked_add(total_input_amount, input_amount)?;
                current_sqrt_price = segment.sqrt_price;
                amount_left -= max_amount_out;
            }
        }
    }

    Ok(SwapAmountFromOutput {
        input_amount: total_input_amount,
        next_sqrt_price: current_sqrt_price,
        amount_left,
    })
}

/// Sell for a fixed quote output.
pub fn calculate_base_to_quote_from_amount_out(
    curve: &[LiquidityDistributionParameters],
    sqrt_start_price: u128,
    current_sqrt_price: u128,
    amount_out: u64,
) -> Result<SwapAmountFromOutput> {
    let mut total_input_amount = 0u64;
    let mut current_sqrt_price = current_sqrt_price;
    let mut amount_left = amount_out;

    for (lower_sqrt_price, liquidity) in segments_below(sqrt_start_price, curve) {
        if amount_left == 0 {
            break;
        }
        if lower_sqrt_price >= current_sqrt_price {
            continue;
        }

        let max_amount_out =
            quote_capacity(lower_sqrt_price, current_sqrt_price, liquidity, Rounding::Down)?;
        match step_capacity(amount_left, max_amount_out)? {
            StepCapacity::Partial => {
                let next_sqrt_price = get_next_sqrt_price_from_output(
                    current_sqrt_price,
                    liquidity,
                    amount_left,
                    true,
                )?;
                let input_amount =
                    delta_base(next_sqrt_price, current_sqrt_price, liquidity, Rounding::Up)?;
                total_input_amount = checked_add(total_input_amount, input_amount)?;
                current_sqrt_price = next_sqrt_price;
                amount_left = 0;
            }
            StepCapacity::Full(max_amount_out) => {
                let input_amount =
                    delta_base(lower_sqrt_price, current_sqrt_price, liquidity, Rounding::Up)?;
                total_input_amount = checked_add(total_input_amount, input_amount)?;
                current_sqrt_price = lower_sqrt_price;
                amount_left -= max_amount_out;
            }
        }
    }

    Ok(SwapAmountFromOutput {
        input_amount: total_input_amount,
        next_sqrt_price: current_sqrt_price,
        amount_left,
    })
}
