//! Curve math kernel: token deltas across one price interval, the next sqrt price after a
//! known input or output, and the inverse liquidity sizing used by curve construction.
//!
//! Liquidity carries a 2^64 scale, so with Q64.64 sqrt prices:
//! - `Δquote = L · (√Pu − √Pl) / 2^128`
//! - `Δbase  = L · (√Pu − √Pl) / (√Pl · √Pu)`

use crate::error::CurveError;
use crate::math::core_arithmetic::{
    mul_div_u256, mul_div_u512, u256_to_u128, u256_to_u64, u512_to_u128, Rounding,
};
use crate::utils::constants::RESOLUTION;
use anchor_lang::prelude::*;
use ethnum::U256;
use primitive_types::U512;

/// Amount of base token moved when the price crosses `(lower, upper]` with `liquidity`.
///
/// # Arguments
///
/// * `lower_sqrt_price` - Lower bound of the interval, Q64.64.
/// * `upper_sqrt_price` - Upper bound of the interval, Q64.64.
/// * `liquidity` - Liquidity of the interval (2^64 scaled).
/// * `rounding` - `Up` when the trader pays the amount, `Down` when the trader receives it.
///
/// # Errors
///
/// - `InvalidSqrtPriceRange` if `lower_sqrt_price >= upper_sqrt_price` or `lower_sqrt_price == 0`.
/// - `MathOverflow` if the result does not fit in a `u64`.
#[inline(always)]
pub fn get_delta_amount_base_unsigned(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> Result<u64> {
    let result =
        get_delta_amount_base_unsigned_256(lower_sqrt_price, upper_sqrt_price, liquidity, rounding)?;
    u256_to_u64(result)
}

/// Same as [`get_delta_amount_base_unsigned`] without narrowing the result.
#[inline(always)]
pub fn get_delta_amount_base_unsigned_256(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256> {
    require!(
        lower_sqrt_price > 0 && lower_sqrt_price < upper_sqrt_price,
        CurveError::InvalidSqrtPriceRange
    );

    let numerator_1 = U256::from(liquidity);
    let numerator_2 = U256::from(upper_sqrt_price - lower_sqrt_price);
    // Two u128 factors always fit in 256 bits
    let denominator = U256::from(lower_sqrt_price) * U256::from(upper_sqrt_price);

    mul_div_u256(numerator_1, numerator_2, denominator, rounding)
}

/// Amount of quote token moved when the price crosses `(lower, upper]` with `liquidity`.
///
/// # Errors
///
/// - `InvalidSqrtPriceRange` if `lower_sqrt_price >= upper_sqrt_price`.
/// - `MathOverflow` if the result does not fit in a `u64`.
#[inline(always)]
pub fn get_delta_amount_quote_unsigned(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> Result<u64> {
    let result = get_delta_amount_quote_unsigned_256(
        lower_sqrt_price,
        upper_sqrt_price,
        liquidity,
        rounding,
    )?;
    u256_to_u64(result)
}

#[inline(always)]
pub fn get_delta_amount_quote_unsigned_256(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256> {
    require!(
        lower_sqrt_price < upper_sqrt_price,
        CurveError::InvalidSqrtPriceRange
    );

    let delta_sqrt_price = U256::from(upper_sqrt_price - lower_sqrt_price);
    let prod = U256::from(liquidity) * delta_sqrt_price;

    match rounding {
        Rounding::Up => {
            let denominator = U256::ONE << (RESOLUTION * 2);
            Ok((prod + (denominator - U256::ONE)) / denominator)
        }
        Rounding::Down => Ok(prod >> (RESOLUTION * 2)),
    }
}

/// Sqrt price after `amount_in` has been pushed into the interval holding `liquidity`.
///
/// Base input moves the price down, quote input moves it up. Both branches round so that the
/// new price never over-credits the trader: base input rounds the price up, quote input rounds
/// the price down.
///
/// # Errors
///
/// - `InvalidPrice` for a zero starting price, `ZeroLiquidity` for an empty interval.
/// - `MathOverflow` if the new price does not fit in 128 bits.
pub fn get_next_sqrt_price_from_input(
    sqrt_price: u128,
    liquidity: u128,
    amount_in: u64,
    base_for_quote: bool,
) -> Result<u128> {
    require!(sqrt_price > 0, CurveError::InvalidPrice);
    require!(liquidity > 0, CurveError::ZeroLiquidity);

    if base_for_quote {
        get_next_sqrt_price_from_amount_base_rounding_up(sqrt_price, liquidity, amount_in)
    } else {
        get_next_sqrt_price_from_amount_quote_rounding_down(sqrt_price, liquidity, amount_in)
    }
}

/// Sqrt price after `amount_out` has been taken out of the interval holding `liquidity`.
///
/// Quote output (base for quote) moves the price down, base output moves it up. Both branches
/// round against the trader so the input derived from the new price covers the output.
///
/// # Errors
///
/// - `InvalidPrice` / `ZeroLiquidity` for degenerate inputs.
/// - `InsufficientLiquidity` if the interval cannot release `amount_out`.
pub fn get_next_sqrt_price_from_output(
    sqrt_price: u128,
    liquidity: u128,
    amount_out: u64,
    base_for_quote: bool,
) -> Result<u128> {
    require!(sqrt_price > 0, CurveError::InvalidPrice);
    require!(liquidity > 0, CurveError::ZeroLiquidity);

    if base_for_quote {
        // √P' = √P − Δquote · 2^128 / L, quotient rounded up
        let quotient = mul_div_u256(
            U256::from(amount_out) << (RESOLUTION * 2),
            U256::ONE,
            U256::from(liquidity),
            Rounding::Up,
        )?;
        let current = U256::from(sqrt_price);
        require!(current > quotient, CurveError::InsufficientLiquidity);
        u256_to_u128(current - quotient)
    } else {
        if amount_out == 0 {
            return Ok(sqrt_price);
        }
        // √P' = L · √P / (L − Δbase · √P)
        let product = U256::from(amount_out) * U256::from(sqrt_price);
        let liquidity = U256::from(liquidity);
        require!(liquidity > product, CurveError::InsufficientLiquidity);
        let denominator = liquidity - product;
        let result = mul_div_u256(liquidity, U256::from(sqrt_price), denominator, Rounding::Up)?;
        u256_to_u128(result)
    }
}

// √P' = L · √P / (L + Δbase · √P)
fn get_next_sqrt_price_from_amount_base_rounding_up(
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
) -> Result<u128> {
    if amount == 0 {
        return Ok(sqrt_price);
    }
    let sqrt_price = U256::from(sqrt_price);
    let liquidity = U256::from(liquidity);
    let product = U256::from(amount) * sqrt_price;
    let denominator = liquidity
        .checked_add(product)
        .ok_or(CurveError::MathOverflow)?;
    let result = mul_div_u256(liquidity, sqrt_price, denominator, Rounding::Up)?;
    u256_to_u128(result)
}

// √P' = √P + Δquote · 2^128 / L
fn get_next_sqrt_price_from_amount_quote_rounding_down(
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
) -> Result<u128> {
    let quotient = (U256::from(amount) << (RESOLUTION * 2)) / U256::from(liquidity);
    let result = U256::from(sqrt_price)
        .checked_add(quotient)
        .ok_or(CurveError::MathOverflow)?;
    u256_to_u128(result)
}

// ---------- Inverse sizing ------------------------------------------------

/// Liquidity that releases `base_amount` of base token over `(sqrt_price, sqrt_max_price]`.
///
/// `L = Δbase · √P · √Pmax / (√Pmax − √P)`, rounded down so the interval never holds more base
/// than was budgeted for it.
pub fn get_initial_liquidity_from_delta_base(
    base_amount: u64,
    sqrt_max_price: u128,
    sqrt_price: u128,
) -> Result<u128> {
    require!(
        sqrt_price < sqrt_max_price,
        CurveError::InvalidSqrtPriceRange
    );
    let price_delta = U512::from(sqrt_max_price - sqrt_price);
    let prod = U512::from(base_amount) * U512::from(sqrt_price);
    let liquidity = mul_div_u512(prod, U512::from(sqrt_max_price), price_delta, Rounding::Down)?;
    u512_to_u128(liquidity)
}

/// Liquidity that absorbs `quote_amount` of quote token over `(sqrt_min_price, sqrt_price]`.
///
/// `L = Δquote · 2^128 / (√P − √Pmin)`, rounded down.
pub fn get_initial_liquidity_from_delta_quote(
    quote_amount: u64,
    sqrt_min_price: u128,
    sqrt_price: u128,
) -> Result<u128> {
    require!(
        sqrt_min_price < sqrt_price,
        CurveError::InvalidSqrtPriceRange
    );
    let price_delta = U512::from(sqrt_price - sqrt_min_price);
    let quote_amount = U512::from(quote_amount) << (RESOLUTION * 2) as usize;
    u512_to_u128(quote_amount / price_delta)
}

/// The largest liquidity over `(min_sqrt_price, max_sqrt_price]` that neither releases more than
/// `base_amount` nor absorbs more than `quote_amount`.
pub fn get_liquidity(
    base_amount: u64,
    quote_amount: u64,
    min_sqrt_price: u128,
    max_sqrt_price: u128,
) -> Result<u128> {
    let liquidity_from_base =
        get_initial_liquidity_from_delta_base(base_amount, max_sqrt_price, min_sqrt_price)?;
    let liquidity_from_quote =
        get_initial_liquidity_from_delta_quote(quote_amount, min_sqrt_price, max_sqrt_price)?;
    Ok(liquidity_from_base.min(liquidity_from_quote))
}
