//! Conversions between human-unit prices (`Decimal`, quote per whole base token) and Q64.64
//! sqrt prices expressed in lamport units.
//!
//! `sqrt_price = floor(sqrt(price · 10^quote_decimals / 10^base_decimals) · 2^64)`, evaluated
//! as an integer square root of a 512-bit intermediate so the result is bit-exact.

use crate::error::CurveError;
use crate::math::core_arithmetic::{u512_to_u128, Rounding};
use crate::utils::constants::{MAX_SQRT_PRICE, MIN_SQRT_PRICE, RESOLUTION};
use anchor_lang::prelude::*;
use primitive_types::U512;
use rust_decimal::Decimal;

/// Largest scale `rust_decimal` can represent.
const MAX_DECIMAL_SCALE: u32 = 28;

#[inline(always)]
fn pow10(exp: u32) -> U512 {
    U512::exp10(exp as usize)
}

/// Splits a strictly positive decimal into `(mantissa, scale)`.
fn positive_parts(value: Decimal) -> Result<(U512, u32)> {
    require!(value.is_sign_positive() && !value.is_zero(), CurveError::InvalidPrice);
    let mantissa = u128::try_from(value.mantissa()).map_err(|_| CurveError::InvalidPrice)?;
    Ok((U512::from(mantissa), value.scale()))
}

// floor(sqrt(numerator · 2^128 / denominator)), range checked
fn sqrt_price_from_fraction(numerator: U512, denominator: U512) -> Result<u128> {
    require!(!denominator.is_zero(), CurveError::DivisionByZero);
    let shifted = numerator
        .checked_mul(U512::one() << (RESOLUTION * 2) as usize)
        .ok_or(CurveError::MathOverflow)?;
    let sqrt_price = u512_to_u128((shifted / denominator).integer_sqrt())
        .map_err(|_| CurveError::InvalidPrice)?;
    require!(
        (MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&sqrt_price),
        CurveError::InvalidPrice
    );
    Ok(sqrt_price)
}

/// Q64.64 sqrt price for `price` quote tokens per base token.
///
/// # Errors
///
/// `InvalidPrice` if the price is not strictly positive or the resulting sqrt price falls
/// outside `[MIN_SQRT_PRICE, MAX_SQRT_PRICE]`.
pub fn sqrt_price_from_price(
    price: Decimal,
    base_decimals: u8,
    quote_decimals: u8,
) -> Result<u128> {
    let (mantissa, scale) = positive_parts(price)?;
    let numerator = mantissa * pow10(quote_decimals as u32);
    let denominator = pow10(scale + base_decimals as u32);
    sqrt_price_from_fraction(numerator, denominator)
}

/// Q64.64 sqrt price at which `total_supply` whole base tokens are worth `market_cap` quote.
pub fn sqrt_price_from_market_cap(
    market_cap: Decimal,
    total_supply: u64,
    base_decimals: u8,
    quote_decimals: u8,
) -> Result<u128> {
    require!(total_supply > 0, CurveError::InvalidTokenSupply);
    let (mantissa, scale) = positive_parts(market_cap)?;
    let numerator = mantissa * pow10(quote_decimals as u32);
    let denominator = pow10(scale + base_decimals as u32) * U512::from(total_supply);
    sqrt_price_from_fraction(numerator, denominator)
}

/// Q64.64 sqrt price of `quote_amount / base_amount`, both in lamports.
pub fn sqrt_price_from_amounts(quote_amount: u64, base_amount: u64) -> Result<u128> {
    require!(quote_amount > 0, CurveError::InvalidPrice);
    sqrt_price_from_fraction(U512::from(quote_amount), U512::from(base_amount))
}

/// Human-unit price for a Q64.64 sqrt price, truncated to the finest scale that fits a `Decimal`.
pub fn price_from_sqrt_price(
    sqrt_price: u128,
    base_decimals: u8,
    quote_decimals: u8,
) -> Result<Decimal> {
    let numerator = U512::from(sqrt_price) * U512::from(sqrt_price) * pow10(base_decimals as u32);
    let denominator = (U512::one() << (RESOLUTION * 2) as usize) * pow10(quote_decimals as u32);
    // Decimal mantissas are 96 bits wide
    let mantissa_limit = U512::one() << 96usize;

    for scale in (0..=MAX_DECIMAL_SCALE).rev() {
        let mantissa = numerator * pow10(scale) / denominator;
        if mantissa < mantissa_limit {
            return Decimal::try_from_i128_with_scale(mantissa.low_u128() as i128, scale)
                .map_err(|_| CurveError::MathOverflow.into());
        }
    }
    Err(CurveError::MathOverflow.into())
}

/// Converts a human-unit amount into base units of a token with `decimals` decimals.
pub fn to_lamports(amount: Decimal, decimals: u8, rounding: Rounding) -> Result<u64> {
    require!(!amount.is_sign_negative(), CurveError::InvalidLaunchParameters);
    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| CurveError::MathOverflow)?;
    let numerator = U512::from(mantissa) * pow10(decimals as u32);
    let denominator = pow10(amount.scale());
    let (q, r) = numerator.div_mod(denominator);
    let result = match rounding {
        Rounding::Up if !r.is_zero() => q + U512::one(),
        _ => q,
    };
    u64::try_from(u512_to_u128(result)?).map_err(|_| CurveError::MathOverflow.into())
}

/// Converts base units back into a human-unit amount.
pub fn from_lamports(amount: u64, decimals: u8) -> Result<Decimal> {
    Decimal::try_from_i128_with_scale(amount as i128, decimals as u32)
        .map_err(|_| CurveError::InvalidTokenDecimals.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::ONE_Q64;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unit_price_with_equal_decimals() {
        assert_eq!(sqrt_price_from_price(dec!(1), 9, 9).unwrap(), ONE_Q64);
        assert_eq!(sqrt_price_from_price(dec!(4), 6, 6).unwrap(), 2 * ONE_Q64);
    }

    #[test]
    fn test_decimals_shift_the_lamport_price() {
        // 1 whole base (10^6 units) for 1 whole quote (10^9 units) is 1000 units per unit
        let sqrt_price = sqrt_price_from_price(dec!(1), 6, 9).unwrap();
        let price = price_from_sqrt_price(sqrt_price, 6, 9).unwrap();
        assert!((price - dec!(1)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_round_trip_small_price() {
        let sqrt_price = sqrt_price_from_price(dec!(0.000001), 6, 9).unwrap();
        let price = price_from_sqrt_price(sqrt_price, 6, 9).unwrap();
        assert!(price <= dec!(0.000001));
        assert!(dec!(0.000001) - price < dec!(0.00000000001));
    }

    #[test]
    fn test_market_cap_matches_price() {
        let from_cap = sqrt_price_from_market_cap(dec!(1000), 1_000_000, 6, 9).unwrap();
        let from_price = sqrt_price_from_price(dec!(0.001), 6, 9).unwrap();
        assert_eq!(from_cap, from_price);
    }

    #[test]
    fn test_rejects_non_positive_price() {
        assert_eq!(
            sqrt_price_from_price(dec!(0), 6, 9).unwrap_err(),
            CurveError::InvalidPrice.into()
        );
        assert_eq!(
            sqrt_price_from_price(dec!(-1), 6, 9).unwrap_err(),
            CurveError::InvalidPrice.into()
        );
    }

    #[test]
    fn test_rejects_out_of_range_price() {
        assert!(sqrt_price_from_price(dec!(0.0000000000000000000000000001), 9, 0).is_err());
        assert!(sqrt_price_from_price(dec!(100000000000000000000), 0, 9).is_err());
    }

    #[test]
    fn test_lamport_conversion_rounding() {
        assert_eq!(to_lamports(dec!(1.5), 6, Rounding::Down).unwrap(), 1_500_000);
        assert_eq!(to_lamports(dec!(0.0000001), 6, Rounding::Down).unwrap(), 0);
        assert_eq!(to_lamports(dec!(0.0000001), 6, Rounding::Up).unwrap(), 1);
        assert!(to_lamports(dec!(100000000000), 9, Rounding::Down).is_err());
        assert_eq!(from_lamports(1_500_000, 6).unwrap(), dec!(1.5));
    }

    #[test]
    fn test_sqrt_price_from_lamport_amounts() {
        assert_eq!(sqrt_price_from_amounts(4, 1).unwrap(), 2 * ONE_Q64);
        assert_eq!(sqrt_price_from_amounts(1_000, 4_000).unwrap(), ONE_Q64 / 2);
        assert!(sqrt_price_from_amounts(0, 1).is_err());
        assert!(sqrt_price_from_amounts(1, 0).is_err());
    }
}
