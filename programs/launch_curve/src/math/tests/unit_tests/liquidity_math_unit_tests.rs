use crate::error::CurveError;
use crate::math::core_arithmetic::Rounding;
use crate::math::liquidity_math::*;
use crate::utils::constants::ONE_Q64;

const L: u128 = 1_000u128 << 64;

#[test]
fn test_delta_amounts_on_unit_interval() {
    // Δbase = 1000 · (2 − 1) / (1 · 2)
    assert_eq!(
        get_delta_amount_base_unsigned(ONE_Q64, 2 * ONE_Q64, L, Rounding::Down).unwrap(),
        500
    );
    // Δquote = 1000 · (2 − 1)
    assert_eq!(
        get_delta_amount_quote_unsigned(ONE_Q64, 2 * ONE_Q64, L, Rounding::Down).unwrap(),
        1_000
    );
}

#[test]
fn test_delta_amounts_round_in_requested_direction() {
    let liquidity = L + 1;
    assert_eq!(
        get_delta_amount_base_unsigned(ONE_Q64, 2 * ONE_Q64, liquidity, Rounding::Down).unwrap(),
        500
    );
    assert_eq!(
        get_delta_amount_base_unsigned(ONE_Q64, 2 * ONE_Q64, liquidity, Rounding::Up).unwrap(),
        501
    );
    assert_eq!(
        get_delta_amount_quote_unsigned(ONE_Q64, 2 * ONE_Q64, liquidity, Rounding::Down).unwrap(),
        1_000
    );
    assert_eq!(
        get_delta_amount_quote_unsigned(ONE_Q64, 2 * ONE_Q64, liquidity, Rounding::Up).unwrap(),
        1_001
    );
}

#[test]
fn test_delta_amounts_reject_empty_interval() {
    assert_eq!(
        get_delta_amount_base_unsigned(ONE_Q64, ONE_Q64, L, Rounding::Down).unwrap_err(),
        CurveError::InvalidSqrtPriceRange.into()
    );
    assert_eq!(
        get_delta_amount_base_unsigned(0, ONE_Q64, L, Rounding::Down).unwrap_err(),
        CurveError::InvalidSqrtPriceRange.into()
    );
    assert_eq!(
        get_delta_amount_quote_unsigned(2 * ONE_Q64, ONE_Q64, L, Rounding::Up).unwrap_err(),
        CurveError::InvalidSqrtPriceRange.into()
    );
}

#[test]
fn test_delta_amount_overflows_u64() {
    let huge = u128::MAX;
    assert_eq!(
        get_delta_amount_quote_unsigned(ONE_Q64, 4 * ONE_Q64, huge, Rounding::Down).unwrap_err(),
        CurveError::MathOverflow.into()
    );
    // The wide variant keeps the value
    assert!(
        get_delta_amount_quote_unsigned_256(ONE_Q64, 4 * ONE_Q64, huge, Rounding::Down).is_ok()
    );
}

#[test]
fn test_next_sqrt_price_from_input() {
    // Quote in: √P' = 1 + 1000 / 1000
    assert_eq!(
        get_next_sqrt_price_from_input(ONE_Q64, L, 1_000, false).unwrap(),
        2 * ONE_Q64
    );
    // Base in: √P' = 1000 · 2 / (1000 + 500 · 2)
    assert_eq!(
        get_next_sqrt_price_from_input(2 * ONE_Q64, L, 500, true).unwrap(),
        ONE_Q64
    );
    assert_eq!(
        get_next_sqrt_price_from_input(2 * ONE_Q64, L, 0, true).unwrap(),
        2 * ONE_Q64
    );
}

#[test]
fn test_next_sqrt_price_from_output() {
    // Quote out: √P' = 2 − 1000 / 1000
    assert_eq!(
        get_next_sqrt_price_from_output(2 * ONE_Q64, L, 1_000, true).unwrap(),
        ONE_Q64
    );
    // Base out: √P' = 1000 · 1 / (1000 − 500 · 1)
    assert_eq!(
        get_next_sqrt_price_from_output(ONE_Q64, L, 500, false).unwrap(),
        2 * ONE_Q64
    );
}

#[test]
fn test_next_sqrt_price_from_output_exhausts_interval() {
    assert_eq!(
        get_next_sqrt_price_from_output(2 * ONE_Q64, L, 2_000, true).unwrap_err(),
        CurveError::InsufficientLiquidity.into()
    );
    assert_eq!(
        get_next_sqrt_price_from_output(ONE_Q64, L, 1_000, false).unwrap_err(),
        CurveError::InsufficientLiquidity.into()
    );
}

#[test]
fn test_next_sqrt_price_degenerate_inputs() {
    assert_eq!(
        get_next_sqrt_price_from_input(0, L, 1, false).unwrap_err(),
        CurveError::InvalidPrice.into()
    );
    assert_eq!(
        get_next_sqrt_price_from_input(ONE_Q64, 0, 1, false).unwrap_err(),
        CurveError::ZeroLiquidity.into()
    );
    assert_eq!(
        get_next_sqrt_price_from_output(ONE_Q64, 0, 1, true).unwrap_err(),
        CurveError::ZeroLiquidity.into()
    );
}

#[test]
fn test_initial_liquidity_sizing() {
    // L = 1000 · 1 · 2 / (2 − 1)
    assert_eq!(
        get_initial_liquidity_from_delta_base(1_000, 2 * ONE_Q64, ONE_Q64).unwrap(),
        2_000u128 << 64
    );
    // L = 1000 / (2 − 1)
    assert_eq!(
        get_initial_liquidity_from_delta_quote(1_000, ONE_Q64, 2 * ONE_Q64).unwrap(),
        1_000u128 << 64
    );
    assert_eq!(
        get_liquidity(1_000, 500, ONE_Q64, 2 * ONE_Q64).unwrap(),
        500u128 << 64
    );
    assert!(get_initial_liquidity_from_delta_base(1_000, ONE_Q64, ONE_Q64).is_err());
    assert!(get_initial_liquidity_from_delta_quote(1_000, 2 * ONE_Q64, ONE_Q64).is_err());
}

#[test]
fn test_sized_liquidity_releases_at_most_budget() {
    let (lower, upper) = (ONE_Q64 + 12_345, 3 * ONE_Q64 + 678);
    let budget = 987_654_321;
    let liquidity = get_initial_liquidity_from_delta_base(budget, upper, lower).unwrap();
    let released = get_delta_amount_base_unsigned(lower, upper, liquidity, Rounding::Down).unwrap();
    assert!(released <= budget);
    assert!(budget - released <= 1);
}
