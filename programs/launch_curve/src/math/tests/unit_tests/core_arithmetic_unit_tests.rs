use crate::error::CurveError;
use crate::math::core_arithmetic::*;
use crate::utils::constants::ONE_Q64;
use ethnum::U256;
use primitive_types::U512;

#[test]
fn test_q64x64_construction() {
    assert_eq!(Q64x64::zero().raw(), 0);
    assert_eq!(Q64x64::one().raw(), ONE_Q64);
    assert_eq!(Q64x64::from_int(5).raw(), 5u128 << 64);
    assert_eq!(Q64x64::from_raw(12345).raw(), 12345);
}

#[test]
fn test_q64x64_mul_div() {
    let two = Q64x64::from_int(2);
    let three = Q64x64::from_int(3);
    assert_eq!(two.checked_mul(three).unwrap(), Q64x64::from_int(6));
    // ONE is the multiplicative identity
    assert_eq!(three.checked_mul(Q64x64::one()).unwrap(), three);

    let quarter = Q64x64::one().checked_div(Q64x64::from_int(4)).unwrap();
    assert_eq!(quarter.raw(), ONE_Q64 / 4);
    assert_eq!(
        two.checked_div(Q64x64::zero()).unwrap_err(),
        CurveError::DivisionByZero.into()
    );
}

#[test]
fn test_q64x64_add_sub_bounds() {
    let max = Q64x64::from_raw(u128::MAX);
    assert_eq!(
        max.checked_add(Q64x64::from_raw(1)).unwrap_err(),
        CurveError::MathOverflow.into()
    );
    assert_eq!(
        Q64x64::zero().checked_sub(Q64x64::from_raw(1)).unwrap_err(),
        CurveError::MathUnderflow.into()
    );
    assert_eq!(
        Q64x64::from_int(7)
            .checked_sub(Q64x64::from_int(2))
            .unwrap(),
        Q64x64::from_int(5)
    );
}

#[test]
fn test_mul_div_rounding() {
    assert_eq!(mul_div_u64(10, 3, 4, Rounding::Down).unwrap(), 7);
    assert_eq!(mul_div_u64(10, 3, 4, Rounding::Up).unwrap(), 8);
    // Exact quotients are unaffected by the direction
    assert_eq!(mul_div_u64(8, 2, 4, Rounding::Down).unwrap(), 4);
    assert_eq!(mul_div_u64(8, 2, 4, Rounding::Up).unwrap(), 4);

    assert_eq!(
        mul_div_u128(ONE_Q64, 3, 2, Rounding::Down).unwrap(),
        3 * ONE_Q64 / 2
    );
}

#[test]
fn test_mul_div_wide_intermediate() {
    // u64::MAX² overflows 64 bits but not the intermediate
    assert_eq!(
        mul_div_u64(u64::MAX, u64::MAX, u64::MAX, Rounding::Down).unwrap(),
        u64::MAX
    );
    assert_eq!(
        mul_div_u128(u128::MAX, u128::MAX, u128::MAX, Rounding::Up).unwrap(),
        u128::MAX
    );
}

#[test]
fn test_mul_div_errors() {
    assert_eq!(
        mul_div_u64(1, 1, 0, Rounding::Down).unwrap_err(),
        CurveError::DivisionByZero.into()
    );
    assert_eq!(
        mul_div_u64(u64::MAX, 2, 1, Rounding::Down).unwrap_err(),
        CurveError::MathOverflow.into()
    );
    assert_eq!(
        mul_div_u256(U256::MAX, U256::from(2u8), U256::ONE, Rounding::Down).unwrap_err(),
        CurveError::MathOverflow.into()
    );
    assert_eq!(
        mul_div_u512(U512::one(), U512::one(), U512::zero(), Rounding::Up).unwrap_err(),
        CurveError::DivisionByZero.into()
    );
}

#[test]
fn test_mul_div_u512_rounding() {
    let a = U512::from(u128::MAX) << 128;
    let result = mul_div_u512(a, U512::from(3u8), U512::from(2u8) << 128, Rounding::Down).unwrap();
    // (2^128 − 1) · 3 / 2, odd numerator
    assert_eq!(result, (U512::from(u128::MAX) * U512::from(3u8)) / U512::from(2u8));
    let up = mul_div_u512(a, U512::from(3u8), U512::from(2u8) << 128, Rounding::Up).unwrap();
    assert_eq!(up, result + U512::one());
}

#[test]
fn test_shl_div() {
    assert_eq!(shl_div(1, 4, 64).unwrap(), ONE_Q64 / 4);
    assert_eq!(shl_div(3, 1, 64).unwrap(), 3 * ONE_Q64);
    assert!(shl_div(1, 0, 64).is_err());
    assert!(shl_div(u128::MAX, 1, 64).is_err());
}

#[test]
fn test_narrowing() {
    assert_eq!(u256_to_u128(U256::from(u128::MAX)).unwrap(), u128::MAX);
    assert!(u256_to_u128(U256::from(u128::MAX) + U256::ONE).is_err());
    assert_eq!(u256_to_u64(U256::from(u64::MAX)).unwrap(), u64::MAX);
    assert!(u256_to_u64(U256::from(u64::MAX) + U256::ONE).is_err());
    assert_eq!(u512_to_u128(U512::from(42u8)).unwrap(), 42);
    assert!(u512_to_u128(U512::from(u128::MAX) + U512::one()).is_err());
    assert_eq!(u128_to_u64(7).unwrap(), 7);
    assert!(u128_to_u64(u64::MAX as u128 + 1).is_err());
}

#[test]
fn test_pow_q64() {
    let half = Q64x64::from_raw(ONE_Q64 / 2);
    assert_eq!(pow_q64(half, 0).unwrap(), Q64x64::one());
    assert_eq!(pow_q64(half, 1).unwrap(), half);
    assert_eq!(pow_q64(half, 3).unwrap().raw(), ONE_Q64 / 8);
    assert_eq!(pow_q64(Q64x64::one(), 1_000).unwrap(), Q64x64::one());

    // 0.99^n decays monotonically
    let base = Q64x64::from_raw(ONE_Q64 / 100 * 99);
    let mut previous = Q64x64::one();
    for n in 1..20 {
        let value = pow_q64(base, n).unwrap();
        assert!(value < previous);
        previous = value;
    }

    assert_eq!(
        pow_q64(Q64x64::from_int(2), 64).unwrap_err(),
        CurveError::MathOverflow.into()
    );
}
