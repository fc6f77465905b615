use crate::math::core_arithmetic::*;
use crate::utils::constants::ONE_Q64;
use proptest::prelude::*;

fn positive_q64x64() -> impl Strategy<Value = Q64x64> {
    (1u128..=(u64::MAX as u128) << 32).prop_map(Q64x64::from_raw)
}

proptest! {
    #[test]
    fn test_mul_div_up_exceeds_down_by_at_most_one(
        a in any::<u64>(),
        b in any::<u64>(),
        c in 1u64..=u64::MAX,
    ) {
        let down = mul_div_u128(a as u128, b as u128, c as u128, Rounding::Down).unwrap();
        let up = mul_div_u128(a as u128, b as u128, c as u128, Rounding::Up).unwrap();
        prop_assert!(up - down <= 1);
        prop_assert_eq!(up == down, (a as u128 * b as u128) % c as u128 == 0);
    }

    #[test]
    fn test_mul_div_by_same_factor_is_identity(a in any::<u64>(), b in 1u64..=u64::MAX) {
        prop_assert_eq!(mul_div_u64(a, b, b, Rounding::Down).unwrap(), a);
        prop_assert_eq!(mul_div_u64(a, b, b, Rounding::Up).unwrap(), a);
    }

    #[test]
    fn test_q64x64_mul_then_div_recovers_value(a in positive_q64x64(), b in 1u64..=1_000_000u64) {
        let factor = Q64x64::from_int(b);
        let product = a.checked_mul(factor).unwrap();
        prop_assert_eq!(product.checked_div(factor).unwrap(), a);
    }

    #[test]
    fn test_pow_q64_never_exceeds_one_for_fractions(raw in 0u128..=ONE_Q64, exp in 0u64..5_000) {
        let value = pow_q64(Q64x64::from_raw(raw), exp).unwrap();
        prop_assert!(value <= Q64x64::one());
        if exp > 0 {
            prop_assert!(value <= Q64x64::from_raw(raw));
        }
    }
}
