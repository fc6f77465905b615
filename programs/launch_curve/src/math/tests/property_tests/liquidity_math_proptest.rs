use crate::math::core_arithmetic::Rounding;
use crate::math::liquidity_math::*;
use crate::utils::constants::ONE_Q64;
use proptest::prelude::*;

fn sqrt_price() -> impl Strategy<Value = u128> {
    (ONE_Q64 / 1_000)..=(1_000 * ONE_Q64)
}

fn liquidity() -> impl Strategy<Value = u128> {
    (1_000_000u128..=1_000_000_000_000u128).prop_map(|l| l << 64)
}

proptest! {
    #[test]
    fn test_rounding_up_never_below_down(
        lower in sqrt_price(),
        width in 1u128..=ONE_Q64,
        liquidity in liquidity(),
    ) {
        let upper = lower + width;
        let base_down = get_delta_amount_base_unsigned(lower, upper, liquidity, Rounding::Down).unwrap();
        let base_up = get_delta_amount_base_unsigned(lower, upper, liquidity, Rounding::Up).unwrap();
        prop_assert!(base_up >= base_down && base_up - base_down <= 1);

        let quote_down = get_delta_amount_quote_unsigned(lower, upper, liquidity, Rounding::Down).unwrap();
        let quote_up = get_delta_amount_quote_unsigned(lower, upper, liquidity, Rounding::Up).unwrap();
        prop_assert!(quote_up >= quote_down && quote_up - quote_down <= 1);
    }

    #[test]
    fn test_quote_input_never_over_credits(
        price in sqrt_price(),
        liquidity in liquidity(),
        amount_in in 1u64..=1_000_000_000_000u64,
    ) {
        let next = get_next_sqrt_price_from_input(price, liquidity, amount_in, false).unwrap();
        prop_assert!(next >= price);
        if next > price {
            let absorbed = get_delta_amount_quote_unsigned(price, next, liquidity, Rounding::Up).unwrap();
            prop_assert!(absorbed <= amount_in);
        }
    }

    #[test]
    fn test_base_input_never_over_credits(
        price in sqrt_price(),
        liquidity in liquidity(),
        amount_in in 1u64..=1_000_000_000_000u64,
    ) {
        let next = get_next_sqrt_price_from_input(price, liquidity, amount_in, true).unwrap();
        prop_assert!(next <= price);
        if next < price {
            let absorbed = get_delta_amount_base_unsigned(next, price, liquidity, Rounding::Up).unwrap();
            prop_assert!(absorbed <= amount_in);
        }
    }

    #[test]
    fn test_larger_buys_move_price_further(
        price in sqrt_price(),
        liquidity in liquidity(),
        amount_in in 1u64..=1_000_000_000u64,
        extra in 1u64..=1_000_000_000u64,
    ) {
        let small = get_next_sqrt_price_from_input(price, liquidity, amount_in, false).unwrap();
        let large = get_next_sqrt_price_from_input(price, liquidity, amount_in + extra, false).unwrap();
        prop_assert!(large >= small);
    }
}
