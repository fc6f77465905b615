use arbitrary::{Arbitrary, Unstructured};
use honggfuzz::fuzz;
use launch_curve::math::core_arithmetic::Rounding;
use launch_curve::math::liquidity_math::{
    get_delta_amount_base_unsigned, get_delta_amount_quote_unsigned,
    get_next_sqrt_price_from_input,
};
use launch_curve::utils::constants::{MAX_SQRT_PRICE, MIN_SQRT_PRICE};

#[derive(Debug, Clone)]
struct SegmentInput {
    lower: u128,
    upper: u128,
    liquidity: u128,
    amount_in: u64,
}

impl<'a> Arbitrary<'a> for SegmentInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let raw_a = u.int_in_range(MIN_SQRT_PRICE..=MAX_SQRT_PRICE - 1)?;
        let raw_b = u.int_in_range(MIN_SQRT_PRICE..=MAX_SQRT_PRICE - 1)?;
        let (lower, upper) = if raw_a < raw_b {
            (raw_a, raw_b)
        } else {
            (raw_b, raw_a + 1)
        };

        Ok(SegmentInput {
            lower,
            upper,
            liquidity: u.int_in_range(1..=u128::MAX)?,
            amount_in: u.arbitrary()?,
        })
    }
}

fn fuzz_segment(input: SegmentInput) {
    let SegmentInput {
        lower,
        upper,
        liquidity,
        amount_in,
    } = input;

    // Rounding up never returns less than rounding down
    if let (Ok(down), Ok(up)) = (
        get_delta_amount_base_unsigned(lower, upper, liquidity, Rounding::Down),
        get_delta_amount_base_unsigned(lower, upper, liquidity, Rounding::Up),
    ) {
        assert!(up >= down);
        assert!(up - down <= 1);
    }
    if let (Ok(down), Ok(up)) = (
        get_delta_amount_quote_unsigned(lower, upper, liquidity, Rounding::Down),
        get_delta_amount_quote_unsigned(lower, upper, liquidity, Rounding::Up),
    ) {
        assert!(up >= down);
        assert!(up - down <= 1);
    }

    // Quote in moves the price up and is never over-credited
    if let Ok(next) = get_next_sqrt_price_from_input(lower, liquidity, amount_in, false) {
        assert!(next >= lower);
        if next > lower {
            if let Ok(cost) = get_delta_amount_quote_unsigned(lower, next, liquidity, Rounding::Up) {
                assert!(cost <= amount_in);
            }
        }
    }

    // Base in moves the price down and is never over-credited
    if let Ok(next) = get_next_sqrt_price_from_input(upper, liquidity, amount_in, true) {
        assert!(next <= upper);
        if next > 0 && next < upper {
            if let Ok(cost) = get_delta_amount_base_unsigned(next, upper, liquidity, Rounding::Up) {
                assert!(cost <= amount_in);
            }
        }
    }
}

fn main() {
    loop {
        fuzz!(|data: SegmentInput| {
            fuzz_segment(data);
        });
    }
}
