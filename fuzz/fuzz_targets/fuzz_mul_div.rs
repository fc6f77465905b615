use arbitrary::Arbitrary;
use ethnum::U256;
use honggfuzz::fuzz;
use launch_curve::math::core_arithmetic::{mul_div_u128, mul_div_u256, Rounding};
use launch_curve::CurveError;

#[derive(Debug, Clone, Arbitrary)]
struct MulDivInput {
    a: u128,
    b: u128,
    c: u128,
}

fn fuzz_mul_div_operations(input: MulDivInput) {
    let MulDivInput { a, b, c } = input;

    let down = mul_div_u128(a, b, c, Rounding::Down);
    let up = mul_div_u128(a, b, c, Rounding::Up);

    if c == 0 {
        assert_eq!(down.unwrap_err(), CurveError::DivisionByZero.into());
        assert_eq!(up.unwrap_err(), CurveError::DivisionByZero.into());
        return;
    }

    let exact = U256::from(a) * U256::from(b) / U256::from(c);
    match down {
        Ok(value) => {
            assert_eq!(U256::from(value), exact);
            if a == 0 || b == 0 {
                assert_eq!(value, 0);
            }
            if let Ok(rounded) = up {
                assert!(rounded >= value);
                assert!(rounded - value <= 1);
            }
        }
        Err(e) => {
            assert_eq!(e, CurveError::MathOverflow.into());
            assert!(exact > U256::from(u128::MAX));
        }
    }

    // The 256-bit variant never overflows on u128 operands
    let wide = mul_div_u256(U256::from(a), U256::from(b), U256::from(c), Rounding::Down).unwrap();
    assert_eq!(wide, exact);
}

fn main() {
    loop {
        fuzz!(|data: MulDivInput| {
            fuzz_mul_div_operations(data);
        });
    }
}
