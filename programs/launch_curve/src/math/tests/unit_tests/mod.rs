mod core_arithmetic_unit_tests;
mod liquidity_math_unit_tests;
