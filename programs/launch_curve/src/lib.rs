//! # launch_curve
//!
//! Pricing, fee and curve construction math for bonding-curve token launches.
//!
//! A launch sells a base token along a piecewise-liquidity curve until a quote threshold is
//! reached, after which the remaining base and the raised quote migrate into a constant-product
//! or concentrated-liquidity pool.
//!
//! ## Components
//! - [`math`]: Q64.64 fixed point, the per-segment liquidity kernel and price conversions.
//! - [`fees`]: base fee schedules, the rate limiter and the volatility surcharge.
//! - [`state`]: launch configuration, its validation and the pool snapshot read by quotes.
//! - [`quote`]: exact-in, partial-fill and exact-out swap quotes across the curve.
//! - [`curve_builder`]: solves launch economics into a validated configuration.

pub mod curve_builder;
pub mod error;
pub mod fees;
pub mod math;
pub mod quote;
pub mod state;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use curve_builder::{
    build_curve, build_curve_with_liquidity_weights, build_curve_with_market_cap,
    build_curve_with_mid_price, build_curve_with_two_segments,
};
pub use error::{CurveError, ErrorKind};
pub use quote::{get_swap_quote, SlippageBound, SwapMode, SwapQuote, SwapQuoteRequest};
pub use state::{ConfigParameters, CurveConfig, PoolState};
