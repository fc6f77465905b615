//! Protocol-wide constants shared by the quote engine and the curve builders.
//!
//! Sqrt prices are Q64.64 values; fee numerators are fractions of [`FEE_DENOMINATOR`].

pub const RESOLUTION: u32 = 64; // Q64.64
pub const ONE_Q64: u128 = 1u128 << RESOLUTION;

pub const MIN_SQRT_PRICE: u128 = 4295048016;
pub const MAX_SQRT_PRICE: u128 = 79226673521066979257578248091;

/// Maximum number of `(sqrt_price, liquidity)` points in a curve.
pub const MAX_CURVE_POINT: usize = 16;

pub const BASIS_POINT_MAX: u64 = 10_000;
pub const FEE_DENOMINATOR: u64 = 1_000_000_000;
pub const MIN_FEE_NUMERATOR: u64 = 100_000; // 0.01%
pub const MAX_FEE_NUMERATOR: u64 = 990_000_000; // 99%

/// Share of every trading fee routed to the protocol, in percent.
pub const PROTOCOL_FEE_PERCENT: u8 = 20;
/// Share of the trading fee paid to a referrer when one is present, in percent.
pub const REFERRAL_FEE_PERCENT: u8 = 20;
/// The volatility surcharge never exceeds this share of the base fee, in percent.
pub const MAX_DYNAMIC_FEE_PERCENT: u8 = 20;

// Dynamic fee defaults
pub const BIN_STEP_BPS_DEFAULT: u16 = 1;
// bin_step << 64 / BASIS_POINT_MAX
pub const BIN_STEP_BPS_U128_DEFAULT: u128 = 1_844_674_407_370_955;
pub const DYNAMIC_FEE_FILTER_PERIOD_DEFAULT: u16 = 10;
pub const DYNAMIC_FEE_DECAY_PERIOD_DEFAULT: u16 = 120;
pub const DYNAMIC_FEE_REDUCTION_FACTOR_DEFAULT: u16 = 5_000;
pub const MAX_PRICE_CHANGE_BPS_DEFAULT: u16 = 1_500;
pub const DYNAMIC_FEE_SCALING_FACTOR: u128 = 100_000_000_000;
pub const U24_MAX: u32 = 0xFF_FFFF;

// Rate limiter window ceilings
pub const MAX_RATE_LIMITER_DURATION_IN_SLOTS: u64 = 108_000;
pub const MAX_RATE_LIMITER_DURATION_IN_SECONDS: u64 = 43_200;

// Migration
pub const MAX_MIGRATION_FEE_PERCENTAGE: u8 = 50;
pub const MAX_CREATOR_MIGRATION_FEE_PERCENTAGE: u8 = 100;
pub const MIN_MIGRATED_POOL_FEE_BPS: u16 = 10;
pub const MAX_MIGRATED_POOL_FEE_BPS: u16 = 1_000;

// Token decimals accepted for launches
pub const MIN_BASE_TOKEN_DECIMALS: u8 = 6;
pub const MAX_BASE_TOKEN_DECIMALS: u8 = 9;
pub const MAX_QUOTE_TOKEN_DECIMALS: u8 = 9;

/// Extra headroom, in percent, reserved on top of the swap supply for rounding on the way up.
pub const SWAP_BUFFER_PERCENTAGE: u64 = 25;

/// Number of geometric steps in a liquidity-weights curve.
pub const LIQUIDITY_WEIGHTS_SEGMENTS: usize = 16;
