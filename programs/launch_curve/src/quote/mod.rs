//! # launch_curve::quote
//!
//! Per-trade quoting against a [`CurveConfig`] and a [`PoolState`] snapshot.
//!
//! Three request shapes are answered:
//! - exact in: the whole input must fit on the curve, otherwise `InsufficientLiquidity`;
//! - partial fill: like exact in, but the unfilled input is returned to the caller;
//! - exact out: the input needed for a fixed output.
//!
//! Fees are taken from the input before it reaches the curve or from the output after it,
//! as decided by [`FeeMode`]. Slippage bounds are reported, never enforced.

pub mod swap_walk;

use crate::error::CurveError;
use crate::fees::{get_fee_on_amount, FeeBreakdown, FeeMode};
use crate::math::core_arithmetic::{mul_div_u64, Rounding};
use crate::state::{CurveConfig, PoolState, TradeDirection};
use crate::utils::constants::{BASIS_POINT_MAX, MAX_SQRT_PRICE};
use anchor_lang::prelude::*;
use swap_walk::{
    calculate_base_to_quote_from_amount_in, calculate_base_to_quote_from_amount_out,
    calculate_quote_to_base_from_amount_in, calculate_quote_to_base_from_amount_out,
    SwapAmountFromInput,
};
use tracing::debug;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwapMode {
    ExactIn { amount_in: u64 },
    PartialFill { amount_in: u64 },
    ExactOut { amount_out: u64 },
}

impl SwapMode {
    pub fn amount(&self) -> u64 {
        match *self {
            SwapMode::ExactIn { amount_in } | SwapMode::PartialFill { amount_in } => amount_in,
            SwapMode::ExactOut { amount_out } => amount_out,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapQuoteRequest {
    pub trade_direction: TradeDirection,
    pub swap_mode: SwapMode,
    /// Tolerance used for the reported bound, at most 10000.
    pub slippage_bps: u16,
    pub has_referral: bool,
    /// Slot or timestamp of the trade, matching the config's activation type.
    pub current_point: u64,
}

/// Bound a caller can embed in the trade instruction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlippageBound {
    MinimumAmountOut(u64),
    MaximumAmountIn(u64),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapQuote {
    /// Amount named in the request (input for exact in and partial fill, output for exact out).
    pub requested_amount: u64,
    /// Input actually taken from the trader, fee included when charged on input.
    pub amount_in: u64,
    /// Output delivered to the trader, fee excluded when charged on output.
    pub output_amount: u64,
    pub next_sqrt_price: u128,
    pub fee: FeeBreakdown,
    pub slippage: SlippageBound,
    pub is_partial_fill: bool,
}

/// Quotes one trade.
///
/// # Errors
///
/// - `AmountIsZero`, `InvalidSlippage`
/// - `PoolPaused`, `CurveComplete` from the snapshot
/// - `InsufficientLiquidity` when an exact request does not fit on the curve
/// - overflow errors from the kernel or the fee engine
pub fn get_swap_quote(
    config: &CurveConfig,
    pool: &PoolState,
    request: &SwapQuoteRequest,
) -> Result<SwapQuote> {
    require!(request.swap_mode.amount() > 0, CurveError::AmountIsZero);
    require!(
        request.slippage_bps as u64 <= BASIS_POINT_MAX,
        CurveError::InvalidSlippage
    );
    require!(!pool.is_paused, CurveError::PoolPaused);
    require!(
        !pool.is_curve_complete(config.migration_quote_threshold),
        CurveError::CurveComplete
    );

    let fee_mode = FeeMode::new(
        config.collect_fee_mode,
        request.trade_direction,
        request.has_referral,
    );
    let quote = match request.swap_mode {
        SwapMode::ExactIn { amount_in } => {
            quote_from_amount_in(config, pool, request, &fee_mode, amount_in, false)?
        }
        SwapMode::PartialFill { amount_in } => {
            quote_from_amount_in(config, pool, request, &fee_mode, amount_in, true)?
        }
        SwapMode::ExactOut { amount_out } => {
            quote_from_amount_out(config, pool, request, &fee_mode, amount_out)?
        }
    };

    debug!(
        direction = ?request.trade_direction,
        amount_in = quote.amount_in,
        output_amount = quote.output_amount,
        next_sqrt_price = quote.next_sqrt_price,
        partial = quote.is_partial_fill,
        "swap quoted"
    );
    Ok(quote)
}

fn quote_from_amount_in(
    config: &CurveConfig,
    pool: &PoolState,
    request: &SwapQuoteRequest,
    fee_mode: &FeeMode,
    amount_in: u64,
    partial_fill: bool,
) -> Result<SwapQuote> {
    let pool_fees = &config.pool_fees;
    let tracker = &pool.volatility_tracker;
    let direction = request.trade_direction;

    let (net_amount_in, mut fee) = if fee_mode.fees_on_input {
        let numerator = pool_fees.get_fee_numerator_from_included_amount(
            request.current_point,
            pool.activation_point,
            direction,
            amount_in,
            tracker,
        )?;
        let result = get_fee_on_amount(amount_in, numerator, fee_mode)?;
        (result.amount, result.fee)
    } else {
        (amount_in, FeeBreakdown::default())
    };

    let walk = walk_amount_in(config, pool, direction, net_amount_in, partial_fill)?;

    let mut consumed_amount_in = amount_in;
    let is_partial_fill = walk.amount_left > 0;
    if is_partial_fill {
        require!(partial_fill, CurveError::InsufficientLiquidity);
        let consumed_net = net_amount_in - walk.amount_left;
        if fee_mode.fees_on_input {
            let (gross, consumed_fee) = pool_fees.get_included_fee_amount(
                request.current_point,
                pool.activation_point,
                direction,
                consumed_net,
                tracker,
                fee_mode,
            )?;
            // Fee rounding can re-gross the filled part a few units above the offer. The
            // quote then keeps the whole offer and the fee charged on it.
            if gross <= amount_in {
                consumed_amount_in = gross;
                fee = consumed_fee;
            }
        } else {
            consumed_amount_in = consumed_net;
        }
    }

    let output_amount = if fee_mode.fees_on_input {
        walk.output_amount
    } else {
        let numerator = pool_fees.get_fee_numerator_from_included_amount(
            request.current_point,
            pool.activation_point,
            direction,
            walk.output_amount,
            tracker,
        )?;
        let result = get_fee_on_amount(walk.output_amount, numerator, fee_mode)?;
        fee = result.fee;
        result.amount
    };

    let minimum_amount_out = mul_div_u64(
        output_amount,
        BASIS_POINT_MAX - request.slippage_bps as u64,
        BASIS_POINT_MAX,
        Rounding::Down,
    )?;

    Ok(SwapQuote {
        requested_amount: amount_in,
        amount_in: consumed_amount_in,
        output_amount,
        next_sqrt_price: walk.next_sqrt_price,
        fee,
        slippage: SlippageBound::MinimumAmountOut(minimum_amount_out),
        is_partial_fill,
    })
}

fn walk_amount_in(
    config: &CurveConfig,
    pool: &PoolState,
    direction: TradeDirection,
    amount_in: u64,
    partial_fill: bool,
) -> Result<SwapAmountFromInput> {
    match direction {
        TradeDirection::QuoteToBase => {
            // A partial fill tops out exactly at the migration price
            let sqrt_price_limit = if partial_fill {
                config.migration_sqrt_price
            } else {
                MAX_SQRT_PRICE
            };
            calculate_quote_to_base_from_amount_in(
                &config.curve,
                pool.sqrt_price,
                amount_in,
                sqrt_price_limit,
            )
        }
        TradeDirection::BaseToQuote => calculate_base_to_quote_from_amount_in(
            &config.curve,
            config.sqrt_start_price,
            pool.sqrt_price,
            amount_in,
        ),
    }
}

fn quote_from_amount_out(
    config: &CurveConfig,
    pool: &PoolState,
    request: &SwapQuoteRequest,
    fee_mode: &FeeMode,
    amount_out: u64,
) -> Result<SwapQuote> {
    let pool_fees = &config.pool_fees;
    let tracker = &pool.volatility_tracker;
    let direction = request.trade_direction;

    // Fee on output: the curve has to release the output plus its fee
    let (curve_amount_out, output_fee) = if fee_mode.fees_on_input {
        (amount_out, None)
    } else {
        let (included, fee) = pool_fees.get_included_fee_amount(
            request.current_point,
            pool.activation_point,
            direction,
            amount_out,
            tracker,
            fee_mode,
        )?;
        (included, Some(fee))
    };

    let walk = match direction {
        TradeDirection::QuoteToBase => calculate_quote_to_base_from_amount_out(
            &config.curve,
            pool.sqrt_price,
            curve_amount_out,
        )?,
        TradeDirection::BaseToQuote => calculate_base_to_quote_from_amount_out(
            &config.curve,
            config.sqrt_start_price,
            pool.sqrt_price,
            curve_amount_out,
        )?,
    };
    require!(walk.amount_left == 0, CurveError::InsufficientLiquidity);

    let (amount_in, output_amount, fee) = match output_fee {
        Some(fee) => {
            let output_amount = curve_amount_out
                .checked_sub(fee.total()?)
                .ok_or(CurveError::MathUnderflow)?;
            (walk.input_amount, output_amount, fee)
        }
        None => {
            let (included, fee) = pool_fees.get_included_fee_amount(
                request.current_point,
                pool.activation_point,
                direction,
                walk.input_amount,
                tracker,
                fee_mode,
            )?;
            (included, amount_out, fee)
        }
    };

    let maximum_amount_in = mul_div_u64(
        amount_in,
        BASIS_POINT_MAX + request.slippage_bps as u64,
        BASIS_POINT_MAX,
        Rounding::Up,
    )?;

    Ok(SwapQuote {
        requested_amount: amount_out,
        amount_in,
        output_amount,
        next_sqrt_price: walk.next_sqrt_price,
        fee,
        slippage: SlippageBound::MaximumAmountIn(maximum_amount_in),
        is_partial_fill: false,
    })
}
