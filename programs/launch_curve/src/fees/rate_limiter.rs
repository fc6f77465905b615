//! Size-dependent fee for buys made shortly after activation.
//!
//! The first `reference_amount` of a trade pays the cliff numerator `c`. Every following
//! `reference_amount`-sized block pays `fee_increment` more than the block before it, until the
//! marginal rate reaches `MAX_FEE_NUMERATOR`. For an input `x > x0` with `a = (x − x0) / x0`,
//! `b = (x − x0) % x0`, `i` the increment and `m = (MAX − c) / i`:
//!
//! - `a < m`: `fee·D = x0·(c + c·a + i·a(a+1)/2) + b·(c + i·(a+1))`
//! - `a >= m`: `fee·D = x0·(c + c·m + i·m(m+1)/2) + ((a − m)·x0 + b)·MAX`
//!
//! Marginal rates never decrease, so the total fee is non-decreasing in the trade size.

use crate::error::CurveError;
use crate::math::core_arithmetic::{mul_div_u256, u256_to_u64, Rounding};
use crate::state::{ActivationType, CollectFeeMode, TradeDirection};
use crate::utils::constants::{
    BASIS_POINT_MAX, FEE_DENOMINATOR, MAX_FEE_NUMERATOR, MAX_RATE_LIMITER_DURATION_IN_SECONDS,
    MAX_RATE_LIMITER_DURATION_IN_SLOTS, MIN_FEE_NUMERATOR,
};
use anchor_lang::prelude::*;
use ethnum::U256;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct FeeRateLimiter {
    pub cliff_fee_numerator: u64,
    pub fee_increment_bps: u16,
    /// Window after activation during which the limiter applies, in slots or seconds.
    pub max_limiter_duration: u64,
    /// Block size, in quote lamports.
    pub reference_amount: u64,
}

impl FeeRateLimiter {
    fn is_zero_rate_limiter(&self) -> bool {
        self.reference_amount == 0 && self.max_limiter_duration == 0 && self.fee_increment_bps == 0
    }

    pub fn get_fee_increment_numerator(&self) -> Result<u64> {
        let numerator = (self.fee_increment_bps as u128)
            .checked_mul(FEE_DENOMINATOR as u128)
            .ok_or(CurveError::MathOverflow)?
            / BASIS_POINT_MAX as u128;
        u64::try_from(numerator).map_err(|_| CurveError::MathOverflow.into())
    }

    /// Only buys inside `[activation_point, activation_point + max_limiter_duration]` are limited.
    pub fn is_applied(
        &self,
        current_point: u64,
        activation_point: u64,
        trade_direction: TradeDirection,
    ) -> bool {
        if self.is_zero_rate_limiter() || trade_direction == TradeDirection::BaseToQuote {
            return false;
        }
        let window_end = activation_point.saturating_add(self.max_limiter_duration);
        current_point >= activation_point && current_point <= window_end
    }

    pub fn validate(
        &self,
        collect_fee_mode: CollectFeeMode,
        activation_type: ActivationType,
    ) -> Result<()> {
        // Input-side fees only exist in quote mode; the limiter reads the input amount
        require!(
            collect_fee_mode == CollectFeeMode::QuoteToken,
            CurveError::InvalidCollectFeeMode
        );
        require!(
            (MIN_FEE_NUMERATOR..=MAX_FEE_NUMERATOR).contains(&self.cliff_fee_numerator),
            CurveError::InvalidFeeNumerator
        );
        if self.is_zero_rate_limiter() {
            return Ok(());
        }
        require!(
            self.reference_amount > 0
                && self.max_limiter_duration > 0
                && self.fee_increment_bps > 0,
            CurveError::InvalidFeeRateLimiter
        );
        let max_duration = match activation_type {
            ActivationType::Slot => MAX_RATE_LIMITER_DURATION_IN_SLOTS,
            ActivationType::Timestamp => MAX_RATE_LIMITER_DURATION_IN_SECONDS,
        };
        require!(
            self.max_limiter_duration <= max_duration,
            CurveError::InvalidFeeRateLimiter
        );
        let fee_increment_numerator = self.get_fee_increment_numerator()?;
        require!(
            self.cliff_fee_numerator
                .checked_add(fee_increment_numerator)
                .map_or(false, |v| v <= MAX_FEE_NUMERATOR),
            CurveError::InvalidFeeRateLimiter
        );
        Ok(())
    }

    /// Total fee charged on `input_amount`, fee included, in token units (rounded up).
    pub fn get_fee_amount(&self, input_amount: u64) -> Result<u64> {
        let total = self.get_fee_total_scaled(input_amount)?;
        let fee = mul_div_u256(total, U256::ONE, U256::from(FEE_DENOMINATOR), Rounding::Up)?;
        u256_to_u64(fee)
    }

    /// Effective numerator such that `ceil(x · n / D)` is at least [`Self::get_fee_amount`].
    pub fn get_fee_numerator_from_included_amount(&self, input_amount: u64) -> Result<u64> {
        if input_amount <= self.reference_amount {
            return Ok(self.cliff_fee_numerator);
        }
        let fee = self.get_fee_amount(input_amount)?;
        let numerator = mul_div_u256(
            U256::from(fee),
            U256::from(FEE_DENOMINATOR),
            U256::from(input_amount),
            Rounding::Up,
        )?;
        Ok(u256_to_u64(numerator)?.min(MAX_FEE_NUMERATOR))
    }

    // fee · D, see the module docs
    fn get_fee_total_scaled(&self, input_amount: u64) -> Result<U256> {
        let c = U256::from(self.cliff_fee_numerator);
        let x = U256::from(input_amount);
        let x0 = U256::from(self.reference_amount);
        if input_amount <= self.reference_amount {
            return Ok(x * c);
        }

        let i = U256::from(self.get_fee_increment_numerator()?);
        let max = U256::from(MAX_FEE_NUMERATOR);
        let excess = x - x0;
        let a = excess / x0;
        let b = excess % x0;
        let max_index = (max - c) / i;
        let two = U256::from(2u8);

        let total = if a < max_index {
            let full_blocks = c + c * a + i * a * (a + U256::ONE) / two;
            x0 * full_blocks + b * (c + i * (a + U256::ONE))
        } else {
            let m = max_index;
            let full_blocks = c + c * m + i * m * (m + U256::ONE) / two;
            x0 * full_blocks + ((a - m) * x0 + b) * max
        };
        Ok(total)
    }
}
