use crate::error::CurveError;
use crate::fees::rate_limiter::FeeRateLimiter;
use crate::math::core_arithmetic::{pow_q64, u256_to_u128, u256_to_u64, Q64x64};
use crate::state::{ActivationType, CollectFeeMode, TradeDirection};
use crate::utils::constants::{
    BASIS_POINT_MAX, MAX_FEE_NUMERATOR, MIN_FEE_NUMERATOR, ONE_Q64, RESOLUTION,
};
use anchor_lang::prelude::*;
use ethnum::U256;

/// Time-decaying fee: starts at the cliff numerator and drops once per elapsed period.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct FeeScheduler {
    pub cliff_fee_numerator: u64,
    pub number_of_period: u16,
    /// Length of one period in slots or seconds, per the curve's activation type.
    pub period_frequency: u64,
    /// Linear: numerator removed per period. Exponential: bps of the fee removed per period.
    pub reduction_factor: u64,
}

impl FeeScheduler {
    fn is_flat(&self) -> bool {
        self.period_frequency == 0 || self.number_of_period == 0 || self.reduction_factor == 0
    }

    /// Elapsed period index, capped at `number_of_period`.
    ///
    /// Trades before activation pay the fee of the final period.
    pub fn get_period(&self, current_point: u64, activation_point: u64) -> u64 {
        if self.period_frequency == 0 {
            return 0;
        }
        let number_of_period = self.number_of_period as u64;
        if current_point < activation_point {
            return number_of_period;
        }
        ((current_point - activation_point) / self.period_frequency).min(number_of_period)
    }

    fn linear_fee_numerator(&self, period: u64) -> Result<u64> {
        let reduction = period
            .checked_mul(self.reduction_factor)
            .ok_or(CurveError::MathOverflow)?;
        Ok(self.cliff_fee_numerator.saturating_sub(reduction))
    }

    fn exponential_fee_numerator(&self, period: u64) -> Result<u64> {
        if period == 0 {
            return Ok(self.cliff_fee_numerator);
        }
        let reduction = (U256::from(self.reduction_factor) << RESOLUTION)
            / U256::from(BASIS_POINT_MAX);
        let one = U256::from(ONE_Q64);
        let base = one.checked_sub(reduction).unwrap_or(U256::ZERO);
        let factor = pow_q64(Q64x64::from_raw(u256_to_u128(base)?), period)?;
        let result =
            (U256::from(self.cliff_fee_numerator) * U256::from(factor.raw())) >> RESOLUTION;
        u256_to_u64(result)
    }

    fn validate(&self, exponential: bool) -> Result<()> {
        require!(
            (MIN_FEE_NUMERATOR..=MAX_FEE_NUMERATOR).contains(&self.cliff_fee_numerator),
            CurveError::InvalidFeeNumerator
        );
        if self.is_flat() {
            require!(
                self.period_frequency == 0
                    && self.number_of_period == 0
                    && self.reduction_factor == 0,
                CurveError::InvalidFeeScheduler
            );
            return Ok(());
        }
        if exponential {
            require!(
                self.reduction_factor < BASIS_POINT_MAX,
                CurveError::InvalidFeeScheduler
            );
        }
        let min_fee_numerator = if exponential {
            self.exponential_fee_numerator(self.number_of_period as u64)?
        } else {
            let reduction = (self.number_of_period as u64)
                .checked_mul(self.reduction_factor)
                .ok_or(CurveError::InvalidFeeScheduler)?;
            self.cliff_fee_numerator
                .checked_sub(reduction)
                .ok_or(CurveError::InvalidFeeScheduler)?
        };
        require!(
            min_fee_numerator >= MIN_FEE_NUMERATOR,
            CurveError::InvalidFeeNumerator
        );
        Ok(())
    }
}

/// Base fee model of a curve. Variants carry disjoint parameter sets.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum BaseFeeParameters {
    LinearScheduler(FeeScheduler),
    ExponentialScheduler(FeeScheduler),
    RateLimiter(FeeRateLimiter),
}

impl Default for BaseFeeParameters {
    fn default() -> Self {
        BaseFeeParameters::LinearScheduler(FeeScheduler::default())
    }
}

impl BaseFeeParameters {
    pub fn cliff_fee_numerator(&self) -> u64 {
        match self {
            BaseFeeParameters::LinearScheduler(s) | BaseFeeParameters::ExponentialScheduler(s) => {
                s.cliff_fee_numerator
            }
            BaseFeeParameters::RateLimiter(r) => r.cliff_fee_numerator,
        }
    }

    /// Rejects parameter sets the fee engine cannot evaluate.
    ///
    /// # Errors
    ///
    /// - `InvalidFeeNumerator` if the cliff (or the decayed floor) leaves `[MIN, MAX]`.
    /// - `InvalidFeeScheduler` for a partially configured or underflowing schedule.
    /// - `InvalidFeeRateLimiter` / `InvalidCollectFeeMode` for a bad rate limiter.
    pub fn validate(
        &self,
        collect_fee_mode: CollectFeeMode,
        activation_type: ActivationType,
    ) -> Result<()> {
        match self {
            BaseFeeParameters::LinearScheduler(scheduler) => scheduler.validate(false),
            BaseFeeParameters::ExponentialScheduler(scheduler) => scheduler.validate(true),
            BaseFeeParameters::RateLimiter(limiter) => {
                limiter.validate(collect_fee_mode, activation_type)
            }
        }
    }

    /// Base fee numerator for a trade at `current_point`.
    ///
    /// `included_fee_amount` is the fee-bearing amount of the trade, fee included. Only the
    /// rate limiter reads it.
    pub fn get_base_fee_numerator(
        &self,
        current_point: u64,
        activation_point: u64,
        trade_direction: TradeDirection,
        included_fee_amount: u64,
    ) -> Result<u64> {
        match self {
            BaseFeeParameters::LinearScheduler(scheduler) => {
                let period = scheduler.get_period(current_point, activation_point);
                scheduler.linear_fee_numerator(period)
            }
            BaseFeeParameters::ExponentialScheduler(scheduler) => {
                let period = scheduler.get_period(current_point, activation_point);
                scheduler.exponential_fee_numerator(period)
            }
            BaseFeeParameters::RateLimiter(limiter) => {
                if limiter.is_applied(current_point, activation_point, trade_direction) {
                    limiter.get_fee_numerator_from_included_amount(included_fee_amount)
                } else {
                    Ok(limiter.cliff_fee_numerator)
                }
            }
        }
    }

    /// Fee numerator after the schedule has fully decayed.
    pub fn get_min_base_fee_numerator(&self) -> Result<u64> {
        match self {
            BaseFeeParameters::LinearScheduler(scheduler) => {
                scheduler.linear_fee_numerator(scheduler.number_of_period as u64)
            }
            BaseFeeParameters::ExponentialScheduler(scheduler) => {
                scheduler.exponential_fee_numerator(scheduler.number_of_period as u64)
            }
            BaseFeeParameters::RateLimiter(limiter) => Ok(limiter.cliff_fee_numerator),
        }
    }
}
