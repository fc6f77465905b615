//! Fee parameter builders: turn bps-level launch choices into the numerators the fee engine
//! evaluates, plus the migration fee conversions between threshold and deposited quote.

use crate::curve_builder::params::{BaseFeeSchedule, FeeSchedulerMode};
use crate::error::CurveError;
use crate::fees::{BaseFeeParameters, DynamicFeeParameters, FeeRateLimiter, FeeScheduler};
use crate::math::core_arithmetic::{mul_div_u64, Rounding};
use crate::math::price_math::to_lamports;
use crate::state::{ActivationType, CollectFeeMode};
use crate::utils::constants::{
    BASIS_POINT_MAX, FEE_DENOMINATOR, MAX_FEE_NUMERATOR, MAX_PRICE_CHANGE_BPS_DEFAULT,
};
use anchor_lang::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

pub fn bps_to_fee_numerator(bps: u64) -> Result<u64> {
    let numerator = mul_div_u64(bps, FEE_DENOMINATOR, BASIS_POINT_MAX, Rounding::Down)?;
    require!(
        numerator <= MAX_FEE_NUMERATOR,
        CurveError::InvalidFeeNumerator
    );
    Ok(numerator)
}

/// Scheduler decaying from `starting_fee_bps` to `ending_fee_bps` in `number_of_period` steps
/// spread over `total_duration`.
///
/// The exponential reduction factor is the largest one whose final period still pays at least
/// `ending_fee_bps`.
pub fn get_fee_scheduler_params(
    starting_fee_bps: u64,
    ending_fee_bps: u64,
    mode: FeeSchedulerMode,
    number_of_period: u16,
    total_duration: u64,
) -> Result<BaseFeeParameters> {
    let wrap = |scheduler: FeeScheduler| match mode {
        FeeSchedulerMode::Linear => BaseFeeParameters::LinearScheduler(scheduler),
        FeeSchedulerMode::Exponential => BaseFeeParameters::ExponentialScheduler(scheduler),
    };

    let max_fee_numerator = bps_to_fee_numerator(starting_fee_bps)?;
    if starting_fee_bps == ending_fee_bps {
        require!(
            number_of_period == 0 && total_duration == 0,
            CurveError::InvalidFeeScheduler
        );
        return Ok(wrap(FeeScheduler {
            cliff_fee_numerator: max_fee_numerator,
            ..Default::default()
        }));
    }

    require!(
        starting_fee_bps > ending_fee_bps && number_of_period > 0 && total_duration > 0,
        CurveError::InvalidFeeScheduler
    );
    let min_fee_numerator = bps_to_fee_numerator(ending_fee_bps)?;
    let period_frequency = total_duration / number_of_period as u64;
    require!(period_frequency > 0, CurveError::InvalidFeeScheduler);

    let scheduler = FeeScheduler {
        cliff_fee_numerator: max_fee_numerator,
        number_of_period,
        period_frequency,
        reduction_factor: 0,
    };
    let reduction_factor = match mode {
        FeeSchedulerMode::Linear => {
            (max_fee_numerator - min_fee_numerator) / number_of_period as u64
        }
        FeeSchedulerMode::Exponential => {
            // Floor fee is non-increasing in the factor
            let floor_fee = |reduction_factor: u64| {
                BaseFeeParameters::ExponentialScheduler(FeeScheduler {
                    reduction_factor,
                    ..scheduler
                })
                .get_min_base_fee_numerator()
            };
            let (mut low, mut high) = (0u64, BASIS_POINT_MAX - 1);
            while low < high {
                let mid = (low + high + 1) / 2;
                if floor_fee(mid)? >= min_fee_numerator {
                    low = mid;
                } else {
                    high = mid - 1;
                }
            }
            low
        }
    };
    debug!(?mode, reduction_factor, period_frequency, "fee scheduler sized");

    Ok(wrap(FeeScheduler {
        reduction_factor,
        ..scheduler
    }))
}

/// Rate limiter charging `base_fee_bps` plus `fee_increment_bps` per `reference_amount` of
/// quote during the first `max_limiter_duration` slots or seconds.
pub fn get_rate_limiter_params(
    base_fee_bps: u64,
    fee_increment_bps: u16,
    reference_amount: Decimal,
    max_limiter_duration: u64,
    token_quote_decimal: u8,
    activation_type: ActivationType,
) -> Result<BaseFeeParameters> {
    let limiter = FeeRateLimiter {
        cliff_fee_numerator: bps_to_fee_numerator(base_fee_bps)?,
        fee_increment_bps,
        max_limiter_duration,
        reference_amount: to_lamports(reference_amount, token_quote_decimal, Rounding::Down)?,
    };
    limiter.validate(CollectFeeMode::QuoteToken, activation_type)?;
    Ok(BaseFeeParameters::RateLimiter(limiter))
}

pub fn get_base_fee_params(
    schedule: &BaseFeeSchedule,
    token_quote_decimal: u8,
    activation_type: ActivationType,
) -> Result<BaseFeeParameters> {
    match *schedule {
        BaseFeeSchedule::FeeScheduler {
            mode,
            starting_fee_bps,
            ending_fee_bps,
            number_of_period,
            total_duration,
        } => get_fee_scheduler_params(
            starting_fee_bps,
            ending_fee_bps,
            mode,
            number_of_period,
            total_duration,
        ),
        BaseFeeSchedule::RateLimiter {
            base_fee_bps,
            fee_increment_bps,
            reference_amount,
            max_limiter_duration,
        } => get_rate_limiter_params(
            base_fee_bps,
            fee_increment_bps,
            reference_amount,
            max_limiter_duration,
            token_quote_decimal,
            activation_type,
        ),
    }
}

/// Volatility surcharge sized against the floor base fee.
pub fn get_dynamic_fee_params(base_fee_bps: u64) -> Result<DynamicFeeParameters> {
    let base_fee_bps =
        u16::try_from(base_fee_bps).map_err(|_| CurveError::InvalidDynamicFeeParameters)?;
    DynamicFeeParameters::for_base_fee(base_fee_bps, MAX_PRICE_CHANGE_BPS_DEFAULT)
}

/// Quote left for the migrated pool once the migration fee is taken from `threshold`.
pub fn get_migration_quote_amount_from_threshold(
    migration_quote_threshold: Decimal,
    migration_fee_percentage: u8,
) -> Result<Decimal> {
    let kept = Decimal::from(100 - migration_fee_percentage.min(100));
    migration_quote_threshold
        .checked_mul(kept)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| CurveError::MathOverflow.into())
}

/// Threshold whose post-fee quote equals `migration_quote_amount`.
pub fn get_migration_quote_threshold_from_migration_quote_amount(
    migration_quote_amount: Decimal,
    migration_fee_percentage: u8,
) -> Result<Decimal> {
    require!(
        migration_fee_percentage < 100,
        CurveError::InvalidMigrationFeePercentage
    );
    let kept = Decimal::from(100 - migration_fee_percentage);
    migration_quote_amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|v| v.checked_div(kept))
        .ok_or_else(|| CurveError::MathOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TradeDirection;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_schedule() {
        let params = get_fee_scheduler_params(100, 100, FeeSchedulerMode::Linear, 0, 0).unwrap();
        assert_eq!(params.cliff_fee_numerator(), 10_000_000);
        assert_eq!(params.get_min_base_fee_numerator().unwrap(), 10_000_000);

        assert_eq!(
            get_fee_scheduler_params(100, 100, FeeSchedulerMode::Linear, 10, 0).unwrap_err(),
            CurveError::InvalidFeeScheduler.into()
        );
    }

    #[test]
    fn test_linear_schedule_reaches_floor() {
        let params =
            get_fee_scheduler_params(5_000, 100, FeeSchedulerMode::Linear, 10, 100).unwrap();
        params
            .validate(CollectFeeMode::QuoteToken, ActivationType::Slot)
            .unwrap();
        assert_eq!(params.cliff_fee_numerator(), 500_000_000);
        assert_eq!(params.get_min_base_fee_numerator().unwrap(), 10_000_000);
    }

    #[test]
    fn test_exponential_schedule_stays_above_floor() {
        let params =
            get_fee_scheduler_params(5_000, 100, FeeSchedulerMode::Exponential, 60, 600).unwrap();
        params
            .validate(CollectFeeMode::QuoteToken, ActivationType::Timestamp)
            .unwrap();
        let floor = params.get_min_base_fee_numerator().unwrap();
        assert!(floor >= 10_000_000);
        // One more bps of reduction would undershoot
        if let BaseFeeParameters::ExponentialScheduler(scheduler) = params {
            let steeper = BaseFeeParameters::ExponentialScheduler(FeeScheduler {
                reduction_factor: scheduler.reduction_factor + 1,
                ..scheduler
            });
            assert!(steeper.get_min_base_fee_numerator().unwrap() < 10_000_000);
        } else {
            panic!("expected an exponential scheduler");
        }
        // Fee right at activation is the starting fee
        assert_eq!(
            params
                .get_base_fee_numerator(0, 0, TradeDirection::QuoteToBase, 0)
                .unwrap(),
            500_000_000
        );
    }

    #[test]
    fn test_rejects_rising_schedule() {
        assert_eq!(
            get_fee_scheduler_params(100, 200, FeeSchedulerMode::Linear, 10, 100).unwrap_err(),
            CurveError::InvalidFeeScheduler.into()
        );
    }

    #[test]
    fn test_rate_limiter_reference_in_lamports() {
        let params =
            get_rate_limiter_params(100, 100, dec!(1.5), 100, 9, ActivationType::Slot).unwrap();
        match params {
            BaseFeeParameters::RateLimiter(limiter) => {
                assert_eq!(limiter.reference_amount, 1_500_000_000);
                assert_eq!(limiter.cliff_fee_numerator, 10_000_000);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(
            get_rate_limiter_params(100, 100, dec!(1), 1_000_000, 9, ActivationType::Slot).is_err()
        );
    }

    #[test]
    fn test_dynamic_fee_sized_for_floor() {
        let params = get_dynamic_fee_params(100).unwrap();
        params.validate().unwrap();
        assert!(get_dynamic_fee_params(u16::MAX as u64 + 1).is_err());
    }

    #[test]
    fn test_migration_quote_round_trip() {
        let amount = get_migration_quote_amount_from_threshold(dec!(100), 10).unwrap();
        assert_eq!(amount, dec!(90));
        let threshold =
            get_migration_quote_threshold_from_migration_quote_amount(amount, 10).unwrap();
        assert_eq!(threshold, dec!(100));
    }
}
