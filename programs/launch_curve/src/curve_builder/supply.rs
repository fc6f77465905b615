//! Supply accounting over a curve: where the migration price lands, how much base the curve
//! releases on the way there, and how total supply splits between swap, migration, vesting and
//! leftover.

use crate::error::CurveError;
use crate::math::core_arithmetic::{mul_div_u256, u256_to_u64, Rounding};
use crate::math::liquidity_math::{
    get_delta_amount_base_unsigned_256, get_delta_amount_quote_unsigned_256,
    get_delta_amount_base_unsigned, get_initial_liquidity_from_delta_quote,
    get_next_sqrt_price_from_input,
};
use crate::state::{
    get_migration_quote_amount, LiquidityDistributionParameters, LockedVestingParams,
    MigrationOption,
};
use crate::utils::constants::{MAX_SQRT_PRICE, MIN_SQRT_PRICE, RESOLUTION, SWAP_BUFFER_PERCENTAGE};
use anchor_lang::prelude::*;
use ethnum::U256;

/// Sqrt price reached when `migration_quote_threshold` quote is paid into the curve from
/// `sqrt_start_price`.
///
/// # Errors
///
/// `InvalidCurve` if the whole curve absorbs less quote than the threshold.
pub fn get_migration_threshold_price(
    migration_quote_threshold: u64,
    sqrt_start_price: u128,
    curve: &[LiquidityDistributionParameters],
) -> Result<u128> {
    let mut next_sqrt_price = sqrt_start_price;
    let mut total_amount = U256::from(migration_quote_threshold);

    for (i, segment) in curve.iter().enumerate() {
        let lower_sqrt_price = if i == 0 {
            sqrt_start_price
        } else {
            curve[i - 1].sqrt_price
        };
        let max_amount = get_delta_amount_quote_unsigned_256(
            lower_sqrt_price,
            segment.sqrt_price,
            segment.liquidity,
            Rounding::Up,
        )?;
        if max_amount > total_amount {
            next_sqrt_price = get_next_sqrt_price_from_input(
                lower_sqrt_price,
                segment.liquidity,
                u256_to_u64(total_amount)?,
                false,
            )?;
            total_amount = U256::ZERO;
            break;
        }
        total_amount -= max_amount;
        next_sqrt_price = segment.sqrt_price;
        if total_amount == U256::ZERO {
            break;
        }
    }

    require!(total_amount == U256::ZERO, CurveError::InvalidCurve);
    Ok(next_sqrt_price)
}

fn get_base_token_between(
    sqrt_start_price: u128,
    sqrt_end_price: u128,
    curve: &[LiquidityDistributionParameters],
) -> Result<U256> {
    let mut total_amount = U256::ZERO;
    for (i, segment) in curve.iter().enumerate() {
        let lower_sqrt_price = if i == 0 {
            sqrt_start_price
        } else {
            curve[i - 1].sqrt_price
        };
        if lower_sqrt_price >= sqrt_end_price {
            break;
        }
        let upper_sqrt_price = segment.sqrt_price.min(sqrt_end_price);
        total_amount += get_delta_amount_base_unsigned_256(
            lower_sqrt_price,
            upper_sqrt_price,
            segment.liquidity,
            Rounding::Up,
        )?;
    }
    Ok(total_amount)
}

/// Base released by the curve between the start price and the migration price.
pub fn get_base_token_for_swap(
    sqrt_start_price: u128,
    sqrt_migration_price: u128,
    curve: &[LiquidityDistributionParameters],
) -> Result<u64> {
    u256_to_u64(get_base_token_between(
        sqrt_start_price,
        sqrt_migration_price,
        curve,
    )?)
}

/// Swap supply plus the rounding buffer, capped at what the whole curve can release.
pub fn get_swap_amount_with_buffer(
    swap_base_amount: u64,
    sqrt_start_price: u128,
    curve: &[LiquidityDistributionParameters],
) -> Result<u64> {
    let buffered = U256::from(swap_base_amount)
        * U256::from(100 + SWAP_BUFFER_PERCENTAGE)
        / U256::from(100u8);
    let max_amount = get_base_token_between(sqrt_start_price, MAX_SQRT_PRICE, curve)?;
    u256_to_u64(buffered.min(max_amount))
}

/// Base paired with `migration_quote_amount` in the post-migration pool.
///
/// Constant-product pools (and no-migration curves) hold `quote / price` base. A DAMM v2 pool
/// spans `[MIN_SQRT_PRICE, MAX_SQRT_PRICE]` with concentrated liquidity sized from the quote.
pub fn get_migration_base_token(
    migration_quote_amount: u64,
    sqrt_migration_price: u128,
    migration_option: MigrationOption,
) -> Result<u64> {
    match migration_option {
        MigrationOption::Damm | MigrationOption::NoMigration => {
            let price = U256::from(sqrt_migration_price) * U256::from(sqrt_migration_price);
            let quote = U256::from(migration_quote_amount) << (RESOLUTION * 2);
            u256_to_u64(mul_div_u256(quote, U256::ONE, price, Rounding::Up)?)
        }
        MigrationOption::DammV2 => {
            let liquidity = get_initial_liquidity_from_delta_quote(
                migration_quote_amount,
                MIN_SQRT_PRICE,
                sqrt_migration_price,
            )?;
            get_delta_amount_base_unsigned(
                sqrt_migration_price,
                MAX_SQRT_PRICE,
                liquidity,
                Rounding::Up,
            )
        }
    }
}

/// Split of base supply implied by one curve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SupplyBreakdown {
    pub migration_sqrt_price: u128,
    pub swap_base_amount: u64,
    pub swap_base_amount_buffer: u64,
    pub migration_base_amount: u64,
    pub locked_vesting_amount: u64,
    pub leftover: u64,
}

impl SupplyBreakdown {
    #[allow(clippy::too_many_arguments)]
    pub fn from_curve(
        migration_quote_threshold: u64,
        migration_fee_percentage: u8,
        sqrt_start_price: u128,
        curve: &[LiquidityDistributionParameters],
        locked_vesting: &LockedVestingParams,
        migration_option: MigrationOption,
        leftover: u64,
    ) -> Result<Self> {
        let migration_sqrt_price =
            get_migration_threshold_price(migration_quote_threshold, sqrt_start_price, curve)?;
        let swap_base_amount =
            get_base_token_for_swap(sqrt_start_price, migration_sqrt_price, curve)?;
        let swap_base_amount_buffer =
            get_swap_amount_with_buffer(swap_base_amount, sqrt_start_price, curve)?;
        let migration_quote_amount =
            get_migration_quote_amount(migration_quote_threshold, migration_fee_percentage)?;
        let migration_base_amount = get_migration_base_token(
            migration_quote_amount,
            migration_sqrt_price,
            migration_option,
        )?;

        Ok(Self {
            migration_sqrt_price,
            swap_base_amount,
            swap_base_amount_buffer,
            migration_base_amount,
            locked_vesting_amount: locked_vesting.get_total_amount()?,
            leftover,
        })
    }

    fn sum(&self, swap_amount: u64) -> Result<u64> {
        swap_amount
            .checked_add(self.migration_base_amount)
            .and_then(|v| v.checked_add(self.locked_vesting_amount))
            .and_then(|v| v.checked_add(self.leftover))
            .ok_or_else(|| CurveError::MathOverflow.into())
    }

    /// Supply needed with the swap buffer; the pre-migration supply must cover it.
    pub fn total_with_buffer(&self) -> Result<u64> {
        self.sum(self.swap_base_amount_buffer)
    }

    pub fn total_without_buffer(&self) -> Result<u64> {
        self.sum(self.swap_base_amount)
    }
}

/// Total supply a curve needs, buffer included.
#[allow(clippy::too_many_arguments)]
pub fn get_total_supply_from_curve(
    migration_quote_threshold: u64,
    sqrt_start_price: u128,
    curve: &[LiquidityDistributionParameters],
    locked_vesting: &LockedVestingParams,
    migration_option: MigrationOption,
    leftover: u64,
    migration_fee_percentage: u8,
) -> Result<u64> {
    SupplyBreakdown::from_curve(
        migration_quote_threshold,
        migration_fee_percentage,
        sqrt_start_price,
        curve,
        locked_vesting,
        migration_option,
        leftover,
    )?
    .total_with_buffer()
}

/// Human-unit vesting schedule for the creator allocation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LockedVestingSchedule {
    /// Whole tokens locked in total, cliff included.
    pub total_locked_vesting_amount: u64,
    pub number_of_vesting_period: u64,
    /// Whole tokens released at the cliff.
    pub cliff_unlock_amount: u64,
    pub total_vesting_duration: u64,
    pub cliff_duration_from_migration_time: u64,
}

/// Lamport-denominated vesting parameters for `schedule`.
///
/// The per-period amount is rounded down and the remainder folded into the cliff, so the
/// total locked amount is preserved exactly.
pub fn get_locked_vesting_params(
    schedule: &LockedVestingSchedule,
    token_base_decimal: u8,
) -> Result<LockedVestingParams> {
    if schedule.total_locked_vesting_amount == 0 {
        return Ok(LockedVestingParams::default());
    }
    let unit = 10u64
        .checked_pow(token_base_decimal as u32)
        .ok_or(CurveError::InvalidTokenDecimals)?;
    let to_lamports = |amount: u64| -> Result<u64> {
        amount
            .checked_mul(unit)
            .ok_or_else(|| CurveError::MathOverflow.into())
    };

    require!(
        schedule.cliff_unlock_amount <= schedule.total_locked_vesting_amount,
        CurveError::InvalidVestingParameters
    );

    if schedule.total_locked_vesting_amount == schedule.cliff_unlock_amount {
        // Everything at the cliff: one token is kept back as a single period
        return Ok(LockedVestingParams {
            amount_per_period: to_lamports(1)?,
            cliff_duration_from_migration_time: schedule.cliff_duration_from_migration_time,
            frequency: 1,
            number_of_period: 1,
            cliff_unlock_amount: to_lamports(schedule.total_locked_vesting_amount - 1)?,
        });
    }

    require!(
        schedule.number_of_vesting_period > 0 && schedule.total_vesting_duration > 0,
        CurveError::InvalidVestingParameters
    );
    let frequency = schedule.total_vesting_duration / schedule.number_of_vesting_period;
    require!(frequency > 0, CurveError::InvalidVestingParameters);

    let vested = schedule.total_locked_vesting_amount - schedule.cliff_unlock_amount;
    let amount_per_period = vested / schedule.number_of_vesting_period;
    let remainder = vested % schedule.number_of_vesting_period;

    Ok(LockedVestingParams {
        amount_per_period: to_lamports(amount_per_period)?,
        cliff_duration_from_migration_time: schedule.cliff_duration_from_migration_time,
        frequency,
        number_of_period: schedule.number_of_vesting_period,
        cliff_unlock_amount: to_lamports(schedule.cliff_unlock_amount + remainder)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::liquidity_math::get_delta_amount_quote_unsigned;
    use crate::utils::constants::ONE_Q64;

    fn single_segment(liquidity: u128) -> Vec<LiquidityDistributionParameters> {
        vec![LiquidityDistributionParameters {
            sqrt_price: 2 * ONE_Q64,
            liquidity,
        }]
    }

    #[test]
    fn test_threshold_price_at_segment_end() {
        let liquidity = 1_000_000u128 << 64;
        let curve = single_segment(liquidity);
        let capacity =
            get_delta_amount_quote_unsigned(ONE_Q64, 2 * ONE_Q64, liquidity, Rounding::Up).unwrap();
        assert_eq!(capacity, 1_000_000);
        assert_eq!(
            get_migration_threshold_price(capacity, ONE_Q64, &curve).unwrap(),
            2 * ONE_Q64
        );
        assert_eq!(
            get_migration_threshold_price(capacity + 1, ONE_Q64, &curve).unwrap_err(),
            CurveError::InvalidCurve.into()
        );
    }

    #[test]
    fn test_threshold_price_inside_segment() {
        let liquidity = 1_000_000u128 << 64;
        let curve = single_segment(liquidity);
        let price = get_migration_threshold_price(500_000, ONE_Q64, &curve).unwrap();
        assert_eq!(price, ONE_Q64 + ONE_Q64 / 2);
        // Base released up to 1.5: L (1/1 - 1/1.5) = 333_333.3.., rounded up
        assert_eq!(get_base_token_for_swap(ONE_Q64, price, &curve).unwrap(), 333_334);
    }

    #[test]
    fn test_swap_buffer_is_capped_by_curve() {
        let liquidity = 1_000_000u128 << 64;
        let curve = single_segment(liquidity);
        // Whole curve releases 500_000 base
        assert_eq!(
            get_swap_amount_with_buffer(100_000, ONE_Q64, &curve).unwrap(),
            125_000
        );
        assert_eq!(
            get_swap_amount_with_buffer(480_000, ONE_Q64, &curve).unwrap(),
            500_000
        );
    }

    #[test]
    fn test_migration_base_token_by_option() {
        // Price 4 quote per base
        let sqrt_price = 2 * ONE_Q64;
        assert_eq!(
            get_migration_base_token(4_000_000, sqrt_price, MigrationOption::Damm).unwrap(),
            1_000_000
        );
        assert_eq!(
            get_migration_base_token(4_000_000, sqrt_price, MigrationOption::NoMigration)
                .unwrap(),
            1_000_000
        );
        let v2 = get_migration_base_token(4_000_000, sqrt_price, MigrationOption::DammV2).unwrap();
        // Same order of magnitude, never more than a hair above the constant-product amount
        assert!(v2 > 990_000 && v2 <= 1_000_001);
    }

    #[test]
    fn test_vesting_remainder_goes_to_cliff() {
        let params = get_locked_vesting_params(
            &LockedVestingSchedule {
                total_locked_vesting_amount: 1_000,
                number_of_vesting_period: 3,
                cliff_unlock_amount: 100,
                total_vesting_duration: 300,
                cliff_duration_from_migration_time: 60,
            },
            6,
        )
        .unwrap();
        assert_eq!(params.amount_per_period, 300_000_000);
        assert_eq!(params.cliff_unlock_amount, 100_000_000);
        assert_eq!(params.frequency, 100);
        assert_eq!(params.get_total_amount().unwrap(), 1_000_000_000);

        let uneven = get_locked_vesting_params(
            &LockedVestingSchedule {
                total_locked_vesting_amount: 1_001,
                number_of_vesting_period: 4,
                cliff_unlock_amount: 0,
                total_vesting_duration: 400,
                cliff_duration_from_migration_time: 0,
            },
            6,
        )
        .unwrap();
        assert_eq!(uneven.amount_per_period, 250_000_000);
        assert_eq!(uneven.cliff_unlock_amount, 1_000_000);
        assert_eq!(uneven.get_total_amount().unwrap(), 1_001_000_000);
    }

    #[test]
    fn test_vesting_all_at_cliff() {
        let params = get_locked_vesting_params(
            &LockedVestingSchedule {
                total_locked_vesting_amount: 500,
                cliff_unlock_amount: 500,
                ..Default::default()
            },
            9,
        )
        .unwrap();
        assert_eq!(params.number_of_period, 1);
        assert_eq!(params.get_total_amount().unwrap(), 500_000_000_000);
        params.validate().unwrap();
    }

    #[test]
    fn test_vesting_rejects_missing_periods() {
        let err = get_locked_vesting_params(
            &LockedVestingSchedule {
                total_locked_vesting_amount: 500,
                cliff_unlock_amount: 100,
                ..Default::default()
            },
            9,
        )
        .unwrap_err();
        assert_eq!(err, CurveError::InvalidVestingParameters.into());
    }
}
