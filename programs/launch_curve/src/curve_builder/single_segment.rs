use crate::curve_builder::fee_params::get_migration_quote_threshold_from_migration_quote_amount;
use crate::curve_builder::params::{BuildCurveParams, BuildCurveWithMarketCapParams};
use crate::curve_builder::supply::get_migration_base_token;
use crate::curve_builder::finalize_config;
use crate::error::CurveError;
use crate::math::core_arithmetic::{mul_div_u512, u512_to_u128, Rounding};
use crate::math::liquidity_math::get_liquidity;
use crate::math::price_math::{sqrt_price_from_amounts, to_lamports};
use crate::state::{get_migration_quote_amount, ConfigParameters, LiquidityDistributionParameters};
use crate::utils::constants::{MIN_SQRT_PRICE, RESOLUTION};
use anchor_lang::prelude::*;
use primitive_types::U512;
use rust_decimal::{Decimal, MathematicalOps};
use tracing::debug;

/// One liquidity segment from the start price to the migration price.
///
/// With `S` the swap supply, `Q` the threshold and `Pm` the migration sqrt price, a single
/// segment satisfies `S = L·(1/Ps − 1/Pm)` and `Q = L·(Pm − Ps)`, hence `Ps = Q / (S·Pm)`.
pub fn build_curve(params: &BuildCurveParams) -> Result<ConfigParameters> {
    let base = &params.base;
    let prepared = base.prepare()?;
    let percentage = params.percentage_supply_on_migration;
    require!(
        percentage > Decimal::ZERO && percentage < Decimal::ONE_HUNDRED,
        CurveError::InvalidLaunchParameters
    );

    let migration_quote_threshold = to_lamports(
        params.migration_quote_threshold,
        base.token_quote_decimal,
        Rounding::Down,
    )?;
    require!(
        migration_quote_threshold > 0,
        CurveError::InvalidQuoteThreshold
    );
    let migration_base_supply = Decimal::from(base.total_token_supply)
        .checked_mul(percentage)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(CurveError::MathOverflow)?;
    let migration_base_supply =
        to_lamports(migration_base_supply, base.token_base_decimal, Rounding::Down)?;

    let migration_quote_amount = get_migration_quote_amount(
        migration_quote_threshold,
        base.migration_fee.fee_percentage,
    )?;
    let sqrt_migration_price = sqrt_price_from_amounts(migration_quote_amount, migration_base_supply)?;
    let migration_base_amount = get_migration_base_token(
        migration_quote_amount,
        sqrt_migration_price,
        base.migration_option,
    )?;
    let swap_amount = prepared.swap_supply(migration_base_amount)?;

    let sqrt_start_price = u512_to_u128(mul_div_u512(
        U512::from(migration_quote_threshold) << (RESOLUTION * 2) as usize,
        U512::one(),
        U512::from(swap_amount) * U512::from(sqrt_migration_price),
        Rounding::Down,
    )?)?;
    require!(
        sqrt_start_price >= MIN_SQRT_PRICE && sqrt_start_price < sqrt_migration_price,
        CurveError::InvalidLaunchParameters
    );

    let liquidity = get_liquidity(
        swap_amount,
        migration_quote_threshold,
        sqrt_start_price,
        sqrt_migration_price,
    )?;
    debug!(
        sqrt_start_price,
        sqrt_migration_price, liquidity, swap_amount, "single segment solved"
    );

    let curve = vec![LiquidityDistributionParameters {
        sqrt_price: sqrt_migration_price,
        liquidity,
    }];
    finalize_config(
        base,
        prepared,
        migration_quote_threshold,
        sqrt_start_price,
        curve,
    )
}

/// Single segment whose start and migration prices match the two market caps.
///
/// The migration share of supply is `√r·(100 − vesting% − leftover%) / (1 + √r)` with
/// `r = initial_market_cap / migration_market_cap`.
pub fn build_curve_with_market_cap(
    params: &BuildCurveWithMarketCapParams,
) -> Result<ConfigParameters> {
    let base = &params.base;
    require!(
        params.initial_market_cap > Decimal::ZERO
            && params.initial_market_cap < params.migration_market_cap,
        CurveError::InvalidLaunchParameters
    );
    require!(
        base.total_token_supply > 0,
        CurveError::InvalidTokenSupply
    );

    let total_supply = Decimal::from(base.total_token_supply);
    let share = |amount: u64| -> Result<Decimal> {
        Decimal::from(amount)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|v| v.checked_div(total_supply))
            .ok_or_else(|| CurveError::MathOverflow.into())
    };
    let vesting_percentage = share(base.locked_vesting.total_locked_vesting_amount)?;
    let leftover_percentage = share(base.leftover)?;
    let available = Decimal::ONE_HUNDRED - vesting_percentage - leftover_percentage;
    require!(available > Decimal::ZERO, CurveError::InvalidTokenSupply);

    let ratio = params
        .initial_market_cap
        .checked_div(params.migration_market_cap)
        .ok_or(CurveError::MathOverflow)?;
    let sqrt_ratio = ratio.sqrt().ok_or(CurveError::MathOverflow)?;
    let percentage_supply_on_migration = sqrt_ratio
        .checked_mul(available)
        .and_then(|v| v.checked_div(Decimal::ONE + sqrt_ratio))
        .ok_or(CurveError::MathOverflow)?;

    let migration_quote_amount = params
        .migration_market_cap
        .checked_mul(percentage_supply_on_migration)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(CurveError::MathOverflow)?;
    let migration_quote_threshold = get_migration_quote_threshold_from_migration_quote_amount(
        migration_quote_amount,
        base.migration_fee.fee_percentage,
    )?;
    debug!(
        %percentage_supply_on_migration,
        %migration_quote_threshold,
        "market caps converted"
    );

    build_curve(&BuildCurveParams {
        base: base.clone(),
        percentage_supply_on_migration,
        migration_quote_threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_builder::params::BuildCurveBaseParams;
    use crate::state::{CurveConfig, LpDistribution, MigrationOption};
    use rust_decimal_macros::dec;

    fn base_params() -> BuildCurveBaseParams {
        BuildCurveBaseParams {
            total_token_supply: 1_000_000_000,
            migration_option: MigrationOption::Damm,
            token_base_decimal: 6,
            token_quote_decimal: 9,
            leftover: 10_000_000,
            lp_distribution: LpDistribution {
                partner_lp_percentage: 50,
                creator_lp_percentage: 50,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_build_curve_conserves_supply() {
        let params = BuildCurveParams {
            base: base_params(),
            percentage_supply_on_migration: dec!(20),
            migration_quote_threshold: dec!(80),
        };
        let config = build_curve(&params).unwrap();
        let curve_config = CurveConfig::from_parameters(config.clone()).unwrap();
        let total_supply = 1_000_000_000 * 1_000_000u64;

        assert_eq!(curve_config.pre_migration_token_supply, total_supply);
        assert_eq!(config.migration_quote_threshold, 80_000_000_000);
        assert!(config.leftover <= 10_000_000 * 1_000_000);
        // The migration price sits on the first segment's upper bound
        assert!(curve_config.migration_sqrt_price <= config.curve[0].sqrt_price);
        assert!(config.curve[0].sqrt_price - curve_config.migration_sqrt_price < 1 << 20);
    }

    #[test]
    fn test_build_curve_rejects_bad_percentage() {
        let params = BuildCurveParams {
            base: base_params(),
            percentage_supply_on_migration: dec!(100),
            migration_quote_threshold: dec!(80),
        };
        assert_eq!(
            build_curve(&params).unwrap_err(),
            CurveError::InvalidLaunchParameters.into()
        );
    }

    #[test]
    fn test_market_cap_curve_starts_at_initial_cap() {
        let params = BuildCurveWithMarketCapParams {
            base: base_params(),
            initial_market_cap: dec!(30),
            migration_market_cap: dec!(300),
        };
        let config = build_curve_with_market_cap(&params).unwrap();
        let price = crate::math::price_math::price_from_sqrt_price(config.sqrt_start_price, 6, 9)
            .unwrap();
        let market_cap = price * Decimal::from(1_000_000_000u64);
        assert!((market_cap - dec!(30)).abs() < dec!(0.3), "{market_cap}");
    }

    #[test]
    fn test_market_cap_requires_growth() {
        let params = BuildCurveWithMarketCapParams {
            base: base_params(),
            initial_market_cap: dec!(300),
            migration_market_cap: dec!(30),
        };
        assert_eq!(
            build_curve_with_market_cap(&params).unwrap_err(),
            CurveError::InvalidLaunchParameters.into()
        );
    }
}
