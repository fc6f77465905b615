//! # launch_curve::curve_builder
//!
//! Solves launch economics into a [`ConfigParameters`] ready for a create-config instruction.
//!
//! ## Strategies
//! - [`build_curve`] / [`build_curve_with_market_cap`]: one segment, closed form.
//! - [`build_curve_with_two_segments`] / [`build_curve_with_mid_price`]: a 2×2 linear system
//!   over three prices, with candidate mid prices tried in order.
//! - [`build_curve_with_liquidity_weights`]: sixteen geometric steps with weighted liquidity.
//!
//! ## Reconciliation
//! Every builder re-derives the supply split from the finished curve. An excess over the
//! total supply is taken out of the leftover; an excess larger than the leftover fails with
//! `SupplyReconciliationFailed`. The result is then validated exactly like a submitted config.

pub mod fee_params;
pub mod liquidity_weights;
pub mod params;
pub mod single_segment;
pub mod supply;
pub mod two_segment;

pub use liquidity_weights::build_curve_with_liquidity_weights;
pub use params::*;
pub use single_segment::{build_curve, build_curve_with_market_cap};
pub use two_segment::{build_curve_with_mid_price, build_curve_with_two_segments};

use crate::error::CurveError;
use crate::fees::PoolFees;
use crate::state::{
    ConfigParameters, CurveConfig, LiquidityDistributionParameters, LockedVestingParams,
    TokenSupplyParams,
};
use anchor_lang::prelude::*;
use fee_params::{get_base_fee_params, get_dynamic_fee_params};
use supply::{get_locked_vesting_params, get_total_supply_from_curve};
use tracing::debug;

/// Launch amounts converted to lamports, with the fee model resolved.
#[derive(Clone, Debug)]
pub(crate) struct PreparedLaunch {
    pub total_supply: u64,
    pub leftover: u64,
    pub locked_vesting: LockedVestingParams,
    pub locked_vesting_amount: u64,
    pub pool_fees: PoolFees,
}

impl BuildCurveBaseParams {
    pub(crate) fn prepare(&self) -> Result<PreparedLaunch> {
        require!(
            self.total_token_supply > 0,
            CurveError::InvalidTokenSupply
        );
        let unit = 10u64
            .checked_pow(self.token_base_decimal as u32)
            .ok_or(CurveError::InvalidTokenDecimals)?;
        let total_supply = self
            .total_token_supply
            .checked_mul(unit)
            .ok_or(CurveError::InvalidTokenSupply)?;
        let leftover = self
            .leftover
            .checked_mul(unit)
            .ok_or(CurveError::InvalidTokenSupply)?;
        let locked_vesting =
            get_locked_vesting_params(&self.locked_vesting, self.token_base_decimal)?;
        let locked_vesting_amount = locked_vesting.get_total_amount()?;

        let base_fee = get_base_fee_params(
            &self.base_fee,
            self.token_quote_decimal,
            self.activation_type,
        )?;
        let dynamic_fee = if self.dynamic_fee_enabled {
            Some(get_dynamic_fee_params(self.base_fee.floor_fee_bps())?)
        } else {
            None
        };

        Ok(PreparedLaunch {
            total_supply,
            leftover,
            locked_vesting,
            locked_vesting_amount,
            pool_fees: PoolFees {
                base_fee,
                dynamic_fee,
            },
        })
    }
}

impl PreparedLaunch {
    /// Supply left for the curve once migration, vesting and leftover are set aside.
    pub fn swap_supply(&self, migration_base_amount: u64) -> Result<u64> {
        self.total_supply
            .checked_sub(migration_base_amount)
            .and_then(|v| v.checked_sub(self.locked_vesting_amount))
            .and_then(|v| v.checked_sub(self.leftover))
            .filter(|v| *v > 0)
            .ok_or_else(|| CurveError::InvalidTokenSupply.into())
    }
}

/// Assembles, reconciles and validates the final configuration.
pub(crate) fn finalize_config(
    base: &BuildCurveBaseParams,
    prepared: PreparedLaunch,
    migration_quote_threshold: u64,
    sqrt_start_price: u128,
    curve: Vec<LiquidityDistributionParameters>,
) -> Result<ConfigParameters> {
    let required_supply = get_total_supply_from_curve(
        migration_quote_threshold,
        sqrt_start_price,
        &curve,
        &prepared.locked_vesting,
        base.migration_option,
        prepared.leftover,
        base.migration_fee.fee_percentage,
    )?;

    let mut leftover = prepared.leftover;
    if required_supply > prepared.total_supply {
        let excess = required_supply - prepared.total_supply;
        require!(
            excess <= leftover,
            CurveError::SupplyReconciliationFailed
        );
        leftover -= excess;
        debug!(excess, leftover, "leftover reduced to reconcile supply");
    }

    let config = ConfigParameters {
        pool_fees: prepared.pool_fees,
        collect_fee_mode: base.collect_fee_mode,
        activation_type: base.activation_type,
        migration_option: base.migration_option,
        migration_fee_option: base.migration_fee_option,
        token_base_decimal: base.token_base_decimal,
        token_quote_decimal: base.token_quote_decimal,
        migration_quote_threshold,
        sqrt_start_price,
        curve,
        locked_vesting: prepared.locked_vesting,
        leftover,
        migration_fee: base.migration_fee,
        migrated_pool_fee: base.migrated_pool_fee,
        lp_distribution: base.lp_distribution,
        surplus_split: base.surplus_split,
        creator_trading_fee_percentage: base.creator_trading_fee_percentage,
        token_supply: Some(TokenSupplyParams {
            pre_migration_token_supply: prepared.total_supply,
            post_migration_token_supply: prepared.total_supply,
        }),
    };
    CurveConfig::from_parameters(config.clone())?;
    Ok(config)
}
