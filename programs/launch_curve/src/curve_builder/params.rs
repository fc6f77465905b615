//! Launch parameters in human units, as a launch form would collect them.
//!
//! Supplies are whole tokens; prices, market caps and quote amounts are `Decimal` quote
//! tokens. Everything is converted to lamports by the builders.

use crate::curve_builder::supply::LockedVestingSchedule;
use crate::state::{
    ActivationType, CollectFeeMode, LpDistribution, MigratedPoolFee, MigrationFee,
    MigrationFeeOption, MigrationOption, SurplusSplit,
};
use rust_decimal::Decimal;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FeeSchedulerMode {
    #[default]
    Linear,
    Exponential,
}

/// Base fee model requested for a launch.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BaseFeeSchedule {
    /// Fee decays from `starting_fee_bps` to `ending_fee_bps` over `total_duration`.
    FeeScheduler {
        mode: FeeSchedulerMode,
        starting_fee_bps: u64,
        ending_fee_bps: u64,
        number_of_period: u16,
        total_duration: u64,
    },
    /// Flat `base_fee_bps`, plus `fee_increment_bps` per `reference_amount` quote during the
    /// limiter window.
    RateLimiter {
        base_fee_bps: u64,
        fee_increment_bps: u16,
        reference_amount: Decimal,
        max_limiter_duration: u64,
    },
}

impl BaseFeeSchedule {
    /// Fee in bps once any schedule has run its course.
    pub fn floor_fee_bps(&self) -> u64 {
        match *self {
            BaseFeeSchedule::FeeScheduler { ending_fee_bps, .. } => ending_fee_bps,
            BaseFeeSchedule::RateLimiter { base_fee_bps, .. } => base_fee_bps,
        }
    }
}

impl Default for BaseFeeSchedule {
    fn default() -> Self {
        BaseFeeSchedule::FeeScheduler {
            mode: FeeSchedulerMode::Linear,
            starting_fee_bps: 100,
            ending_fee_bps: 100,
            number_of_period: 0,
            total_duration: 0,
        }
    }
}

/// Parameters shared by every curve builder.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildCurveBaseParams {
    /// Whole tokens.
    pub total_token_supply: u64,
    pub migration_option: MigrationOption,
    pub token_base_decimal: u8,
    pub token_quote_decimal: u8,
    pub locked_vesting: LockedVestingSchedule,
    pub base_fee: BaseFeeSchedule,
    pub dynamic_fee_enabled: bool,
    pub activation_type: ActivationType,
    pub collect_fee_mode: CollectFeeMode,
    pub migration_fee_option: MigrationFeeOption,
    pub lp_distribution: LpDistribution,
    pub creator_trading_fee_percentage: u8,
    /// Whole tokens kept out of both the curve and the migrated pool.
    pub leftover: u64,
    pub migration_fee: MigrationFee,
    pub migrated_pool_fee: MigratedPoolFee,
    pub surplus_split: SurplusSplit,
}

/// Single segment from an explicit migration split.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildCurveParams {
    pub base: BuildCurveBaseParams,
    /// Percent of total supply paired with the quote at migration.
    pub percentage_supply_on_migration: Decimal,
    /// Quote tokens, migration fee included.
    pub migration_quote_threshold: Decimal,
}

/// Single segment from a pair of market caps.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildCurveWithMarketCapParams {
    pub base: BuildCurveBaseParams,
    pub initial_market_cap: Decimal,
    pub migration_market_cap: Decimal,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildCurveWithTwoSegmentsParams {
    pub base: BuildCurveBaseParams,
    pub initial_market_cap: Decimal,
    pub migration_market_cap: Decimal,
    pub percentage_supply_on_migration: Decimal,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildCurveWithMidPriceParams {
    pub base: BuildCurveBaseParams,
    pub initial_market_cap: Decimal,
    pub migration_market_cap: Decimal,
    pub percentage_supply_on_migration: Decimal,
    /// Quote tokens per whole base token at the segment boundary.
    pub mid_price: Decimal,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildCurveWithLiquidityWeightsParams {
    pub base: BuildCurveBaseParams,
    pub initial_market_cap: Decimal,
    pub migration_market_cap: Decimal,
    /// Relative liquidity of each geometric step, lowest price first.
    pub liquidity_weights: [Decimal; 16],
}
