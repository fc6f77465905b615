//! Curve configuration: the instruction-shaped [`ConfigParameters`] and the validated,
//! immutable [`CurveConfig`] the quote engine reads on every trade.

use crate::curve_builder::supply::SupplyBreakdown;
use crate::error::CurveError;
use crate::fees::PoolFees;
use crate::math::core_arithmetic::{mul_div_u64, Rounding};
use crate::utils::constants::{
    MAX_BASE_TOKEN_DECIMALS, MAX_CREATOR_MIGRATION_FEE_PERCENTAGE, MAX_CURVE_POINT,
    MAX_MIGRATED_POOL_FEE_BPS, MAX_MIGRATION_FEE_PERCENTAGE, MAX_QUOTE_TOKEN_DECIMALS,
    MAX_SQRT_PRICE, MIN_BASE_TOKEN_DECIMALS, MIN_MIGRATED_POOL_FEE_BPS, MIN_SQRT_PRICE,
};
use anchor_lang::prelude::*;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum CollectFeeMode {
    /// Fees are always charged in the quote token.
    #[default]
    QuoteToken,
    /// Fees are charged in the output token of each trade.
    OutputToken,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum TradeDirection {
    /// Sell: base in, quote out. Price moves down.
    BaseToQuote,
    /// Buy: quote in, base out. Price moves up.
    QuoteToBase,
}

/// Unit of `current_point` / `activation_point`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum ActivationType {
    #[default]
    Slot,
    Timestamp,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum MigrationOption {
    #[default]
    Damm,
    DammV2,
    /// The curve never migrates; surplus quote is split between stakeholders instead.
    NoMigration,
}

/// Fee tier of the pool created at migration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum MigrationFeeOption {
    #[default]
    FixedBps25,
    FixedBps30,
    FixedBps100,
    FixedBps200,
    FixedBps400,
    FixedBps600,
    /// Fee read from [`MigratedPoolFee`]. DAMM v2 only.
    Customizable,
}

impl MigrationFeeOption {
    pub fn fixed_bps(&self) -> Option<u16> {
        match self {
            MigrationFeeOption::FixedBps25 => Some(25),
            MigrationFeeOption::FixedBps30 => Some(30),
            MigrationFeeOption::FixedBps100 => Some(100),
            MigrationFeeOption::FixedBps200 => Some(200),
            MigrationFeeOption::FixedBps400 => Some(400),
            MigrationFeeOption::FixedBps600 => Some(600),
            MigrationFeeOption::Customizable => None,
        }
    }
}

/// One curve segment: `liquidity` applies up to `sqrt_price`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct LiquidityDistributionParameters {
    pub sqrt_price: u128,
    pub liquidity: u128,
}

/// Base tokens locked for the creator, released after migration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct LockedVestingParams {
    pub amount_per_period: u64,
    pub cliff_duration_from_migration_time: u64,
    pub frequency: u64,
    pub number_of_period: u64,
    pub cliff_unlock_amount: u64,
}

impl LockedVestingParams {
    pub fn is_none(&self) -> bool {
        *self == Self::default()
    }

    pub fn get_total_amount(&self) -> Result<u64> {
        self.amount_per_period
            .checked_mul(self.number_of_period)
            .and_then(|v| v.checked_add(self.cliff_unlock_amount))
            .ok_or_else(|| CurveError::MathOverflow.into())
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_none() {
            return Ok(());
        }
        require!(self.frequency > 0, CurveError::InvalidVestingParameters);
        require!(
            self.get_total_amount()? > 0,
            CurveError::InvalidVestingParameters
        );
        Ok(())
    }
}

/// Share of the migration quote taken as a fee, and the creator's cut of that fee.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct MigrationFee {
    pub fee_percentage: u8,
    pub creator_fee_percentage: u8,
}

/// Fee settings of the DAMM v2 pool created at migration, read only for
/// [`MigrationFeeOption::Customizable`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct MigratedPoolFee {
    pub collect_fee_mode: u8,
    pub dynamic_fee: u8,
    pub pool_fee_bps: u16,
}

/// LP token split at migration, in percent.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct LpDistribution {
    pub partner_lp_percentage: u8,
    pub creator_lp_percentage: u8,
    pub partner_locked_lp_percentage: u8,
    pub creator_locked_lp_percentage: u8,
}

impl LpDistribution {
    fn sum(&self) -> u16 {
        self.partner_lp_percentage as u16
            + self.creator_lp_percentage as u16
            + self.partner_locked_lp_percentage as u16
            + self.creator_locked_lp_percentage as u16
    }
}

/// Split of the surplus quote for curves that never migrate, in percent.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct SurplusSplit {
    pub partner_percentage: u8,
    pub creator_percentage: u8,
    pub protocol_percentage: u8,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct TokenSupplyParams {
    pub pre_migration_token_supply: u64,
    pub post_migration_token_supply: u64,
}

/// Launch configuration as submitted with a create-config instruction. All amounts in lamports.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct ConfigParameters {
    pub pool_fees: PoolFees,
    pub collect_fee_mode: CollectFeeMode,
    pub activation_type: ActivationType,
    pub migration_option: MigrationOption,
    pub migration_fee_option: MigrationFeeOption,
    pub token_base_decimal: u8,
    pub token_quote_decimal: u8,
    pub migration_quote_threshold: u64,
    pub sqrt_start_price: u128,
    pub curve: Vec<LiquidityDistributionParameters>,
    pub locked_vesting: LockedVestingParams,
    pub leftover: u64,
    pub migration_fee: MigrationFee,
    pub migrated_pool_fee: MigratedPoolFee,
    pub lp_distribution: LpDistribution,
    pub surplus_split: SurplusSplit,
    pub creator_trading_fee_percentage: u8,
    pub token_supply: Option<TokenSupplyParams>,
}

impl ConfigParameters {
    /// Checks every invariant that does not need the derived migration values.
    pub fn validate(&self) -> Result<()> {
        self.pool_fees
            .validate(self.collect_fee_mode, self.activation_type)?;

        require!(
            (MIN_BASE_TOKEN_DECIMALS..=MAX_BASE_TOKEN_DECIMALS).contains(&self.token_base_decimal)
                && self.token_quote_decimal <= MAX_QUOTE_TOKEN_DECIMALS,
            CurveError::InvalidTokenDecimals
        );

        self.validate_migration()?;

        require!(
            self.migration_fee.fee_percentage <= MAX_MIGRATION_FEE_PERCENTAGE,
            CurveError::InvalidMigrationFeePercentage
        );
        require!(
            self.migration_fee.creator_fee_percentage <= MAX_CREATOR_MIGRATION_FEE_PERCENTAGE,
            CurveError::InvalidMigrationFeePercentage
        );
        require!(
            self.creator_trading_fee_percentage <= 100,
            CurveError::InvalidCreatorTradingFeePercentage
        );
        require!(
            self.migration_quote_threshold > 0,
            CurveError::InvalidQuoteThreshold
        );

        self.locked_vesting.validate()?;
        validate_curve(self.sqrt_start_price, &self.curve)
    }

    fn validate_migration(&self) -> Result<()> {
        match self.migration_option {
            MigrationOption::Damm => require!(
                self.migration_fee_option != MigrationFeeOption::Customizable,
                CurveError::InvalidMigrationFeeOption
            ),
            MigrationOption::DammV2 => {}
            MigrationOption::NoMigration => {
                let split = &self.surplus_split;
                let sum = split.partner_percentage as u16
                    + split.creator_percentage as u16
                    + split.protocol_percentage as u16;
                require!(sum == 100, CurveError::InvalidSurplusSplit);
            }
        }

        if self.migration_option != MigrationOption::NoMigration {
            require!(
                self.lp_distribution.sum() == 100,
                CurveError::InvalidLpPercentages
            );
        }

        let customizable = self.migration_option == MigrationOption::DammV2
            && self.migration_fee_option == MigrationFeeOption::Customizable;
        if customizable {
            let fee = &self.migrated_pool_fee;
            require!(
                (MIN_MIGRATED_POOL_FEE_BPS..=MAX_MIGRATED_POOL_FEE_BPS).contains(&fee.pool_fee_bps)
                    && fee.collect_fee_mode <= 1
                    && fee.dynamic_fee <= 1,
                CurveError::InvalidMigratedPoolFee
            );
        } else {
            // Only a customizable DAMM v2 migration reads these values
            require!(
                self.migrated_pool_fee == MigratedPoolFee::default(),
                CurveError::InvalidMigratedPoolFee
            );
        }
        Ok(())
    }
}

/// Start price inside the protocol range, 1..=16 strictly increasing segments that stay in
/// range, every segment with liquidity.
pub fn validate_curve(
    sqrt_start_price: u128,
    curve: &[LiquidityDistributionParameters],
) -> Result<()> {
    require!(
        (MIN_SQRT_PRICE..MAX_SQRT_PRICE).contains(&sqrt_start_price),
        CurveError::InvalidCurve
    );
    require!(
        !curve.is_empty() && curve.len() <= MAX_CURVE_POINT,
        CurveError::InvalidCurve
    );

    let mut lower = sqrt_start_price;
    for segment in curve {
        require!(
            segment.sqrt_price > lower && segment.sqrt_price <= MAX_SQRT_PRICE,
            CurveError::InvalidCurve
        );
        require!(segment.liquidity > 0, CurveError::InvalidCurve);
        lower = segment.sqrt_price;
    }
    Ok(())
}

/// Validated, immutable curve configuration with its derived migration values.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct CurveConfig {
    pub pool_fees: PoolFees,
    pub collect_fee_mode: CollectFeeMode,
    pub activation_type: ActivationType,
    pub migration_option: MigrationOption,
    pub migration_fee_option: MigrationFeeOption,
    pub token_base_decimal: u8,
    pub token_quote_decimal: u8,
    pub migration_quote_threshold: u64,
    pub sqrt_start_price: u128,
    pub curve: Vec<LiquidityDistributionParameters>,
    pub locked_vesting: LockedVestingParams,
    pub leftover: u64,
    pub migration_fee: MigrationFee,
    pub migrated_pool_fee: MigratedPoolFee,
    pub lp_distribution: LpDistribution,
    pub surplus_split: SurplusSplit,
    pub creator_trading_fee_percentage: u8,
    /// Sqrt price reached once exactly `migration_quote_threshold` quote has been paid in.
    pub migration_sqrt_price: u128,
    /// Base released by the curve between the start and the migration price.
    pub swap_base_amount: u64,
    /// Base paired with the migration quote in the post-migration pool.
    pub migration_base_threshold: u64,
    pub pre_migration_token_supply: u64,
    pub post_migration_token_supply: u64,
}

impl CurveConfig {
    /// Validates `params` and derives the migration price and the base amounts it implies.
    ///
    /// # Errors
    ///
    /// Any Invalid Configuration error raised by [`ConfigParameters::validate`], plus
    /// `InvalidCurve` when the curve cannot absorb the migration threshold and
    /// `InvalidTokenSupply` when the declared supply cannot cover swap, migration, vesting and
    /// leftover.
    pub fn from_parameters(params: ConfigParameters) -> Result<Self> {
        params.validate()?;

        let supply = SupplyBreakdown::from_curve(
            params.migration_quote_threshold,
            params.migration_fee.fee_percentage,
            params.sqrt_start_price,
            &params.curve,
            &params.locked_vesting,
            params.migration_option,
            params.leftover,
        )?;
        require!(
            supply.migration_sqrt_price < MAX_SQRT_PRICE && supply.migration_base_amount > 0,
            CurveError::InvalidCurve
        );
        let minimum_base_supply_with_buffer = supply.total_with_buffer()?;
        let minimum_base_supply_without_buffer = supply.total_without_buffer()?;

        let (pre_migration_token_supply, post_migration_token_supply) = match params.token_supply {
            Some(token_supply) => {
                let pre = token_supply.pre_migration_token_supply;
                let post = token_supply.post_migration_token_supply;
                require!(
                    minimum_base_supply_with_buffer <= pre
                        && post <= pre
                        && minimum_base_supply_without_buffer <= post,
                    CurveError::InvalidTokenSupply
                );
                (pre, post)
            }
            None => (minimum_base_supply_with_buffer, minimum_base_supply_with_buffer),
        };

        Ok(Self {
            pool_fees: params.pool_fees,
            collect_fee_mode: params.collect_fee_mode,
            activation_type: params.activation_type,
            migration_option: params.migration_option,
            migration_fee_option: params.migration_fee_option,
            token_base_decimal: params.token_base_decimal,
            token_quote_decimal: params.token_quote_decimal,
            migration_quote_threshold: params.migration_quote_threshold,
            sqrt_start_price: params.sqrt_start_price,
            curve: params.curve,
            locked_vesting: params.locked_vesting,
            leftover: params.leftover,
            migration_fee: params.migration_fee,
            migrated_pool_fee: params.migrated_pool_fee,
            lp_distribution: params.lp_distribution,
            surplus_split: params.surplus_split,
            creator_trading_fee_percentage: params.creator_trading_fee_percentage,
            migration_sqrt_price: supply.migration_sqrt_price,
            swap_base_amount: supply.swap_base_amount,
            migration_base_threshold: supply.migration_base_amount,
            pre_migration_token_supply,
            post_migration_token_supply,
        })
    }

    /// Quote deposited into the migrated pool once the migration fee is taken.
    pub fn get_migration_quote_amount(&self) -> Result<u64> {
        get_migration_quote_amount(
            self.migration_quote_threshold,
            self.migration_fee.fee_percentage,
        )
    }

    /// Fee tier of the migrated pool in basis points.
    pub fn get_migrated_pool_fee_bps(&self) -> u16 {
        self.migration_fee_option
            .fixed_bps()
            .unwrap_or(self.migrated_pool_fee.pool_fee_bps)
    }
}

/// `threshold · (100 − fee_percentage) / 100`, rounded down.
pub fn get_migration_quote_amount(
    migration_quote_threshold: u64,
    fee_percentage: u8,
) -> Result<u64> {
    require!(
        fee_percentage <= 100,
        CurveError::InvalidMigrationFeePercentage
    );
    mul_div_u64(
        migration_quote_threshold,
        100 - fee_percentage as u64,
        100,
        Rounding::Down,
    )
}
