//! Shared fixtures for unit tests, integration tests, benches and fuzz targets.
//!
//! The sample curve starts at sqrt price 1 and has two segments:
//!
//! | segment | sqrt price | liquidity | quote raised | base released |
//! |---------|------------|-----------|--------------|---------------|
//! | 0       | 1 → 2      | 1e12      | 1e12         | 5e11          |
//! | 1       | 2 → 4      | 2e12      | 4e12         | 5e11          |
//!
//! With a 5e12 threshold and no migration fee the curve migrates exactly at sqrt price 4, and the
//! constant-product pool is seeded with 5e12 / 16 = 3.125e11 base.

use crate::fees::{BaseFeeParameters, FeeScheduler, PoolFees};
use crate::state::{
    ActivationType, CollectFeeMode, ConfigParameters, CurveConfig, LiquidityDistributionParameters,
    LpDistribution, MigrationFeeOption, MigrationOption,
};
use crate::utils::constants::ONE_Q64;

pub const SAMPLE_CLIFF_FEE_NUMERATOR: u64 = 2_500_000;
pub const SAMPLE_MIGRATION_QUOTE_THRESHOLD: u64 = 5_000_000_000_000;

pub fn sample_parameters() -> ConfigParameters {
    ConfigParameters {
        pool_fees: PoolFees {
            base_fee: BaseFeeParameters::LinearScheduler(FeeScheduler {
                cliff_fee_numerator: SAMPLE_CLIFF_FEE_NUMERATOR,
                ..Default::default()
            }),
            dynamic_fee: None,
        },
        collect_fee_mode: CollectFeeMode::QuoteToken,
        activation_type: ActivationType::Slot,
        migration_option: MigrationOption::Damm,
        migration_fee_option: MigrationFeeOption::FixedBps25,
        token_base_decimal: 6,
        token_quote_decimal: 9,
        migration_quote_threshold: SAMPLE_MIGRATION_QUOTE_THRESHOLD,
        sqrt_start_price: ONE_Q64,
        curve: vec![
            LiquidityDistributionParameters {
                sqrt_price: 2 * ONE_Q64,
                liquidity: 1_000_000_000_000u128 << 64,
            },
            LiquidityDistributionParameters {
                sqrt_price: 4 * ONE_Q64,
                liquidity: 2_000_000_000_000u128 << 64,
            },
        ],
        lp_distribution: LpDistribution {
            creator_lp_percentage: 100,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// [`sample_parameters`] validated. Panics if the fixture ever stops validating.
pub fn sample_config() -> CurveConfig {
    CurveConfig::from_parameters(sample_parameters()).expect("sample config is valid")
}
