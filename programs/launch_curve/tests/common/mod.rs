#![allow(dead_code)]
#![allow(unused_imports)]

use launch_curve::curve_builder::BuildCurveBaseParams;
use launch_curve::state::{LpDistribution, MigrationOption};
use tracing_subscriber::EnvFilter;

pub use launch_curve::testing::{sample_config, sample_parameters};

pub const TOTAL_TOKEN_SUPPLY: u64 = 1_000_000_000;
pub const LEFTOVER: u64 = 10_000_000;
pub const BASE_UNIT: u64 = 1_000_000;

/// Honours `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A billion-token launch with 6 base and 9 quote decimals and a 1% leftover.
pub fn launch_base_params() -> BuildCurveBaseParams {
    BuildCurveBaseParams {
        total_token_supply: TOTAL_TOKEN_SUPPLY,
        migration_option: MigrationOption::Damm,
        token_base_decimal: 6,
        token_quote_decimal: 9,
        leftover: LEFTOVER,
        lp_distribution: LpDistribution {
            partner_lp_percentage: 50,
            creator_lp_percentage: 50,
            ..Default::default()
        },
        ..Default::default()
    }
}
