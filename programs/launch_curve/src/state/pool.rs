use crate::fees::VolatilityTracker;
use crate::state::config::CurveConfig;
use anchor_lang::prelude::*;

/// Snapshot of a launch pool's runtime state.
///
/// Owned and mutated by the settlement program; the quote engine reads it by value and never
/// writes back.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct PoolState {
    /// Current sqrt price, Q64.64.
    pub sqrt_price: u128,
    pub base_reserve: u64,
    pub quote_reserve: u64,
    /// Slot or timestamp, per the config's activation type.
    pub activation_point: u64,
    pub is_paused: bool,
    pub volatility_tracker: VolatilityTracker,
}

impl PoolState {
    /// A freshly created pool: start price, full pre-migration supply, no quote.
    pub fn new(config: &CurveConfig, activation_point: u64) -> Self {
        Self {
            sqrt_price: config.sqrt_start_price,
            base_reserve: config.pre_migration_token_supply,
            quote_reserve: 0,
            activation_point,
            is_paused: false,
            volatility_tracker: VolatilityTracker::default(),
        }
    }

    /// The curve is done once the quote reserve reaches the migration threshold.
    pub fn is_curve_complete(&self, migration_quote_threshold: u64) -> bool {
        self.quote_reserve >= migration_quote_threshold
    }
}
