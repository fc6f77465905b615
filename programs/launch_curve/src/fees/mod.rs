//! # launch_curve::fees
//!
//! Fee engine: resolves the fee numerator that applies to a trade and splits the charged fee
//! between the protocol, the pool (trading fee) and an optional referrer.
//!
//! ## Features
//! - Base fee as a sum type: linear scheduler, exponential scheduler or rate limiter.
//! - Optional volatility surcharge, capped at a fixed share of the base fee.
//! - Fee collection in quote token or in the output token of each trade.
//!
//! ## Safety & Determinism
//! - Fees always round up, so remainders stay with the pool.
//! - Total numerator is clamped to `MAX_FEE_NUMERATOR`.

pub mod base_fee;
pub mod dynamic_fee;
pub mod rate_limiter;

pub use base_fee::{BaseFeeParameters, FeeScheduler};
pub use dynamic_fee::{DynamicFeeParameters, VolatilityTracker};
pub use rate_limiter::FeeRateLimiter;

use crate::error::CurveError;
use crate::math::core_arithmetic::{mul_div_u64, Rounding};
use crate::state::{ActivationType, CollectFeeMode, TradeDirection};
use crate::utils::constants::{
    FEE_DENOMINATOR, MAX_DYNAMIC_FEE_PERCENT, MAX_FEE_NUMERATOR, PROTOCOL_FEE_PERCENT,
    REFERRAL_FEE_PERCENT,
};
use anchor_lang::prelude::*;

/// Where a trade is charged, derived from the collect fee mode and the trade direction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeMode {
    /// Fee is deducted from the input before it reaches the curve.
    pub fees_on_input: bool,
    /// Fee is denominated in the base token.
    pub fees_on_base_token: bool,
    pub has_referral: bool,
}

impl FeeMode {
    pub fn new(
        collect_fee_mode: CollectFeeMode,
        trade_direction: TradeDirection,
        has_referral: bool,
    ) -> Self {
        let (fees_on_input, fees_on_base_token) = match (collect_fee_mode, trade_direction) {
            // Always charged in quote: on the way in for buys, on the way out for sells
            (CollectFeeMode::QuoteToken, TradeDirection::QuoteToBase) => (true, false),
            (CollectFeeMode::QuoteToken, TradeDirection::BaseToQuote) => (false, false),
            (CollectFeeMode::OutputToken, TradeDirection::QuoteToBase) => (false, true),
            (CollectFeeMode::OutputToken, TradeDirection::BaseToQuote) => (false, false),
        };
        Self {
            fees_on_input,
            fees_on_base_token,
            has_referral,
        }
    }
}

/// Split of one charged fee.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub trading_fee: u64,
    pub protocol_fee: u64,
    pub referral_fee: u64,
    pub fees_on_base_token: bool,
}

impl FeeBreakdown {
    pub fn total(&self) -> Result<u64> {
        self.trading_fee
            .checked_add(self.protocol_fee)
            .and_then(|v| v.checked_add(self.referral_fee))
            .ok_or_else(|| CurveError::MathOverflow.into())
    }
}

/// An amount with its fee removed, plus the fee split.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeOnAmountResult {
    pub amount: u64,
    pub fee: FeeBreakdown,
}

/// Splits `total_fee` into protocol, referral and trading shares.
///
/// The protocol takes `PROTOCOL_FEE_PERCENT` of the total. When a referral is present, the
/// referrer takes `REFERRAL_FEE_PERCENT` of what remains; the pool keeps the rest.
pub fn split_fee(total_fee: u64, fee_mode: &FeeMode) -> Result<FeeBreakdown> {
    let protocol_fee = mul_div_u64(total_fee, PROTOCOL_FEE_PERCENT as u64, 100, Rounding::Down)?;
    let trading_share = total_fee
        .checked_sub(protocol_fee)
        .ok_or(CurveError::MathUnderflow)?;
    let referral_fee = if fee_mode.has_referral {
        mul_div_u64(trading_share, REFERRAL_FEE_PERCENT as u64, 100, Rounding::Down)?
    } else {
        0
    };
    let trading_fee = trading_share
        .checked_sub(referral_fee)
        .ok_or(CurveError::MathUnderflow)?;

    Ok(FeeBreakdown {
        trading_fee,
        protocol_fee,
        referral_fee,
        fees_on_base_token: fee_mode.fees_on_base_token,
    })
}

/// Deducts the fee for `trade_fee_numerator` from `amount`, rounding the fee up.
pub fn get_fee_on_amount(
    amount: u64,
    trade_fee_numerator: u64,
    fee_mode: &FeeMode,
) -> Result<FeeOnAmountResult> {
    require!(
        trade_fee_numerator <= MAX_FEE_NUMERATOR,
        CurveError::InvalidFeeNumerator
    );
    let total_fee = mul_div_u64(amount, trade_fee_numerator, FEE_DENOMINATOR, Rounding::Up)?;
    let amount = amount
        .checked_sub(total_fee)
        .ok_or(CurveError::MathUnderflow)?;
    Ok(FeeOnAmountResult {
        amount,
        fee: split_fee(total_fee, fee_mode)?,
    })
}

/// Smallest gross amount that still leaves `excluded_fee_amount` once the fee is taken.
///
/// `ceil(excluded · D / (D − n))`
pub fn get_included_fee_amount(trade_fee_numerator: u64, excluded_fee_amount: u64) -> Result<u64> {
    require!(
        trade_fee_numerator <= MAX_FEE_NUMERATOR,
        CurveError::InvalidFeeNumerator
    );
    let denominator = FEE_DENOMINATOR - trade_fee_numerator;
    mul_div_u64(excluded_fee_amount, FEE_DENOMINATOR, denominator, Rounding::Up)
}

/// Base fee model plus the optional volatility surcharge of one curve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct PoolFees {
    pub base_fee: BaseFeeParameters,
    pub dynamic_fee: Option<DynamicFeeParameters>,
}

impl PoolFees {
    pub fn validate(
        &self,
        collect_fee_mode: CollectFeeMode,
        activation_type: ActivationType,
    ) -> Result<()> {
        self.base_fee.validate(collect_fee_mode, activation_type)?;
        if let Some(dynamic_fee) = &self.dynamic_fee {
            dynamic_fee.validate()?;
        }
        Ok(())
    }

    /// Base plus surcharge, clamped to `MAX_FEE_NUMERATOR`.
    pub fn get_total_fee_numerator(
        &self,
        base_fee_numerator: u64,
        volatility_tracker: &VolatilityTracker,
    ) -> Result<u64> {
        let variable_fee_numerator = match &self.dynamic_fee {
            Some(dynamic_fee) => {
                let surcharge = dynamic_fee.get_variable_fee_numerator(volatility_tracker)?;
                let cap = mul_div_u64(
                    base_fee_numerator,
                    MAX_DYNAMIC_FEE_PERCENT as u64,
                    100,
                    Rounding::Down,
                )?;
                surcharge.min(cap as u128) as u64
            }
            None => 0,
        };
        let total = base_fee_numerator
            .checked_add(variable_fee_numerator)
            .ok_or(CurveError::MathOverflow)?;
        Ok(total.min(MAX_FEE_NUMERATOR))
    }

    /// Fee numerator charged on a trade whose fee-bearing amount, fee included, is
    /// `included_fee_amount`.
    pub fn get_fee_numerator_from_included_amount(
        &self,
        current_point: u64,
        activation_point: u64,
        trade_direction: TradeDirection,
        included_fee_amount: u64,
        volatility_tracker: &VolatilityTracker,
    ) -> Result<u64> {
        let base_fee_numerator = self.base_fee.get_base_fee_numerator(
            current_point,
            activation_point,
            trade_direction,
            included_fee_amount,
        )?;
        self.get_total_fee_numerator(base_fee_numerator, volatility_tracker)
    }

    /// Gross amount whose post-fee value covers `excluded_fee_amount`, with the fee it pays.
    ///
    /// Under an active rate limiter the numerator depends on the gross amount itself, so the
    /// smallest qualifying gross amount is searched for.
    pub fn get_included_fee_amount(
        &self,
        current_point: u64,
        activation_point: u64,
        trade_direction: TradeDirection,
        excluded_fee_amount: u64,
        volatility_tracker: &VolatilityTracker,
        fee_mode: &FeeMode,
    ) -> Result<(u64, FeeBreakdown)> {
        let rate_limited = match &self.base_fee {
            BaseFeeParameters::RateLimiter(limiter) => {
                limiter.is_applied(current_point, activation_point, trade_direction)
            }
            _ => false,
        };

        let included = if rate_limited {
            self.search_included_fee_amount(
                current_point,
                activation_point,
                trade_direction,
                excluded_fee_amount,
                volatility_tracker,
                fee_mode,
            )?
        } else {
            let numerator = self.get_fee_numerator_from_included_amount(
                current_point,
                activation_point,
                trade_direction,
                excluded_fee_amount,
                volatility_tracker,
            )?;
            get_included_fee_amount(numerator, excluded_fee_amount)?
        };

        let numerator = self.get_fee_numerator_from_included_amount(
            current_point,
            activation_point,
            trade_direction,
            included,
            volatility_tracker,
        )?;
        let result = get_fee_on_amount(included, numerator, fee_mode)?;
        require!(
            result.amount >= excluded_fee_amount,
            CurveError::MathOverflow
        );
        Ok((included, result.fee))
    }

    fn search_included_fee_amount(
        &self,
        current_point: u64,
        activation_point: u64,
        trade_direction: TradeDirection,
        excluded_fee_amount: u64,
        volatility_tracker: &VolatilityTracker,
        fee_mode: &FeeMode,
    ) -> Result<u64> {
        let covers = |gross: u64| -> Result<bool> {
            let numerator = self.get_fee_numerator_from_included_amount(
                current_point,
                activation_point,
                trade_direction,
                gross,
                volatility_tracker,
            )?;
            Ok(get_fee_on_amount(gross, numerator, fee_mode)?.amount >= excluded_fee_amount)
        };

        let mut low = excluded_fee_amount;
        // No numerator exceeds MAX_FEE_NUMERATOR, so this bound always covers
        let mut high =
            get_included_fee_amount(MAX_FEE_NUMERATOR, excluded_fee_amount)?.saturating_add(1);
        require!(covers(high)?, CurveError::MathOverflow);

        while low < high {
            let mid = low + (high - low) / 2;
            if covers(mid)? {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        Ok(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::MAX_PRICE_CHANGE_BPS_DEFAULT;

    fn quote_mode(referral: bool) -> FeeMode {
        FeeMode::new(CollectFeeMode::QuoteToken, TradeDirection::QuoteToBase, referral)
    }

    #[test]
    fn test_fee_mode_matrix() {
        let buy = FeeMode::new(CollectFeeMode::QuoteToken, TradeDirection::QuoteToBase, false);
        assert!(buy.fees_on_input && !buy.fees_on_base_token);
        let sell = FeeMode::new(CollectFeeMode::QuoteToken, TradeDirection::BaseToQuote, false);
        assert!(!sell.fees_on_input && !sell.fees_on_base_token);
        let buy = FeeMode::new(CollectFeeMode::OutputToken, TradeDirection::QuoteToBase, true);
        assert!(!buy.fees_on_input && buy.fees_on_base_token && buy.has_referral);
        let sell = FeeMode::new(CollectFeeMode::OutputToken, TradeDirection::BaseToQuote, false);
        assert!(!sell.fees_on_input && !sell.fees_on_base_token);
    }

    #[test]
    fn test_split_without_referral() {
        let fee = split_fee(1_000, &quote_mode(false)).unwrap();
        assert_eq!(fee.protocol_fee, 200);
        assert_eq!(fee.referral_fee, 0);
        assert_eq!(fee.trading_fee, 800);
        assert_eq!(fee.total().unwrap(), 1_000);
    }

    #[test]
    fn test_referral_is_carved_from_trading_share() {
        let fee = split_fee(1_000, &quote_mode(true)).unwrap();
        assert_eq!(fee.protocol_fee, 200);
        assert_eq!(fee.referral_fee, 160);
        assert_eq!(fee.trading_fee, 640);
        assert_eq!(fee.total().unwrap(), 1_000);
    }

    #[test]
    fn test_fee_on_amount_rounds_up() {
        // 1% of 101 is 1.01, charged as 2
        let result = get_fee_on_amount(101, 10_000_000, &quote_mode(false)).unwrap();
        assert_eq!(result.fee.total().unwrap(), 2);
        assert_eq!(result.amount, 99);
    }

    #[test]
    fn test_included_amount_covers_excluded() {
        for numerator in [100_000u64, 2_500_000, 10_000_000, 500_000_000, MAX_FEE_NUMERATOR] {
            for excluded in [1u64, 7, 1_000, 123_456_789] {
                let included = get_included_fee_amount(numerator, excluded).unwrap();
                let back = get_fee_on_amount(included, numerator, &quote_mode(false)).unwrap();
                assert!(back.amount >= excluded);
            }
        }
    }

    #[test]
    fn test_rejects_numerator_above_max() {
        assert_eq!(
            get_fee_on_amount(1, MAX_FEE_NUMERATOR + 1, &quote_mode(false)).unwrap_err(),
            CurveError::InvalidFeeNumerator.into()
        );
    }

    #[test]
    fn test_dynamic_surcharge_is_capped() {
        let fees = PoolFees {
            base_fee: BaseFeeParameters::LinearScheduler(FeeScheduler {
                cliff_fee_numerator: 10_000_000,
                number_of_period: 0,
                period_frequency: 0,
                reduction_factor: 0,
            }),
            dynamic_fee: Some(
                DynamicFeeParameters::for_base_fee(100, MAX_PRICE_CHANGE_BPS_DEFAULT).unwrap(),
            ),
        };
        fees.validate(CollectFeeMode::QuoteToken, ActivationType::Slot).unwrap();
        let calm = VolatilityTracker::default();
        assert_eq!(fees.get_total_fee_numerator(10_000_000, &calm).unwrap(), 10_000_000);

        let wild = VolatilityTracker {
            volatility_accumulator: u32::MAX as u128,
            ..Default::default()
        };
        assert_eq!(fees.get_total_fee_numerator(10_000_000, &wild).unwrap(), 12_000_000);
    }

    #[test]
    fn test_rate_limited_included_amount_is_minimal() {
        let fees = PoolFees {
            base_fee: BaseFeeParameters::RateLimiter(FeeRateLimiter {
                cliff_fee_numerator: 10_000_000,
                fee_increment_bps: 100,
                max_limiter_duration: 1_000,
                reference_amount: 1_000_000_000,
            }),
            dynamic_fee: None,
        };
        let mode = quote_mode(false);
        let tracker = VolatilityTracker::default();
        let target = 5_000_000_000;
        let (included, fee) = fees
            .get_included_fee_amount(10, 0, TradeDirection::QuoteToBase, target, &tracker, &mode)
            .unwrap();
        assert!(included - fee.total().unwrap() >= target);

        let numerator = fees
            .get_fee_numerator_from_included_amount(
                10,
                0,
                TradeDirection::QuoteToBase,
                included - 1,
                &tracker,
            )
            .unwrap();
        let below = get_fee_on_amount(included - 1, numerator, &mode).unwrap();
        assert!(below.amount < target);
    }

    #[test]
    fn test_rate_limited_included_amount_overflow_is_reported() {
        let fees = PoolFees {
            base_fee: BaseFeeParameters::RateLimiter(FeeRateLimiter {
                cliff_fee_numerator: 10_000_000,
                fee_increment_bps: 100,
                max_limiter_duration: 1_000,
                reference_amount: 1_000_000_000,
            }),
            dynamic_fee: None,
        };
        // At the 99% ceiling the gross amount is 100x the target and leaves u64
        let err = fees
            .get_included_fee_amount(
                10,
                0,
                TradeDirection::QuoteToBase,
                u64::MAX / 2,
                &VolatilityTracker::default(),
                &quote_mode(false),
            )
            .unwrap_err();
        assert_eq!(err, CurveError::MathOverflow.into());
    }
}
