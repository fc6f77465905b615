use crate::error::CurveError;
use crate::math::core_arithmetic::{shl_div, u512_to_u128};
use crate::utils::constants::{
    BASIS_POINT_MAX, BIN_STEP_BPS_DEFAULT, BIN_STEP_BPS_U128_DEFAULT,
    DYNAMIC_FEE_DECAY_PERIOD_DEFAULT, DYNAMIC_FEE_FILTER_PERIOD_DEFAULT,
    DYNAMIC_FEE_REDUCTION_FACTOR_DEFAULT, DYNAMIC_FEE_SCALING_FACTOR, FEE_DENOMINATOR,
    MAX_DYNAMIC_FEE_PERCENT, ONE_Q64, RESOLUTION, U24_MAX,
};
use anchor_lang::prelude::*;
use primitive_types::U512;

/// Volatility surcharge configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct DynamicFeeParameters {
    pub bin_step: u16,
    /// `bin_step` in Q64.64 basis points.
    pub bin_step_u128: u128,
    pub filter_period: u16,
    pub decay_period: u16,
    pub reduction_factor: u16,
    pub max_volatility_accumulator: u32,
    pub variable_fee_control: u32,
}

/// Volatility state carried by the pool snapshot.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct VolatilityTracker {
    pub last_update_timestamp: u64,
    pub sqrt_price_reference: u128,
    pub volatility_accumulator: u128,
    pub volatility_reference: u128,
}

/// Number of bins between two sqrt prices, doubled to express it in price bins.
pub fn get_delta_bin_id(
    bin_step_u128: u128,
    sqrt_price_a: u128,
    sqrt_price_b: u128,
) -> Result<u128> {
    require!(bin_step_u128 > 0, CurveError::DivisionByZero);
    let (upper, lower) = if sqrt_price_a > sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    };
    let price_ratio = shl_div(upper, lower, RESOLUTION)?;
    let delta_bin_id = price_ratio
        .checked_sub(ONE_Q64)
        .ok_or(CurveError::MathUnderflow)?
        / bin_step_u128;
    delta_bin_id
        .checked_mul(2)
        .ok_or_else(|| CurveError::MathOverflow.into())
}

impl DynamicFeeParameters {
    /// Parameters whose surcharge reaches `MAX_DYNAMIC_FEE_PERCENT` of `base_fee_bps` once a
    /// single move spans `max_price_change_bps`.
    pub fn for_base_fee(base_fee_bps: u16, max_price_change_bps: u16) -> Result<Self> {
        require!(
            (max_price_change_bps as u64) <= BASIS_POINT_MAX,
            CurveError::InvalidDynamicFeeParameters
        );
        let ratio_scaled = (U512::from(BASIS_POINT_MAX + max_price_change_bps as u64)
            << (RESOLUTION * 2) as usize)
            / U512::from(BASIS_POINT_MAX);
        let sqrt_price_ratio = u512_to_u128(ratio_scaled.integer_sqrt())?;
        let delta_bin_id = get_delta_bin_id(BIN_STEP_BPS_U128_DEFAULT, ONE_Q64, sqrt_price_ratio)?;
        let max_volatility_accumulator = delta_bin_id
            .checked_mul(BASIS_POINT_MAX as u128)
            .ok_or(CurveError::MathOverflow)?;
        require!(
            max_volatility_accumulator > 0 && max_volatility_accumulator <= U24_MAX as u128,
            CurveError::InvalidDynamicFeeParameters
        );

        let squared_vfa_bin = (max_volatility_accumulator * BIN_STEP_BPS_DEFAULT as u128).pow(2);
        let base_fee_numerator = base_fee_bps as u128 * FEE_DENOMINATOR as u128 / BASIS_POINT_MAX as u128;
        let max_dynamic_fee_numerator = base_fee_numerator * MAX_DYNAMIC_FEE_PERCENT as u128 / 100;
        let variable_fee_control = (max_dynamic_fee_numerator * DYNAMIC_FEE_SCALING_FACTOR)
            .saturating_sub(DYNAMIC_FEE_SCALING_FACTOR - 1)
            / squared_vfa_bin;

        let params = Self {
            bin_step: BIN_STEP_BPS_DEFAULT,
            bin_step_u128: BIN_STEP_BPS_U128_DEFAULT,
            filter_period: DYNAMIC_FEE_FILTER_PERIOD_DEFAULT,
            decay_period: DYNAMIC_FEE_DECAY_PERIOD_DEFAULT,
            reduction_factor: DYNAMIC_FEE_REDUCTION_FACTOR_DEFAULT,
            max_volatility_accumulator: max_volatility_accumulator as u32,
            variable_fee_control: u32::try_from(variable_fee_control)
                .map_err(|_| CurveError::InvalidDynamicFeeParameters)?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        require!(
            self.bin_step == BIN_STEP_BPS_DEFAULT && self.bin_step_u128 == BIN_STEP_BPS_U128_DEFAULT,
            CurveError::InvalidDynamicFeeParameters
        );
        require!(
            self.filter_period < self.decay_period,
            CurveError::InvalidDynamicFeeParameters
        );
        require!(
            self.reduction_factor as u64 <= BASIS_POINT_MAX,
            CurveError::InvalidDynamicFeeParameters
        );
        require!(
            self.variable_fee_control <= U24_MAX && self.max_volatility_accumulator <= U24_MAX,
            CurveError::InvalidDynamicFeeParameters
        );
        Ok(())
    }

    /// `ceil((va · bin_step)^2 · variable_fee_control / 10^11)`
    pub fn get_variable_fee_numerator(&self, tracker: &VolatilityTracker) -> Result<u128> {
        let square_vfa_bin = tracker
            .volatility_accumulator
            .checked_mul(self.bin_step as u128)
            .and_then(|v| v.checked_mul(v))
            .ok_or(CurveError::MathOverflow)?;
        let v_fee = square_vfa_bin
            .checked_mul(self.variable_fee_control as u128)
            .ok_or(CurveError::MathOverflow)?;
        Ok(v_fee
            .checked_add(DYNAMIC_FEE_SCALING_FACTOR - 1)
            .ok_or(CurveError::MathOverflow)?
            / DYNAMIC_FEE_SCALING_FACTOR)
    }
}

impl VolatilityTracker {
    /// Tracker as seen by a trade at `current_timestamp`, before the trade moves the price.
    ///
    /// Once `filter_period` has elapsed the reference price resets to `sqrt_price`; the
    /// reference volatility decays by `reduction_factor`, or drops to zero after `decay_period`.
    pub fn update_references(
        &self,
        params: &DynamicFeeParameters,
        sqrt_price: u128,
        current_timestamp: u64,
    ) -> Result<Self> {
        let elapsed = current_timestamp.saturating_sub(self.last_update_timestamp);
        let mut next = *self;
        if elapsed >= params.filter_period as u64 {
            next.sqrt_price_reference = sqrt_price;
            next.volatility_reference = if elapsed < params.decay_period as u64 {
                self.volatility_accumulator
                    .checked_mul(params.reduction_factor as u128)
                    .ok_or(CurveError::MathOverflow)?
                    / BASIS_POINT_MAX as u128
            } else {
                0
            };
        }
        Ok(next)
    }

    /// Tracker after a trade moved the price to `sqrt_price` at `current_timestamp`.
    pub fn update_volatility_accumulator(
        &self,
        params: &DynamicFeeParameters,
        sqrt_price: u128,
        current_timestamp: u64,
    ) -> Result<Self> {
        let delta_price =
            get_delta_bin_id(params.bin_step_u128, self.sqrt_price_reference, sqrt_price)?;
        let accumulator = self
            .volatility_reference
            .checked_add(
                delta_price
                    .checked_mul(BASIS_POINT_MAX as u128)
                    .ok_or(CurveError::MathOverflow)?,
            )
            .ok_or(CurveError::MathOverflow)?;
        Ok(Self {
            volatility_accumulator: accumulator.min(params.max_volatility_accumulator as u128),
            last_update_timestamp: current_timestamp,
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::MAX_PRICE_CHANGE_BPS_DEFAULT;

    #[test]
    fn test_default_price_change_sizing() {
        let params = DynamicFeeParameters::for_base_fee(100, MAX_PRICE_CHANGE_BPS_DEFAULT).unwrap();
        assert_eq!(params.max_volatility_accumulator, 14_460_000);
        assert_eq!(params.filter_period, DYNAMIC_FEE_FILTER_PERIOD_DEFAULT);

        let saturated = VolatilityTracker {
            volatility_accumulator: params.max_volatility_accumulator as u128,
            ..Default::default()
        };
        let surcharge = params.get_variable_fee_numerator(&saturated).unwrap();
        // 20% of a 1% base fee
        assert!(surcharge <= 2_000_000);
        assert!(surcharge > 1_990_000);
    }

    #[test]
    fn test_surcharge_grows_with_volatility() {
        let params = DynamicFeeParameters::for_base_fee(250, MAX_PRICE_CHANGE_BPS_DEFAULT).unwrap();
        let mut previous = 0;
        for va in [0u128, 10_000, 1_000_000, 5_000_000, 14_460_000] {
            let tracker = VolatilityTracker {
                volatility_accumulator: va,
                ..Default::default()
            };
            let fee = params.get_variable_fee_numerator(&tracker).unwrap();
            assert!(fee >= previous);
            previous = fee;
        }
    }

    #[test]
    fn test_delta_bin_id_is_symmetric() {
        let up = ONE_Q64 + ONE_Q64 / 100;
        let a = get_delta_bin_id(BIN_STEP_BPS_U128_DEFAULT, ONE_Q64, up).unwrap();
        let b = get_delta_bin_id(BIN_STEP_BPS_U128_DEFAULT, up, ONE_Q64).unwrap();
        assert_eq!(a, b);
        // a 1% sqrt price move is about 100 one-bps bins
        assert!((198..=200).contains(&a));
    }

    #[test]
    fn test_tracker_updates() {
        let params = DynamicFeeParameters::for_base_fee(100, MAX_PRICE_CHANGE_BPS_DEFAULT).unwrap();
        let tracker = VolatilityTracker {
            last_update_timestamp: 1_000,
            sqrt_price_reference: ONE_Q64,
            volatility_accumulator: 1_000_000,
            volatility_reference: 0,
        };

        // Inside the filter period nothing moves
        let same = tracker.update_references(&params, 2 * ONE_Q64, 1_005).unwrap();
        assert_eq!(same, tracker);

        // Between filter and decay the reference halves
        let decayed = tracker.update_references(&params, 2 * ONE_Q64, 1_050).unwrap();
        assert_eq!(decayed.volatility_reference, 500_000);
        assert_eq!(decayed.sqrt_price_reference, 2 * ONE_Q64);

        // Past decay it resets
        let reset = tracker.update_references(&params, ONE_Q64, 2_000).unwrap();
        assert_eq!(reset.volatility_reference, 0);

        let moved = reset
            .update_volatility_accumulator(&params, ONE_Q64 + ONE_Q64 / 100, 2_000)
            .unwrap();
        assert!(moved.volatility_accumulator > 0);
        assert!(moved.volatility_accumulator <= params.max_volatility_accumulator as u128);
        assert_eq!(moved.last_update_timestamp, 2_000);
    }

    #[test]
    fn test_rejects_non_default_bin_step() {
        let params = DynamicFeeParameters {
            bin_step: 2,
            ..DynamicFeeParameters::for_base_fee(100, MAX_PRICE_CHANGE_BPS_DEFAULT).unwrap()
        };
        assert_eq!(
            params.validate().unwrap_err(),
            CurveError::InvalidDynamicFeeParameters.into()
        );
    }
}
