use anchor_lang::prelude::*;

/// Broad failure classes surfaced by the curve math core.
///
/// Every [`CurveError`] variant belongs to exactly one class. Callers that only care about the
/// class (e.g. to decide whether a quote can be retried with a smaller amount) can match on this
/// instead of the individual variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An arithmetic step would leave the representable range, or a kernel primitive received
    /// degenerate operands (empty price interval, zero liquidity).
    Overflow,
    /// Launch or curve parameters violate a documented invariant.
    InvalidConfiguration,
    /// An exact-in / exact-out request cannot be satisfied by the remaining curve.
    InsufficientLiquidity,
    /// Curve construction could not reconcile the supply split within the leftover tolerance.
    PrecisionReconciliation,
    /// The pool snapshot or the request itself rules out quoting.
    PoolState,
}

#[error_code]
pub enum CurveError {
    #[msg("Arithmetic overflow detected")]
    MathOverflow = 9000,

    #[msg("Arithmetic underflow detected")]
    MathUnderflow = 9001,

    #[msg("Division by zero attempted")]
    DivisionByZero = 9002,

    #[msg("Invalid sqrt price range: lower >= upper")]
    InvalidSqrtPriceRange = 9003,

    #[msg("Liquidity must be non-zero")]
    ZeroLiquidity = 9004,

    #[msg("Price is zero or outside the supported sqrt price bounds")]
    InvalidPrice = 9100,

    #[msg("Fee numerator outside the allowed range")]
    InvalidFeeNumerator = 9101,

    #[msg("Invalid fee scheduler parameters")]
    InvalidFeeScheduler = 9102,

    #[msg("Invalid rate limiter parameters")]
    InvalidFeeRateLimiter = 9103,

    #[msg("Invalid dynamic fee parameters")]
    InvalidDynamicFeeParameters = 9104,

    #[msg("Invalid collect fee mode for the selected fee model")]
    InvalidCollectFeeMode = 9105,

    #[msg("Invalid migration fee option")]
    InvalidMigrationFeeOption = 9106,

    #[msg("Invalid migrated pool fee parameters")]
    InvalidMigratedPoolFee = 9107,

    #[msg("Invalid migration fee percentage")]
    InvalidMigrationFeePercentage = 9108,

    #[msg("Invalid creator trading fee percentage")]
    InvalidCreatorTradingFeePercentage = 9109,

    #[msg("Token decimals outside the supported range")]
    InvalidTokenDecimals = 9110,

    #[msg("LP percentages must sum to 100")]
    InvalidLpPercentages = 9111,

    #[msg("Surplus split percentages must sum to 100")]
    InvalidSurplusSplit = 9112,

    #[msg("Migration quote threshold must be positive")]
    InvalidQuoteThreshold = 9113,

    #[msg("Curve is empty, too long or not strictly increasing")]
    InvalidCurve = 9114,

    #[msg("Invalid locked vesting parameters")]
    InvalidVestingParameters = 9115,

    #[msg("Invalid token supply parameters")]
    InvalidTokenSupply = 9116,

    #[msg("Invalid launch parameters")]
    InvalidLaunchParameters = 9117,

    #[msg("Solved liquidity is negative for every candidate price")]
    InfeasibleCurve = 9118,

    #[msg("Slippage tolerance exceeds 100%")]
    InvalidSlippage = 9119,

    #[msg("Not enough liquidity on the curve to fill the request")]
    InsufficientLiquidity = 9200,

    #[msg("Reconstructed supply exceeds total supply beyond the leftover tolerance")]
    SupplyReconciliationFailed = 9300,

    #[msg("Amount must be non-zero")]
    AmountIsZero = 9400,

    #[msg("Pool is paused")]
    PoolPaused = 9401,

    #[msg("Curve already reached the migration threshold")]
    CurveComplete = 9402,
}

impl CurveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CurveError::MathOverflow
            | CurveError::MathUnderflow
            | CurveError::DivisionByZero
            | CurveError::InvalidSqrtPriceRange
            | CurveError::ZeroLiquidity => ErrorKind::Overflow,
            CurveError::InsufficientLiquidity => ErrorKind::InsufficientLiquidity,
            CurveError::SupplyReconciliationFailed => ErrorKind::PrecisionReconciliation,
            CurveError::AmountIsZero | CurveError::PoolPaused | CurveError::CurveComplete => {
                ErrorKind::PoolState
            }
            _ => ErrorKind::InvalidConfiguration,
        }
    }
}
