use ethers::types::Address;
use thiserror::Error;

use crate::models::FeeTier;

/// Every failure a sizing or planning attempt can end in.
///
/// All variants are terminal for the attempt. Only `ReadFailed` is worth
/// retrying, and the engine never retries it on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("no pool exists for {token0:?}/{token1:?} in fee tiers {fee_tiers:?}")]
    NoPoolExists {
        token0: Address,
        token1: Address,
        fee_tiers: Vec<FeeTier>,
    },

    #[error("chain read failed for {target}: {message}")]
    ReadFailed { target: String, message: String },

    #[error("invalid price {price}: must be finite and > 0")]
    InvalidPrice { price: f64 },

    #[error("invalid tick range [{tick_lower}, {tick_upper}]: {reason}")]
    InvalidRange {
        tick_lower: i32,
        tick_upper: i32,
        reason: String,
    },

    #[error("invalid tick spacing {0}")]
    InvalidTickSpacing(i32),

    #[error("amount of {token:?} is not applicable while price is {regime}")]
    AmountNotApplicable { token: Address, regime: String },

    #[error("token {token:?} is not part of pool {token0:?}/{token1:?}")]
    TokenNotInPool {
        token: Address,
        token0: Address,
        token1: Address,
    },

    #[error("position is denominated in {position:?}, pool key expects {expected:?}")]
    TokenMismatch {
        position: (Address, Address),
        expected: (Address, Address),
    },

    #[error("slippage tolerance {0} bips is outside [0, 10000]")]
    InvalidTolerance(u32),

    #[error("identical tokens {0:?}")]
    IdenticalTokens(Address),

    #[error("desired amounts produce zero liquidity in [{tick_lower}, {tick_upper}]")]
    ZeroLiquidity { tick_lower: i32, tick_upper: i32 },

    #[error("liquidity {0} does not fit in uint128")]
    LiquidityOverflow(String),

    #[error("invalid amount for {symbol}: {reason}")]
    InvalidAmount { symbol: String, reason: String },

    #[error("invalid deadline for offset {offset_secs}s: {reason}")]
    InvalidDeadline { offset_secs: u64, reason: String },
}

impl PlannerError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlannerError::ReadFailed { .. })
    }

    pub(crate) fn read_failed(target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        PlannerError::ReadFailed {
            target: target.into(),
            message: err.to_string(),
        }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
