use std::fmt;

use ethers::abi::{self, Token as AbiToken};
use ethers::types::{Address, H256, U256};
use ethers::utils::{get_create2_address_from_hash, keccak256};
use num_bigint::BigInt;
use num_integer::Integer;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::math::{bigint_to_u256, pow10, u256_to_bigint};
use crate::math::tick_math::{MAX_TICK, MIN_TICK};

/// An ERC-20 as the planner sees it. Decimals drive every raw <-> human conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Token {
    pub fn new(address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            address,
            decimals,
            symbol: symbol.into(),
            name: None,
        }
    }

    /// Human amount -> raw units. Digits past `decimals` are truncated toward zero.
    pub fn parse_amount(&self, amount: Decimal) -> PlannerResult<U256> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PlannerError::InvalidAmount {
                symbol: self.symbol.clone(),
                reason: format!("negative amount {}", amount),
            });
        }
        let truncated =
            amount.round_dp_with_strategy(self.decimals as u32, RoundingStrategy::ToZero);
        let scale = truncated.scale();
        let raw = BigInt::from(truncated.mantissa()) * pow10(self.decimals as u32 - scale);
        bigint_to_u256(&raw).ok_or_else(|| PlannerError::InvalidAmount {
            symbol: self.symbol.clone(),
            reason: format!("{} does not fit in uint256", amount),
        })
    }

    /// Raw units -> exact decimal string, trailing zeros trimmed.
    pub fn format_amount(&self, raw: U256) -> String {
        let value = u256_to_bigint(raw);
        if self.decimals == 0 {
            return value.to_string();
        }
        let (whole, frac) = value.div_rem(&pow10(self.decimals as u32));
        let frac = format!("{:0>width$}", frac.to_string(), width = self.decimals as usize);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, frac)
        }
    }
}

/// Swap fee in hundredths of a basis point (3000 = 0.30%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeTier(pub u32);

impl FeeTier {
    pub const LOWEST: FeeTier = FeeTier(100);
    pub const LOW: FeeTier = FeeTier(500);
    pub const MEDIUM: FeeTier = FeeTier(3000);
    pub const HIGH: FeeTier = FeeTier(10_000);

    pub fn fee(self) -> u32 {
        self.0
    }

    /// Spacing the canonical factory enables for the well-known tiers.
    /// Informational only: sizing always uses the spacing read from the pool.
    pub fn default_tick_spacing(self) -> Option<i32> {
        match self.0 {
            100 => Some(1),
            500 => Some(10),
            3000 => Some(60),
            10_000 => Some(200),
            _ => None,
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which slot of a canonical pair a token occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Zero,
    One,
}

/// Orders two addresses the way the factory does: lower address is token0.
pub fn sort_addresses(a: Address, b: Address) -> (Address, Address) {
    if a < b { (a, b) } else { (b, a) }
}

/// Canonically ordered (token0, token1, fee). Built once, trusted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub token0: Token,
    pub token1: Token,
    pub fee: FeeTier,
}

impl PoolKey {
    pub fn new(token_a: Token, token_b: Token, fee: FeeTier) -> PlannerResult<Self> {
        if token_a.address == token_b.address {
            return Err(PlannerError::IdenticalTokens(token_a.address));
        }
        let (token0, token1) = if token_a.address < token_b.address {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(Self { token0, token1, fee })
    }

    pub fn side_of(&self, token: Address) -> Option<Side> {
        if token == self.token0.address {
            Some(Side::Zero)
        } else if token == self.token1.address {
            Some(Side::One)
        } else {
            None
        }
    }

    pub fn token(&self, side: Side) -> &Token {
        match side {
            Side::Zero => &self.token0,
            Side::One => &self.token1,
        }
    }

    /// CREATE2 address of the pool the factory deploys for this key.
    pub fn compute_pool_address(&self, factory: Address, init_code_hash: H256) -> Address {
        let salt = keccak256(abi::encode(&[
            AbiToken::Address(self.token0.address),
            AbiToken::Address(self.token1.address),
            AbiToken::Uint(U256::from(self.fee.0)),
        ]));
        get_create2_address_from_hash(factory, salt, init_code_hash)
    }
}

/// Point-in-time pool snapshot. Never reuse across requests that must reflect
/// the current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    pub tick_spacing: i32,
}

impl PoolState {
    /// Snapshot whose price sits exactly on `tick`.
    pub fn at_tick(tick: i32, liquidity: u128, tick_spacing: i32) -> PlannerResult<Self> {
        let sqrt = crate::math::tick_math::get_sqrt_ratio_at_tick(tick)?;
        Ok(Self {
            sqrt_price_x96: bigint_to_u256(&sqrt).unwrap_or_default(),
            tick,
            liquidity,
            tick_spacing,
        })
    }

    pub fn regime(&self, range: &TickRange) -> PriceRegime {
        if self.tick < range.tick_lower {
            PriceRegime::BelowRange
        } else if self.tick < range.tick_upper {
            PriceRegime::InRange
        } else {
            PriceRegime::AboveRange
        }
    }
}

/// Where the pool price sits relative to a position's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRegime {
    /// Position is entirely token0.
    BelowRange,
    InRange,
    /// Position is entirely token1.
    AboveRange,
}

impl fmt::Display for PriceRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceRegime::BelowRange => "below range",
            PriceRegime::InRange => "in range",
            PriceRegime::AboveRange => "above range",
        };
        f.write_str(s)
    }
}

/// Direction used when snapping a tick to the spacing grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    /// Toward negative infinity. Used for lower bounds.
    Down,
    /// Toward positive infinity. Used for upper bounds.
    Up,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl TickRange {
    pub fn new(tick_lower: i32, tick_upper: i32, tick_spacing: i32) -> PlannerResult<Self> {
        let range = Self {
            tick_lower,
            tick_upper,
        };
        range.validate(tick_spacing)?;
        Ok(range)
    }

    pub fn validate(&self, tick_spacing: i32) -> PlannerResult<()> {
        let invalid = |reason: &str| PlannerError::InvalidRange {
            tick_lower: self.tick_lower,
            tick_upper: self.tick_upper,
            reason: reason.to_string(),
        };
        if tick_spacing <= 0 {
            return Err(PlannerError::InvalidTickSpacing(tick_spacing));
        }
        if self.tick_lower >= self.tick_upper {
            return Err(invalid("lower tick must be below upper tick"));
        }
        if self.tick_lower < MIN_TICK || self.tick_upper > MAX_TICK {
            return Err(invalid("outside global tick bounds"));
        }
        if self.tick_lower % tick_spacing != 0 || self.tick_upper % tick_spacing != 0 {
            return Err(invalid(&format!("not aligned to tick spacing {}", tick_spacing)));
        }
        Ok(())
    }
}

/// Sized deposit quote, labeled with the tokens its amounts are denominated in.
///
/// `amount0`/`amount1` go to the position manager as the desired amounts.
/// The manager re-derives liquidity from them and pulls `pulled0`/`pulled1`,
/// which can sit a few units lower; minimums are taken from the pulled side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub token0: Address,
    pub token1: Address,
    pub amount0: U256,
    pub amount1: U256,
    pub liquidity: u128,
    pub pulled0: U256,
    pub pulled1: U256,
}

/// Arguments for `NonfungiblePositionManager.mint`, in canonical pool order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintParams {
    pub token0: Address,
    pub token1: Address,
    pub fee: FeeTier,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: U256,
    pub amount1_desired: U256,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub recipient: Address,
    pub deadline: u64,
}
