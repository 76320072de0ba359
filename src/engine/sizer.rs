// Position sizing from desired amounts, and the shared per-side helpers the
// single-sided solver reuses.

use ethers::types::U256;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::error::{PlannerError, PlannerResult};
use crate::math::liquidity_amounts::{
    amount0_delta, amount1_delta, liquidity_for_amount0, liquidity_for_amount1, liquidity_for_amounts,
};
use crate::math::tick_math::get_sqrt_ratio_at_tick;
use crate::math::{bigint_to_u128, bigint_to_u256, u256_to_bigint};
use crate::models::{PoolKey, PoolState, Position, PriceRegime, Side, TickRange};

/// Sqrt prices of a range evaluated against the current pool price.
pub(crate) struct PriceInterval {
    pub regime: PriceRegime,
    range: TickRange,
    sqrt_lower: BigInt,
    sqrt_upper: BigInt,
    sqrt_price: BigInt,
}

impl PriceInterval {
    pub fn new(pool: &PoolState, range: &TickRange) -> PlannerResult<Self> {
        range.validate(pool.tick_spacing)?;
        let sqrt_lower = get_sqrt_ratio_at_tick(range.tick_lower)?;
        let sqrt_upper = get_sqrt_ratio_at_tick(range.tick_upper)?;
        // keep the in-range price inside the bounds even if tick and price
        // were read a hair apart
        let sqrt_price = u256_to_bigint(pool.sqrt_price_x96).clamp(sqrt_lower.clone(), sqrt_upper.clone());
        Ok(Self {
            regime: pool.regime(range),
            range: *range,
            sqrt_lower,
            sqrt_upper,
            sqrt_price,
        })
    }

    /// Sqrt-price span over which `side` is held, `None` when the position
    /// holds none of it.
    fn span(&self, side: Side) -> Option<(&BigInt, &BigInt)> {
        let span = match (self.regime, side) {
            (PriceRegime::BelowRange, Side::Zero) => (&self.sqrt_lower, &self.sqrt_upper),
            (PriceRegime::InRange, Side::Zero) => (&self.sqrt_price, &self.sqrt_upper),
            (PriceRegime::InRange, Side::One) => (&self.sqrt_lower, &self.sqrt_price),
            (PriceRegime::AboveRange, Side::One) => (&self.sqrt_lower, &self.sqrt_upper),
            _ => return None,
        };
        (span.0 < span.1).then_some(span)
    }

    /// Liquidity `amount` of `side` can fund, rounded down.
    pub fn liquidity_for(&self, side: Side, amount: &BigInt) -> Option<BigInt> {
        let (a, b) = self.span(side)?;
        Some(match side {
            Side::Zero => liquidity_for_amount0(a, b, amount),
            Side::One => liquidity_for_amount1(a, b, amount),
        })
    }

    /// Amount of `side` the pool pulls to mint `liquidity`, rounded up.
    pub fn amount_for(&self, side: Side, liquidity: &BigInt) -> BigInt {
        match (self.span(side), side) {
            (Some((a, b)), Side::Zero) => amount0_delta(a, b, liquidity, true),
            (Some((a, b)), Side::One) => amount1_delta(a, b, liquidity, true),
            (None, _) => BigInt::zero(),
        }
    }

    /// Liquidity the position manager mints when handed `amount0`/`amount1`.
    fn minted_liquidity(&self, amount0: &BigInt, amount1: &BigInt) -> BigInt {
        liquidity_for_amounts(&self.sqrt_price, &self.sqrt_lower, &self.sqrt_upper, amount0, amount1)
    }

    pub fn checked_liquidity(&self, liquidity: &BigInt) -> PlannerResult<u128> {
        if liquidity.is_zero() {
            return Err(PlannerError::ZeroLiquidity {
                tick_lower: self.range.tick_lower,
                tick_upper: self.range.tick_upper,
            });
        }
        bigint_to_u128(liquidity).ok_or_else(|| PlannerError::LiquidityOverflow(liquidity.to_string()))
    }
}

pub(crate) fn to_u256(value: &BigInt) -> PlannerResult<U256> {
    bigint_to_u256(value).ok_or_else(|| PlannerError::LiquidityOverflow(value.to_string()))
}

/// Quote `amount0`/`amount1` as desired amounts, with the pulled side taken
/// from the liquidity the position manager will actually mint for them.
pub(crate) fn settle(
    key: &PoolKey,
    interval: &PriceInterval,
    amount0: U256,
    amount1: U256,
    liquidity: u128,
) -> PlannerResult<Position> {
    let minted = interval.minted_liquidity(&u256_to_bigint(amount0), &u256_to_bigint(amount1));
    interval.checked_liquidity(&minted)?;
    Ok(Position {
        token0: key.token0.address,
        token1: key.token1.address,
        amount0,
        amount1,
        liquidity,
        pulled0: to_u256(&interval.amount_for(Side::Zero, &minted))?,
        pulled1: to_u256(&interval.amount_for(Side::One, &minted))?,
    })
}

pub fn other(side: Side) -> Side {
    match side {
        Side::Zero => Side::One,
        Side::One => Side::Zero,
    }
}

/// Size a position from a desired (token0, token1) pair in canonical order.
///
/// The side whose amount funds less liquidity limits the position and is
/// reported at its full desired amount; the other side is what the pool pulls
/// for that liquidity. Neither exceeds what was offered.
pub fn size(
    key: &PoolKey,
    pool: &PoolState,
    range: &TickRange,
    desired0: U256,
    desired1: U256,
) -> PlannerResult<Position> {
    let interval = PriceInterval::new(pool, range)?;
    let desired = [u256_to_bigint(desired0), u256_to_bigint(desired1)];

    let l0 = interval.liquidity_for(Side::Zero, &desired[0]);
    let l1 = interval.liquidity_for(Side::One, &desired[1]);
    let (liquidity, limiting) = match (l0, l1) {
        (Some(a), Some(b)) if a <= b => (a, Side::Zero),
        (Some(_), Some(b)) => (b, Side::One),
        (Some(a), None) => (a, Side::Zero),
        (None, Some(b)) => (b, Side::One),
        (None, None) => (BigInt::zero(), Side::Zero),
    };
    let checked = interval.checked_liquidity(&liquidity)?;

    let dependent = to_u256(&interval.amount_for(other(limiting), &liquidity))?;
    let (amount0, amount1) = match limiting {
        Side::Zero => (desired0, dependent),
        Side::One => (dependent, desired1),
    };

    log::debug!(
        "sized [{}, {}] {} at tick {}: liquidity {}, limited by token{}",
        range.tick_lower,
        range.tick_upper,
        interval.regime,
        pool.tick,
        checked,
        if limiting == Side::Zero { 0 } else { 1 }
    );
    settle(key, &interval, amount0, amount1, checked)
}

/// Amounts the pool pulls to mint exactly `liquidity` over `range`.
pub fn amounts_for_liquidity(
    key: &PoolKey,
    pool: &PoolState,
    range: &TickRange,
    liquidity: u128,
) -> PlannerResult<Position> {
    let interval = PriceInterval::new(pool, range)?;
    let l = BigInt::from(liquidity);
    let amount0 = to_u256(&interval.amount_for(Side::Zero, &l))?;
    let amount1 = to_u256(&interval.amount_for(Side::One, &l))?;
    Ok(Position {
        token0: key.token0.address,
        token1: key.token1.address,
        amount0,
        amount1,
        liquidity,
        pulled0: amount0,
        pulled1: amount1,
    })
}
