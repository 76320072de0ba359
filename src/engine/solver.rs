// Counter-amount derivation for single-token deposits.

use ethers::types::{Address, U256};

use crate::engine::sizer::{other, settle, to_u256, PriceInterval};
use crate::error::{PlannerError, PlannerResult};
use crate::math::u256_to_bigint;
use crate::models::{PoolKey, PoolState, Position, Side, TickRange};

/// Derive the other token's amount from `input_amount` of `input_token`.
///
/// Fails with `AmountNotApplicable` when the range holds none of the input
/// token at the current price, instead of falling back to the other side.
pub fn solve_from_single_side(
    key: &PoolKey,
    pool: &PoolState,
    range: &TickRange,
    input_token: Address,
    input_amount: U256,
) -> PlannerResult<Position> {
    let side = key.side_of(input_token).ok_or(PlannerError::TokenNotInPool {
        token: input_token,
        token0: key.token0.address,
        token1: key.token1.address,
    })?;
    let interval = PriceInterval::new(pool, range)?;

    let liquidity = interval
        .liquidity_for(side, &u256_to_bigint(input_amount))
        .ok_or_else(|| PlannerError::AmountNotApplicable {
            token: input_token,
            regime: interval.regime.to_string(),
        })?;
    let checked = interval.checked_liquidity(&liquidity)?;
    let counter = to_u256(&interval.amount_for(other(side), &liquidity))?;

    log::debug!(
        "{} {} {} needs {} {} ({}, liquidity {})",
        input_amount,
        key.token(side).symbol,
        if side == Side::Zero { "as token0" } else { "as token1" },
        counter,
        key.token(other(side)).symbol,
        interval.regime,
        checked
    );

    match side {
        Side::Zero => settle(key, &interval, input_amount, counter, checked),
        Side::One => settle(key, &interval, counter, input_amount, checked),
    }
}
