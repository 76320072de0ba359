// Request-level composition: resolve, price the range, size, guard, build.

use chrono::Utc;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::chain::reader::PoolStateReader;
use crate::engine::mint::{build_at, unix_seconds};
use crate::engine::price_ticks::{range_from_prices, tick_to_price};
use crate::engine::resolver::{PoolResolver, ResolvedPool};
use crate::engine::sizer::size;
use crate::engine::slippage::{minimums, Minimums};
use crate::engine::solver::solve_from_single_side;
use crate::error::PlannerResult;
use crate::models::{FeeTier, MintParams, PoolKey, PoolState, Position, PriceRegime, Side, TickRange, Token};

/// What the caller wants to put in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Deposit {
    /// Upper bounds for both sides; the smaller implied liquidity wins.
    Pair { base_amount: U256, quote_amount: U256 },
    /// Exactly `amount` of `token`, the other side derived.
    Single { token: Address, amount: U256 },
}

/// Prices are quote per one base. `None` bounds open the range to the
/// corresponding end of the tick domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRequest {
    pub base: Token,
    pub quote: Token,
    pub fee: FeeTier,
    pub price_lower: Option<f64>,
    pub price_upper: Option<f64>,
    pub deposit: Deposit,
    pub slippage_bips: u32,
    pub recipient: Address,
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionPlan {
    pub pool: Address,
    pub key: PoolKey,
    pub state: PoolState,
    pub range: TickRange,
    pub regime: PriceRegime,
    /// Quote per base at the pool's current tick.
    pub current_price: f64,
    pub position: Position,
    pub minimums: Minimums,
    pub mint: MintParams,
}

pub struct PositionPlanner<R> {
    resolver: PoolResolver<R>,
}

impl<R: PoolStateReader> PositionPlanner<R> {
    pub fn new(resolver: PoolResolver<R>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PoolResolver<R> {
        &self.resolver
    }

    /// Plan against pool state read now.
    pub async fn plan(&self, request: &PositionRequest) -> PlannerResult<PositionPlan> {
        let now = unix_seconds(Utc::now(), request.deadline_secs)?;
        self.plan_at(request, now).await
    }

    /// Same as [`plan`](Self::plan) with the deadline clock fixed at `now`.
    /// Pool state is still read fresh.
    pub async fn plan_at(&self, request: &PositionRequest, now: u64) -> PlannerResult<PositionPlan> {
        let resolved = self.resolver.load_pool(&request.base, &request.quote, request.fee).await?;
        let plan = assemble(request, resolved, now)?;
        log::info!(
            "planned {} {} / {} {} in [{}, {}] ({}): liquidity {}",
            plan.key.token0.format_amount(plan.position.amount0),
            plan.key.token0.symbol,
            plan.key.token1.format_amount(plan.position.amount1),
            plan.key.token1.symbol,
            plan.range.tick_lower,
            plan.range.tick_upper,
            plan.regime,
            plan.position.liquidity
        );
        Ok(plan)
    }
}

/// Pure part of planning, over an already loaded pool.
pub fn assemble(request: &PositionRequest, resolved: ResolvedPool, now: u64) -> PlannerResult<PositionPlan> {
    let ResolvedPool { key, address, state } = resolved;
    let range = range_from_prices(
        request.price_lower,
        request.price_upper,
        &request.base,
        &request.quote,
        state.tick_spacing,
    )?;

    let position = match &request.deposit {
        Deposit::Pair {
            base_amount,
            quote_amount,
        } => {
            let (desired0, desired1) = match key.side_of(request.base.address) {
                Some(Side::Zero) => (*base_amount, *quote_amount),
                _ => (*quote_amount, *base_amount),
            };
            size(&key, &state, &range, desired0, desired1)?
        }
        Deposit::Single { token, amount } => solve_from_single_side(&key, &state, &range, *token, *amount)?,
    };

    let minimums = minimums(&position, request.slippage_bips)?;
    let mint = build_at(&key, &range, &position, &minimums, request.recipient, request.deadline_secs, now)?;
    let current_price = tick_to_price(state.tick, &request.base, &request.quote)?;

    Ok(PositionPlan {
        pool: address,
        regime: state.regime(&range),
        key,
        state,
        range,
        current_price,
        position,
        minimums,
        mint,
    })
}
