use std::str::FromStr;
use std::sync::Arc;

use ethers::types::{Address, U256};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::bootstrap::AppState;
use crate::engine::planner::{Deposit, PositionPlan, PositionRequest};
use crate::engine::price_ticks::tick_to_price;
use crate::error::PlannerError;
use crate::models::{FeeTier, Token};
use crate::web::dto::{
    AmountDetails, ErrorResponse, PoolEntry, PoolsQuery, PoolsResponse, PositionQuoteRequest, PositionQuoteResponse,
};

type ApiResult<T> = Result<Json<T>, Custom<Json<ErrorResponse>>>;

fn status_for(err: &PlannerError) -> Status {
    match err {
        PlannerError::ReadFailed { .. } => Status::BadGateway,
        PlannerError::NoPoolExists { .. } => Status::NotFound,
        _ => Status::UnprocessableEntity,
    }
}

fn reject(status: Status, error: String, retryable: bool) -> Custom<Json<ErrorResponse>> {
    Custom(
        status,
        Json(ErrorResponse {
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
            error,
            retryable,
        }),
    )
}

fn planner_error(context: &str, err: PlannerError) -> Custom<Json<ErrorResponse>> {
    log::error!("{}: {}", context, err);
    reject(status_for(&err), err.to_string(), err.is_retryable())
}

fn parse_address(name: &str, raw: &str) -> Result<Address, Custom<Json<ErrorResponse>>> {
    Address::from_str(raw.trim()).map_err(|e| reject(Status::BadRequest, format!("{} {:?}: {}", name, raw, e), false))
}

#[get("/api/v1/pools?<query..>")]
pub async fn pools(query: PoolsQuery, app_state: &State<Arc<AppState>>) -> ApiResult<PoolsResponse> {
    let token_a = parse_address("token_a", &query.token_a)?;
    let token_b = parse_address("token_b", &query.token_b)?;

    let found = app_state
        .planner
        .resolver()
        .find_all_pools(token_a, token_b, &app_state.fee_tiers)
        .await
        .map_err(|e| planner_error("Failed to look up pools", e))?;

    let (token0, token1) = crate::models::sort_addresses(token_a, token_b);
    Ok(Json(PoolsResponse {
        token0,
        token1,
        pools: found
            .into_iter()
            .map(|(fee, address)| PoolEntry {
                fee: fee.fee(),
                address,
                default_tick_spacing: fee.default_tick_spacing(),
            })
            .collect(),
    }))
}

fn to_request(body: PositionQuoteRequest, app_state: &AppState) -> Result<PositionRequest, PlannerError> {
    let base: Token = body.base.into();
    let quote: Token = body.quote.into();

    let deposit = match (body.base_amount, body.quote_amount) {
        (Some(b), Some(q)) => Deposit::Pair {
            base_amount: base.parse_amount(b)?,
            quote_amount: quote.parse_amount(q)?,
        },
        (Some(b), None) => Deposit::Single {
            token: base.address,
            amount: base.parse_amount(b)?,
        },
        (None, Some(q)) => Deposit::Single {
            token: quote.address,
            amount: quote.parse_amount(q)?,
        },
        (None, None) => {
            return Err(PlannerError::InvalidAmount {
                symbol: format!("{}/{}", base.symbol, quote.symbol),
                reason: "at least one of base_amount and quote_amount is required".to_string(),
            })
        }
    };

    Ok(PositionRequest {
        base,
        quote,
        fee: FeeTier(body.fee),
        price_lower: body.price_lower,
        price_upper: body.price_upper,
        deposit,
        slippage_bips: body.slippage_bips.unwrap_or(app_state.default_slippage_bips),
        recipient: body.recipient,
        deadline_secs: body.deadline_secs.unwrap_or(app_state.default_deadline_secs),
    })
}

fn amount_details(token: &Token, desired: U256, minimum: U256) -> AmountDetails {
    AmountDetails {
        token: token.address,
        symbol: token.symbol.clone(),
        desired: token.format_amount(desired),
        minimum: token.format_amount(minimum),
        desired_raw: desired.to_string(),
        minimum_raw: minimum.to_string(),
    }
}

fn to_response(request: &PositionRequest, plan: PositionPlan, to: Address) -> Result<PositionQuoteResponse, PlannerError> {
    // bounds as actually placed on the grid, in the caller's quote-per-base terms
    let at_lower = tick_to_price(plan.range.tick_lower, &request.base, &request.quote)?;
    let at_upper = tick_to_price(plan.range.tick_upper, &request.base, &request.quote)?;

    Ok(PositionQuoteResponse {
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        pool: plan.pool,
        fee: plan.key.fee.fee(),
        tick_spacing: plan.state.tick_spacing,
        current_tick: plan.state.tick,
        current_price: plan.current_price,
        tick_lower: plan.range.tick_lower,
        tick_upper: plan.range.tick_upper,
        price_lower: at_lower.min(at_upper),
        price_upper: at_lower.max(at_upper),
        regime: plan.regime,
        liquidity: plan.position.liquidity.to_string(),
        amount0: amount_details(&plan.key.token0, plan.mint.amount0_desired, plan.mint.amount0_min),
        amount1: amount_details(&plan.key.token1, plan.mint.amount1_desired, plan.mint.amount1_min),
        calldata: format!("0x{}", hex::encode(plan.mint.calldata())),
        mint: plan.mint,
        to,
    })
}

#[post("/api/v1/position-quote", format = "json", data = "<body>")]
pub async fn position_quote(
    body: Json<PositionQuoteRequest>,
    app_state: &State<Arc<AppState>>,
) -> ApiResult<PositionQuoteResponse> {
    let request = to_request(body.into_inner(), app_state).map_err(|e| planner_error("Rejected position quote", e))?;
    let plan = app_state
        .planner
        .plan(&request)
        .await
        .map_err(|e| planner_error("Failed to plan position", e))?;
    let response =
        to_response(&request, plan, app_state.position_manager).map_err(|e| planner_error("Failed to render plan", e))?;
    Ok(Json(response))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
