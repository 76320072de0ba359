use ethers::types::Address;
use rocket::serde::{Deserialize, Serialize};
use rust_decimal::Decimal;

use crate::models::{MintParams, PriceRegime, Token};

#[derive(Deserialize, rocket::FromForm)]
pub struct PoolsQuery {
    pub token_a: String,
    pub token_b: String,
}

#[derive(Serialize)]
pub struct PoolEntry {
    pub fee: u32,
    pub address: Address,
    pub default_tick_spacing: Option<i32>,
}

#[derive(Serialize)]
pub struct PoolsResponse {
    pub token0: Address,
    pub token1: Address,
    pub pools: Vec<PoolEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInput {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
}

impl From<TokenInput> for Token {
    fn from(t: TokenInput) -> Self {
        Token::new(t.address, t.decimals, t.symbol)
    }
}

/// Human-unit request. Supplying both amounts sizes a pair; supplying one
/// solves for the other side.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionQuoteRequest {
    pub base: TokenInput,
    pub quote: TokenInput,
    pub fee: u32,
    pub price_lower: Option<f64>,
    pub price_upper: Option<f64>,
    pub base_amount: Option<Decimal>,
    pub quote_amount: Option<Decimal>,
    pub slippage_bips: Option<u32>,
    pub deadline_secs: Option<u64>,
    pub recipient: Address,
}

#[derive(Serialize)]
pub struct AmountDetails {
    pub token: Address,
    pub symbol: String,
    pub desired: String,  // human units
    pub minimum: String,  // human units
    pub desired_raw: String,
    pub minimum_raw: String,
}

#[derive(Serialize)]
pub struct PositionQuoteResponse {
    pub timestamp_utc: String,
    pub pool: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub current_tick: i32,
    pub current_price: f64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub price_lower: f64,
    pub price_upper: f64,
    pub regime: PriceRegime,
    pub liquidity: String,
    pub amount0: AmountDetails,
    pub amount1: AmountDetails,
    pub mint: MintParams,
    pub to: Address,
    pub calldata: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub timestamp_utc: String,
    pub error: String,
    pub retryable: bool,
}
