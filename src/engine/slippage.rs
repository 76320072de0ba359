use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::models::Position;

pub const BIPS_DENOMINATOR: u32 = 10_000;

/// Lower bounds the caller accepts at execution, labeled like the position
/// they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minimums {
    pub token0: Address,
    pub token1: Address,
    pub amount0_min: U256,
    pub amount1_min: U256,
}

fn apply(amount: U256, tolerance_bips: u32) -> U256 {
    // U256 only overflows here for amounts above 2^242
    amount
        .checked_mul(U256::from(BIPS_DENOMINATOR - tolerance_bips))
        .map(|scaled| scaled / U256::from(BIPS_DENOMINATOR))
        .unwrap_or_else(|| amount / U256::from(BIPS_DENOMINATOR) * U256::from(BIPS_DENOMINATOR - tolerance_bips))
}

/// `amount * (10000 - bips) / 10000` per side, truncated, over the amounts
/// the position manager pulls. With zero tolerance the minimums equal the
/// pull, never the desired caps above it.
pub fn minimums(position: &Position, tolerance_bips: u32) -> PlannerResult<Minimums> {
    if tolerance_bips > BIPS_DENOMINATOR {
        return Err(PlannerError::InvalidTolerance(tolerance_bips));
    }
    Ok(Minimums {
        token0: position.token0,
        token1: position.token1,
        amount0_min: apply(position.pulled0, tolerance_bips),
        amount1_min: apply(position.pulled1, tolerance_bips),
    })
}
