use ethers::contract::{abigen, Multicall};
use ethers::prelude::*;
use std::sync::Arc;

use crate::chain::reader::PoolStateReader;
use crate::error::{PlannerError, PlannerResult};
use crate::models::{FeeTier, PoolState};

abigen!(
    UniswapV3Factory,
    r#"[
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool)
    ]"#
);

abigen!(
    UniswapV3Pool,
    r#"[
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
        function liquidity() external view returns (uint128)
        function tickSpacing() external view returns (int24)
    ]"#
);

type Slot0 = (U256, i32, u16, u16, u16, u8, bool);

/// `PoolStateReader` over a V3 factory and its pools.
pub struct UniswapV3Reader<M> {
    client: Arc<M>,
    factory: UniswapV3Factory<M>,
    multicall_addr: Option<Address>,
}

impl<M: Middleware + 'static> UniswapV3Reader<M> {
    /// Multicall address is auto-detected from the chain id when `None`.
    pub fn new(client: Arc<M>, factory_address: Address, multicall_addr: Option<Address>) -> Self {
        let factory = UniswapV3Factory::new(factory_address, client.clone());
        Self {
            client,
            factory,
            multicall_addr,
        }
    }

    pub fn factory_address(&self) -> Address {
        self.factory.address()
    }
}

impl<M: Middleware + 'static> PoolStateReader for UniswapV3Reader<M> {
    async fn get_pool_address(
        &self,
        token0: Address,
        token1: Address,
        fee: FeeTier,
    ) -> PlannerResult<Address> {
        let pool = self
            .factory
            .get_pool(token0, token1, fee.fee())
            .call()
            .await
            .map_err(|e| PlannerError::read_failed(format!("getPool fee tier {}", fee), e))?;

        log::debug!("factory getPool({:?}, {:?}, {}) -> {:?}", token0, token1, fee, pool);
        Ok(pool)
    }

    /// slot0, liquidity and tickSpacing in one multicall so they share a block.
    async fn get_pool_state(&self, pool_address: Address) -> PlannerResult<PoolState> {
        let target = format!("pool {:?}", pool_address);
        let pool = UniswapV3Pool::new(pool_address, self.client.clone());

        let mut mc = Multicall::new(self.client.clone(), self.multicall_addr)
            .await
            .map_err(|e| PlannerError::read_failed(target.clone(), e))?;
        mc.add_call(pool.slot_0(), false);
        mc.add_call(pool.liquidity(), false);
        mc.add_call(pool.tick_spacing(), false);

        let (slot0, liquidity, tick_spacing): (Slot0, u128, i32) = mc
            .call()
            .await
            .map_err(|e| PlannerError::read_failed(target.clone(), e))?;
        let (sqrt_price_x96, tick, ..) = slot0;

        log::debug!(
            "V3 state for {:?}: tick {}, liquidity {}, spacing {}",
            pool_address,
            tick,
            liquidity,
            tick_spacing
        );

        if sqrt_price_x96.is_zero() {
            return Err(PlannerError::read_failed(target, "pool is not initialized"));
        }

        Ok(PoolState {
            sqrt_price_x96,
            tick,
            liquidity,
            tick_spacing,
        })
    }
}
