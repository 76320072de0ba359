use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use ethers::types::Address;

use crate::error::{PlannerError, PlannerResult};
use crate::models::{sort_addresses, FeeTier, PoolState};

/// Read-only view of the pool factory and pools.
///
/// Implementations must report an absent pool as `Address::zero()` and keep
/// `ReadFailed` for transport problems, so callers can tell "no pool" from
/// "could not ask".
pub trait PoolStateReader: Send + Sync {
    fn get_pool_address(
        &self,
        token0: Address,
        token1: Address,
        fee: FeeTier,
    ) -> impl Future<Output = PlannerResult<Address>> + Send;

    fn get_pool_state(&self, pool: Address) -> impl Future<Output = PlannerResult<PoolState>> + Send;
}

/// Reader backed by fixed snapshots. Serves offline planning and tests.
#[derive(Debug, Default)]
pub struct StaticPoolReader {
    pools: HashMap<(Address, Address, FeeTier), Address>,
    states: HashMap<Address, PoolState>,
    failing_tiers: HashSet<FeeTier>,
    address_reads: AtomicUsize,
    state_reads: AtomicUsize,
}

impl StaticPoolReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(
        mut self,
        token_a: Address,
        token_b: Address,
        fee: FeeTier,
        pool: Address,
        state: PoolState,
    ) -> Self {
        let (token0, token1) = sort_addresses(token_a, token_b);
        self.pools.insert((token0, token1, fee), pool);
        self.states.insert(pool, state);
        self
    }

    /// Address lookups for `fee` fail as if the RPC were unreachable.
    pub fn with_failing_tier(mut self, fee: FeeTier) -> Self {
        self.failing_tiers.insert(fee);
        self
    }

    pub fn address_reads(&self) -> usize {
        self.address_reads.load(Ordering::SeqCst)
    }

    pub fn state_reads(&self) -> usize {
        self.state_reads.load(Ordering::SeqCst)
    }
}

impl PoolStateReader for StaticPoolReader {
    async fn get_pool_address(
        &self,
        token0: Address,
        token1: Address,
        fee: FeeTier,
    ) -> PlannerResult<Address> {
        self.address_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_tiers.contains(&fee) {
            return Err(PlannerError::read_failed(
                format!("getPool fee tier {}", fee),
                "static reader configured to fail",
            ));
        }
        Ok(self
            .pools
            .get(&(token0, token1, fee))
            .copied()
            .unwrap_or_else(Address::zero))
    }

    async fn get_pool_state(&self, pool: Address) -> PlannerResult<PoolState> {
        self.state_reads.fetch_add(1, Ordering::SeqCst);
        self.states
            .get(&pool)
            .cloned()
            .ok_or_else(|| PlannerError::read_failed(format!("pool {:?}", pool), "no snapshot loaded"))
    }
}
