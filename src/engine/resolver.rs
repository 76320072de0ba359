// Fee-tier pool discovery for a token pair.

use ethers::types::Address;
use futures::{stream, StreamExt, TryStreamExt};

use crate::chain::reader::PoolStateReader;
use crate::error::{PlannerError, PlannerResult};
use crate::models::{sort_addresses, FeeTier, PoolKey, PoolState, Token};

const DEFAULT_CONCURRENCY: usize = 4;

/// A pool that exists on-chain together with a state read taken just now.
#[derive(Debug, Clone)]
pub struct ResolvedPool {
    pub key: PoolKey,
    pub address: Address,
    pub state: PoolState,
}

pub struct PoolResolver<R> {
    reader: R,
    concurrency: usize,
}

impl<R: PoolStateReader> PoolResolver<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Caps how many fee-tier lookups are in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    async fn lookup(&self, token0: Address, token1: Address, fee: FeeTier) -> PlannerResult<Option<Address>> {
        let pool = self.reader.get_pool_address(token0, token1, fee).await?;
        if pool == Address::zero() {
            log::debug!("no pool for {:?}/{:?} at fee tier {}", token0, token1, fee);
            Ok(None)
        } else {
            Ok(Some(pool))
        }
    }

    pub async fn find_pool(&self, token_a: Address, token_b: Address, fee: FeeTier) -> PlannerResult<Address> {
        if token_a == token_b {
            return Err(PlannerError::IdenticalTokens(token_a));
        }
        let (token0, token1) = sort_addresses(token_a, token_b);
        self.lookup(token0, token1, fee)
            .await?
            .ok_or(PlannerError::NoPoolExists {
                token0,
                token1,
                fee_tiers: vec![fee],
            })
    }

    /// Every tier that has a pool, ascending by fee.
    ///
    /// All tiers are queried; a missing tier is skipped, a failed read fails
    /// the whole lookup.
    pub async fn find_all_pools(
        &self,
        token_a: Address,
        token_b: Address,
        fee_tiers: &[FeeTier],
    ) -> PlannerResult<Vec<(FeeTier, Address)>> {
        if token_a == token_b {
            return Err(PlannerError::IdenticalTokens(token_a));
        }
        let (token0, token1) = sort_addresses(token_a, token_b);

        let mut tiers = fee_tiers.to_vec();
        tiers.sort_unstable();
        tiers.dedup();

        let found: Vec<(FeeTier, Option<Address>)> = stream::iter(tiers.iter().copied().map(|fee| async move {
            let pool = self.lookup(token0, token1, fee).await?;
            Ok::<_, PlannerError>((fee, pool))
        }))
        .buffer_unordered(self.concurrency)
        .try_collect()
        .await?;

        let mut pools: Vec<(FeeTier, Address)> = found
            .into_iter()
            .filter_map(|(fee, pool)| pool.map(|p| (fee, p)))
            .collect();
        pools.sort_unstable_by_key(|(fee, _)| *fee);

        if pools.is_empty() {
            log::warn!("no pool for {:?}/{:?} in any of {:?}", token0, token1, tiers);
            return Err(PlannerError::NoPoolExists {
                token0,
                token1,
                fee_tiers: tiers,
            });
        }
        Ok(pools)
    }

    /// Resolve the pool for `fee` and read its state right away.
    pub async fn load_pool(&self, token_a: &Token, token_b: &Token, fee: FeeTier) -> PlannerResult<ResolvedPool> {
        let key = PoolKey::new(token_a.clone(), token_b.clone(), fee)?;
        let address = self.find_pool(key.token0.address, key.token1.address, fee).await?;
        let state = self.reader.get_pool_state(address).await?;
        log::debug!(
            "loaded {}/{} fee {} at {:?}: tick {}, spacing {}",
            key.token0.symbol,
            key.token1.symbol,
            fee,
            address,
            state.tick,
            state.tick_spacing
        );
        Ok(ResolvedPool { key, address, state })
    }
}
