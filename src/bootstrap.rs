use std::sync::Arc;

use anyhow::{Context, Result};
use ethers::prelude::*;

use crate::chain::{providers, uniswap_v3_client::UniswapV3Reader};
use crate::config::Config;
use crate::engine::planner::PositionPlanner;
use crate::engine::resolver::PoolResolver;
use crate::models::FeeTier;

pub type LivePlanner = PositionPlanner<UniswapV3Reader<Provider<Http>>>;

pub struct AppState {
    pub provider: Arc<Provider<Http>>,
    pub planner: LivePlanner,

    // Protocol addresses
    pub factory_address: Address,
    pub position_manager: Address,
    pub pool_init_code_hash: H256,

    // Request defaults
    pub fee_tiers: Vec<FeeTier>,
    pub default_slippage_bips: u32,
    pub default_deadline_secs: u64,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let provider = providers::create_provider(config.rpc_url.as_str())
            .with_context(|| format!("failed to create provider for {}", config.rpc_url))?;

        let reader = UniswapV3Reader::new(provider.clone(), config.factory_address, config.multicall_address);
        let resolver = PoolResolver::new(reader).with_concurrency(config.pool_lookup_concurrency);

        log::info!(
            "planner ready: factory {:?}, fee tiers {:?}, lookup concurrency {}",
            config.factory_address,
            config.fee_tiers,
            config.pool_lookup_concurrency
        );

        Ok(AppState {
            provider,
            planner: PositionPlanner::new(resolver),
            factory_address: config.factory_address,
            position_manager: config.position_manager,
            pool_init_code_hash: config.pool_init_code_hash,
            fee_tiers: config.fee_tiers.clone(),
            default_slippage_bips: config.default_slippage_bips,
            default_deadline_secs: config.default_deadline_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_mirrors_config() {
        let config = Config::from_lookup(|name| match name {
            "RPC_URL" => Some("http://127.0.0.1:8545".to_string()),
            "FEE_TIERS" => Some("500,3000".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::new(&config).unwrap();
        assert_eq!(state.fee_tiers, vec![FeeTier::LOW, FeeTier::MEDIUM]);
        assert_eq!(state.factory_address, config.factory_address);
        assert_eq!(
            state.planner.resolver().reader().factory_address(),
            config.factory_address
        );
    }
}
