use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use ethers::types::{Address, H256};
use url::Url;

use crate::models::FeeTier;

pub const MAINNET_V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";
pub const MAINNET_POSITION_MANAGER: &str = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88";
pub const V3_POOL_INIT_CODE_HASH: &str = "0xe34f199b19b2b4f47f68442619d555527d244f78a3297ea89325f843f87b8b54";

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: Url,
    pub port: u16,

    // Protocol addresses
    pub factory_address: Address,
    pub position_manager: Address,
    pub pool_init_code_hash: H256,
    /// Auto-detected from the chain id when unset.
    pub multicall_address: Option<Address>,

    // Planning defaults
    pub fee_tiers: Vec<FeeTier>,
    pub default_slippage_bips: u32,
    pub default_deadline_secs: u64,
    pub pool_lookup_concurrency: usize,
}

fn parse<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", name, raw, e))
}

fn parse_fee_tiers(raw: &str) -> Result<Vec<FeeTier>> {
    let mut tiers = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse::<u32>("FEE_TIERS", s).map(FeeTier))
        .collect::<Result<Vec<_>>>()?;
    tiers.sort_unstable();
    tiers.dedup();
    if tiers.is_empty() {
        return Err(anyhow!("FEE_TIERS must list at least one fee tier"));
    }
    Ok(tiers)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load configuration files (secrets first, then public config)
        dotenv::from_filename("secrets.env").ok();
        dotenv::from_filename("config.env").ok();
        dotenv::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; missing optional values
    /// fall back to mainnet defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let rpc_url = lookup("RPC_URL").context("RPC_URL must be set")?;
        let rpc_url = Url::parse(&rpc_url).with_context(|| format!("RPC_URL {:?} is not a valid URL", rpc_url))?;

        let multicall_address = lookup("MULTICALL_ADDRESS")
            .map(|raw| parse::<Address>("MULTICALL_ADDRESS", &raw))
            .transpose()?;

        let config = Config {
            rpc_url,
            port: parse("PORT", &get("PORT", "8000"))?,

            factory_address: parse("UNISWAP_V3_FACTORY", &get("UNISWAP_V3_FACTORY", MAINNET_V3_FACTORY))?,
            position_manager: parse(
                "NONFUNGIBLE_POSITION_MANAGER",
                &get("NONFUNGIBLE_POSITION_MANAGER", MAINNET_POSITION_MANAGER),
            )?,
            pool_init_code_hash: parse("POOL_INIT_CODE_HASH", &get("POOL_INIT_CODE_HASH", V3_POOL_INIT_CODE_HASH))?,
            multicall_address,

            fee_tiers: parse_fee_tiers(&get("FEE_TIERS", "100,500,3000,10000"))?,
            default_slippage_bips: parse("DEFAULT_SLIPPAGE_BIPS", &get("DEFAULT_SLIPPAGE_BIPS", "50"))?,
            default_deadline_secs: parse("DEFAULT_DEADLINE_SECS", &get("DEFAULT_DEADLINE_SECS", "1200"))?,
            pool_lookup_concurrency: parse("POOL_LOOKUP_CONCURRENCY", &get("POOL_LOOKUP_CONCURRENCY", "4"))?,
        };

        if config.default_slippage_bips > 10_000 {
            return Err(anyhow!(
                "DEFAULT_SLIPPAGE_BIPS must be at most 10000, got {}",
                config.default_slippage_bips
            ));
        }
        if config.default_deadline_secs == 0 {
            return Err(anyhow!("DEFAULT_DEADLINE_SECS must be positive"));
        }
        Ok(config)
    }
}
