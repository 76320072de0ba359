use anyhow::{Context, Result};
use ethers::prelude::*;
use std::sync::Arc;

/// A malformed URL is a configuration error, not a failed read.
pub fn create_provider(rpc_url: &str) -> Result<Arc<Provider<Http>>> {
    let provider = Provider::<Http>::try_from(rpc_url).with_context(|| format!("invalid RPC URL {:?}", rpc_url))?;
    Ok(Arc::new(provider))
}
