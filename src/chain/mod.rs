pub mod providers;
pub mod reader;
pub mod uniswap_v3_client;
