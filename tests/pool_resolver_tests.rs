use ethers::types::{Address, H256, U256};
use std::str::FromStr;
use v3_position_planner::chain::reader::StaticPoolReader;
use v3_position_planner::engine::planner::{Deposit, PositionPlanner, PositionRequest};
use v3_position_planner::engine::resolver::PoolResolver;
use v3_position_planner::error::PlannerError;
use v3_position_planner::models::{FeeTier, PoolKey, PoolState, Token};

const FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";
const INIT_CODE_HASH: &str = "0xe34f199b19b2b4f47f68442619d555527d244f78a3297ea89325f843f87b8b54";

fn usdc() -> Token {
    Token::new(
        Address::from_str("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap(),
        6,
        "USDC",
    )
}

fn weth() -> Token {
    Token::new(
        Address::from_str("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").unwrap(),
        18,
        "WETH",
    )
}

/// Reader holding only the 0.3% pool, at its real CREATE2 address.
fn medium_only() -> (StaticPoolReader, Address) {
    let key = PoolKey::new(usdc(), weth(), FeeTier::MEDIUM).unwrap();
    let pool = key.compute_pool_address(
        Address::from_str(FACTORY).unwrap(),
        H256::from_str(INIT_CODE_HASH).unwrap(),
    );
    let state = PoolState::at_tick(196_256, 10u128.pow(19), 60).unwrap();
    let reader = StaticPoolReader::new().with_pool(usdc().address, weth().address, FeeTier::MEDIUM, pool, state);
    (reader, pool)
}

#[tokio::test]
async fn test_only_existing_tier_is_returned() {
    let (reader, pool) = medium_only();
    assert_eq!(pool, Address::from_str("0x8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8").unwrap());

    let resolver = PoolResolver::new(reader);
    let tiers = [FeeTier::LOW, FeeTier::MEDIUM, FeeTier::HIGH];
    let found = resolver.find_all_pools(weth().address, usdc().address, &tiers).await.unwrap();

    println!("pools found: {:?}", found);
    assert_eq!(found, vec![(FeeTier::MEDIUM, pool)]);
    assert_eq!(resolver.reader().address_reads(), 3);
}

#[tokio::test]
async fn test_lookup_is_order_independent() {
    let (reader, pool) = medium_only();
    let resolver = PoolResolver::new(reader);

    let forward = resolver.find_pool(usdc().address, weth().address, FeeTier::MEDIUM).await.unwrap();
    let backward = resolver.find_pool(weth().address, usdc().address, FeeTier::MEDIUM).await.unwrap();
    assert_eq!(forward, pool);
    assert_eq!(forward, backward);

    let all_forward = resolver
        .find_all_pools(usdc().address, weth().address, &[FeeTier::MEDIUM, FeeTier::LOW])
        .await
        .unwrap();
    let all_backward = resolver
        .find_all_pools(weth().address, usdc().address, &[FeeTier::LOW, FeeTier::MEDIUM])
        .await
        .unwrap();
    assert_eq!(all_forward, all_backward);
}

#[tokio::test]
async fn test_missing_tier_is_not_a_read_failure() {
    let (reader, _) = medium_only();
    let resolver = PoolResolver::new(reader);
    let err = resolver.find_pool(usdc().address, weth().address, FeeTier::LOW).await.unwrap_err();
    assert!(matches!(err, PlannerError::NoPoolExists { .. }));
    assert!(!err.is_retryable());

    let (reader, _) = medium_only();
    let flaky = PoolResolver::new(reader.with_failing_tier(FeeTier::HIGH));
    let err = flaky
        .find_all_pools(usdc().address, weth().address, &[FeeTier::MEDIUM, FeeTier::HIGH])
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn test_planner_over_static_reader() {
    let (reader, pool) = medium_only();
    let planner = PositionPlanner::new(PoolResolver::new(reader));
    let request = PositionRequest {
        base: weth(),
        quote: usdc(),
        fee: FeeTier::MEDIUM,
        price_lower: Some(2800.0),
        price_upper: Some(3600.0),
        deposit: Deposit::Single {
            token: usdc().address,
            amount: U256::from(5_000_000_000u64),
        },
        slippage_bips: 100,
        recipient: Address::repeat_byte(0x42),
        deadline_secs: 900,
    };

    let plan = tokio_test::block_on(planner.plan_at(&request, 1_000)).unwrap();
    println!("plan: {}", serde_json::to_string_pretty(&plan).unwrap());

    assert_eq!(plan.pool, pool);
    assert_eq!(plan.mint.token0, usdc().address);
    assert_eq!(plan.mint.amount0_desired, U256::from(5_000_000_000u64));
    assert_eq!(plan.mint.amount0_min, U256::from(4_950_000_000u64));
    assert!(plan.mint.amount1_desired > U256::zero());
    assert_eq!(plan.mint.deadline, 1_900);
    assert_eq!(plan.mint.calldata().len(), 4 + 11 * 32);
}
