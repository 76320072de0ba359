// NonfungiblePositionManager.mint argument assembly.

use chrono::{DateTime, Utc};
use ethers::abi::{self, Token as AbiToken};
use ethers::types::{Address, Bytes, I256, U256};
use ethers::utils::id;

use crate::engine::slippage::Minimums;
use crate::error::{PlannerError, PlannerResult};
use crate::models::{MintParams, PoolKey, Position, TickRange};

pub const MINT_SIGNATURE: &str =
    "mint((address,address,uint24,int24,int24,uint256,uint256,uint256,uint256,address,uint256))";

/// Put a labeled pair into the key's order, or fail if the labels are not the
/// key's tokens.
fn canonical(key: &PoolKey, labels: (Address, Address), amounts: (U256, U256)) -> PlannerResult<(U256, U256)> {
    let expected = (key.token0.address, key.token1.address);
    if labels == expected {
        Ok(amounts)
    } else if labels == (expected.1, expected.0) {
        Ok((amounts.1, amounts.0))
    } else {
        Err(PlannerError::TokenMismatch {
            position: labels,
            expected,
        })
    }
}

fn invalid_deadline(offset_secs: u64, reason: &str) -> PlannerError {
    PlannerError::InvalidDeadline {
        offset_secs,
        reason: reason.to_string(),
    }
}

/// Unix seconds at `at`. A clock before the epoch cannot anchor a deadline.
pub(crate) fn unix_seconds(at: DateTime<Utc>, deadline_offset_secs: u64) -> PlannerResult<u64> {
    u64::try_from(at.timestamp())
        .map_err(|_| invalid_deadline(deadline_offset_secs, "clock is before the unix epoch"))
}

/// Same as [`build`] with the clock supplied by the caller.
pub fn build_at(
    key: &PoolKey,
    range: &TickRange,
    position: &Position,
    minimums: &Minimums,
    recipient: Address,
    deadline_offset_secs: u64,
    now: u64,
) -> PlannerResult<MintParams> {
    if deadline_offset_secs == 0 {
        return Err(invalid_deadline(deadline_offset_secs, "offset must be positive"));
    }
    let deadline = now
        .checked_add(deadline_offset_secs)
        .ok_or_else(|| invalid_deadline(deadline_offset_secs, "overflows u64"))?;

    let (amount0_desired, amount1_desired) = canonical(
        key,
        (position.token0, position.token1),
        (position.amount0, position.amount1),
    )?;
    let (amount0_min, amount1_min) = canonical(
        key,
        (minimums.token0, minimums.token1),
        (minimums.amount0_min, minimums.amount1_min),
    )?;

    Ok(MintParams {
        token0: key.token0.address,
        token1: key.token1.address,
        fee: key.fee,
        tick_lower: range.tick_lower,
        tick_upper: range.tick_upper,
        amount0_desired,
        amount1_desired,
        amount0_min,
        amount1_min,
        recipient,
        deadline,
    })
}

/// Mint arguments with `deadline = now + deadline_offset_secs`.
pub fn build(
    key: &PoolKey,
    range: &TickRange,
    position: &Position,
    minimums: &Minimums,
    recipient: Address,
    deadline_offset_secs: u64,
) -> PlannerResult<MintParams> {
    let now = unix_seconds(Utc::now(), deadline_offset_secs)?;
    build_at(key, range, position, minimums, recipient, deadline_offset_secs, now)
}

impl MintParams {
    /// ABI-encoded call to `mint`, selector included.
    pub fn calldata(&self) -> Bytes {
        let params = AbiToken::Tuple(vec![
            AbiToken::Address(self.token0),
            AbiToken::Address(self.token1),
            AbiToken::Uint(U256::from(self.fee.fee())),
            AbiToken::Int(I256::from(self.tick_lower).into_raw()),
            AbiToken::Int(I256::from(self.tick_upper).into_raw()),
            AbiToken::Uint(self.amount0_desired),
            AbiToken::Uint(self.amount1_desired),
            AbiToken::Uint(self.amount0_min),
            AbiToken::Uint(self.amount1_min),
            AbiToken::Address(self.recipient),
            AbiToken::Uint(U256::from(self.deadline)),
        ]);
        let mut data = id(MINT_SIGNATURE).to_vec();
        data.extend(abi::encode(&[params]));
        data.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeeTier, Token};
    use chrono::TimeZone;

    fn key() -> PoolKey {
        PoolKey::new(
            Token::new(Address::from([0x0B; 20]), 18, "WETH"),
            Token::new(Address::from([0x0A; 20]), 6, "USDC"),
            FeeTier::MEDIUM,
        )
        .unwrap()
    }

    fn range() -> TickRange {
        TickRange::new(-600, 600, 60).unwrap()
    }

    fn labeled(token0: Address, token1: Address, a: u64, b: u64) -> (Position, Minimums) {
        (
            Position {
                token0,
                token1,
                amount0: U256::from(a),
                amount1: U256::from(b),
                liquidity: 42,
                pulled0: U256::from(a),
                pulled1: U256::from(b),
            },
            Minimums {
                token0,
                token1,
                amount0_min: U256::from(a - 1),
                amount1_min: U256::from(b - 1),
            },
        )
    }

    #[test]
    fn canonical_labels_pass_through() {
        let k = key();
        let (p, m) = labeled(k.token0.address, k.token1.address, 100, 200);
        let params = build_at(&k, &range(), &p, &m, Address::from([0x0C; 20]), 1200, 1_700_000_000).unwrap();
        assert_eq!(params.token0, Address::from([0x0A; 20]));
        assert_eq!((params.amount0_desired, params.amount1_desired), (U256::from(100), U256::from(200)));
        assert_eq!((params.amount0_min, params.amount1_min), (U256::from(99), U256::from(199)));
        assert_eq!(params.deadline, 1_700_001_200);
        assert_eq!(params.fee, FeeTier::MEDIUM);
    }

    #[test]
    fn reversed_labels_are_resorted() {
        let k = key();
        let (p, m) = labeled(k.token1.address, k.token0.address, 100, 200);
        let params = build_at(&k, &range(), &p, &m, Address::zero(), 60, 0).unwrap();
        assert_eq!((params.amount0_desired, params.amount1_desired), (U256::from(200), U256::from(100)));
        assert_eq!((params.amount0_min, params.amount1_min), (U256::from(199), U256::from(99)));
    }

    #[test]
    fn foreign_labels_are_rejected() {
        let k = key();
        let (p, m) = labeled(k.token0.address, Address::from([0xEE; 20]), 100, 200);
        let err = build_at(&k, &range(), &p, &m, Address::zero(), 60, 0).unwrap_err();
        assert!(matches!(err, PlannerError::TokenMismatch { .. }));
    }

    #[test]
    fn zero_deadline_offset_is_rejected() {
        let k = key();
        let (p, m) = labeled(k.token0.address, k.token1.address, 100, 200);
        assert!(matches!(
            build(&k, &range(), &p, &m, Address::zero(), 0),
            Err(PlannerError::InvalidDeadline { offset_secs: 0, .. })
        ));
        assert!(matches!(
            build_at(&k, &range(), &p, &m, Address::zero(), 60, u64::MAX),
            Err(PlannerError::InvalidDeadline { offset_secs: 60, .. })
        ));
    }

    #[test]
    fn pre_epoch_clock_is_rejected() {
        let before_epoch = Utc.timestamp_opt(-86_400, 0).unwrap();
        let err = unix_seconds(before_epoch, 600).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidDeadline { offset_secs: 600, .. }));
        assert!(!err.is_retryable());

        let epoch = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(unix_seconds(epoch, 600), Ok(1_700_000_000));
    }

    #[test]
    fn deadline_is_in_the_future() {
        let k = key();
        let (p, m) = labeled(k.token0.address, k.token1.address, 100, 200);
        let before = Utc::now().timestamp() as u64;
        let params = build(&k, &range(), &p, &m, Address::zero(), 300).unwrap();
        assert!(params.deadline >= before + 300);
    }

    #[test]
    fn calldata_layout() {
        let k = key();
        let (p, m) = labeled(k.token0.address, k.token1.address, 100, 200);
        let params = build_at(&k, &range(), &p, &m, Address::from([0x0C; 20]), 60, 1_000).unwrap();
        let data = params.calldata();

        assert_eq!(hex::encode(&data[..4]), "88316456");
        assert_eq!(data.len(), 4 + 11 * 32);
        // int24 -600 sign-extends to a full word
        let lower = &data[4 + 3 * 32..4 + 4 * 32];
        assert!(lower[..30].iter().all(|b| *b == 0xff));
        assert_eq!(&lower[30..], &[0xfd, 0xa8]);
        // deadline is the last word
        assert_eq!(U256::from_big_endian(&data[data.len() - 32..]), U256::from(1_060u64));
    }
}
