// Exact integer math for Uniswap V3 style positions.
//
// Everything here works on BigInt so intermediate products (Q64.96 * Q64.96,
// amounts scaled by 10^decimals) never overflow. Conversion to fixed-width
// chain types happens only at the edges via the helpers below.

pub mod liquidity_amounts;
pub mod tick_math;

use ethers::types::U256;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};

pub const RESOLUTION: u32 = 96;

#[inline]
pub fn q96() -> BigInt {
    BigInt::one() << RESOLUTION
}

#[inline]
pub fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u8).pow(exp)
}

/// ceil(a / b) for a >= 0, b > 0.
#[inline]
pub fn ceil_div(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() {
        return BigInt::zero();
    }
    (a + (b - BigInt::one())) / b
}

pub fn u256_to_bigint(u: U256) -> BigInt {
    let mut buf = [0u8; 32];
    u.to_big_endian(&mut buf);
    BigInt::from_bytes_be(Sign::Plus, &buf)
}

/// `None` when the value is negative or wider than 256 bits.
pub fn bigint_to_u256(v: &BigInt) -> Option<U256> {
    if v.sign() == Sign::Minus || v.bits() > 256 {
        return None;
    }
    let (_, bytes) = v.to_bytes_be();
    Some(U256::from_big_endian(&bytes))
}

/// `None` when the value is negative or wider than 128 bits.
pub fn bigint_to_u128(v: &BigInt) -> Option<u128> {
    if v.sign() == Sign::Minus || v.bits() > 128 {
        return None;
    }
    let (_, digits) = v.to_u64_digits();
    Some(
        digits
            .iter()
            .rev()
            .fold(0u128, |acc, d| (acc << 64) | u128::from(*d)),
    )
}

/// Lossy num/den -> f64 for display. Keeps both operands inside f64 range.
pub fn ratio_to_f64(num: &BigInt, den: &BigInt) -> f64 {
    use num_traits::ToPrimitive;
    if den.is_zero() {
        return f64::INFINITY;
    }
    let excess = num.bits().max(den.bits()).saturating_sub(960);
    let (n, d) = (num >> excess, den >> excess);
    match (n.to_f64(), d.to_f64()) {
        (Some(n), Some(d)) if d != 0.0 => n / d,
        (Some(_), _) => f64::INFINITY,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_to_bigint() {
        assert_eq!(u256_to_bigint(U256::zero()), BigInt::from(0));
        assert_eq!(u256_to_bigint(U256::one()), BigInt::from(1));
        assert_eq!(
            u256_to_bigint(U256::from(u128::MAX)),
            BigInt::from(u128::MAX)
        );
        let sqrt_price = U256::from_dec_str("1461446703485210103287273052203988822378723970342").unwrap();
        assert_eq!(
            u256_to_bigint(sqrt_price).to_string(),
            "1461446703485210103287273052203988822378723970342"
        );
    }

    #[test]
    fn test_bigint_to_fixed_width() {
        assert_eq!(bigint_to_u256(&BigInt::from(-1)), None);
        assert_eq!(bigint_to_u256(&(BigInt::one() << 256)), None);
        assert_eq!(
            bigint_to_u256(&((BigInt::one() << 256) - 1)),
            Some(U256::MAX)
        );
        assert_eq!(bigint_to_u128(&BigInt::from(u128::MAX)), Some(u128::MAX));
        assert_eq!(bigint_to_u128(&(BigInt::from(u128::MAX) + 1)), None);
        assert_eq!(bigint_to_u128(&BigInt::zero()), Some(0));
        assert_eq!(bigint_to_u128(&BigInt::from(1u128 << 70)), Some(1u128 << 70));
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(&BigInt::from(0), &BigInt::from(7)), BigInt::from(0));
        assert_eq!(ceil_div(&BigInt::from(14), &BigInt::from(7)), BigInt::from(2));
        assert_eq!(ceil_div(&BigInt::from(15), &BigInt::from(7)), BigInt::from(3));
    }

    #[test]
    fn test_ratio_to_f64_handles_wide_operands() {
        let big = pow10(400);
        let r = ratio_to_f64(&(&big * 3), &big);
        assert!((r - 3.0).abs() < 1e-12);
        assert_eq!(ratio_to_f64(&BigInt::from(1), &BigInt::zero()), f64::INFINITY);
    }
}
