// Liquidity <-> token amount conversions for a single price interval.
//
// Liquidity from amounts rounds down, amounts owed for a given liquidity
// (mint side) round up, as the pool does when it pulls tokens.

use std::cmp::min;

use num_bigint::BigInt;
use num_traits::Zero;

use super::{ceil_div, q96};

#[inline]
fn ordered<'a>(a: &'a BigInt, b: &'a BigInt) -> (&'a BigInt, &'a BigInt) {
    if a < b { (a, b) } else { (b, a) }
}

/// Token0 for `liquidity` between two sqrt prices:
///   round_up:  ceil( ceil( (L << 96) * (sb - sa) / sb ) / sa )
///   otherwise: floor( floor( (L << 96) * (sb - sa) / sb ) / sa )
pub fn amount0_delta(
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    liquidity: &BigInt,
    round_up: bool,
) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if liquidity.is_zero() || sa.is_zero() || sa == sb {
        return BigInt::zero();
    }

    let numerator1 = liquidity << 96;
    let numerator2 = sb - sa;

    if round_up {
        let t = ceil_div(&(&numerator1 * &numerator2), sb);
        ceil_div(&t, sa)
    } else {
        ((&numerator1 * &numerator2) / sb) / sa
    }
}

/// Token1 for `liquidity` between two sqrt prices: L * (sb - sa) / Q96.
pub fn amount1_delta(
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    liquidity: &BigInt,
    round_up: bool,
) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if liquidity.is_zero() || sa == sb {
        return BigInt::zero();
    }

    let num = liquidity * (sb - sa);
    if round_up {
        ceil_div(&num, &q96())
    } else {
        num / q96()
    }
}

/// L0 = amount0 * sa * sb / (Q96 * (sb - sa)), rounded down once.
///
/// The periphery library floors `sa * sb / Q96` first, which can lose a few
/// units of liquidity on narrow ranges; a single rounding keeps
/// amount -> liquidity -> amount stable to the unit.
pub fn liquidity_for_amount0(
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    amount0: &BigInt,
) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sa == sb {
        return BigInt::zero();
    }
    (amount0 * sa * sb) / (q96() * (sb - sa))
}

/// L0 the way the position manager computes it: `sa * sb / Q96` is floored
/// before the division by the span, so this never exceeds
/// [`liquidity_for_amount0`].
pub fn minted_liquidity_for_amount0(
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    amount0: &BigInt,
) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sa == sb {
        return BigInt::zero();
    }
    let intermediate = (sa * sb) / q96();
    (amount0 * intermediate) / (sb - sa)
}

/// L1 = amount1 * Q96 / (sb - sa), rounded down.
pub fn liquidity_for_amount1(
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    amount1: &BigInt,
) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sa == sb {
        return BigInt::zero();
    }
    (amount1 * q96()) / (sb - sa)
}

/// Liquidity the position manager mints for desired amounts at `sqrt_price_x96`.
pub fn liquidity_for_amounts(
    sqrt_price_x96: &BigInt,
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    amount0: &BigInt,
    amount1: &BigInt,
) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_price_x96 <= sa {
        minted_liquidity_for_amount0(sa, sb, amount0)
    } else if sqrt_price_x96 < sb {
        min(
            minted_liquidity_for_amount0(sqrt_price_x96, sb, amount0),
            liquidity_for_amount1(sa, sqrt_price_x96, amount1),
        )
    } else {
        liquidity_for_amount1(sa, sb, amount1)
    }
}
