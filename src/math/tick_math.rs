// Tick <-> sqrt-price conversion on the protocol's 1.0001^tick grid.

use num_bigint::BigInt;
use num_traits::One;

use crate::error::{PlannerError, PlannerResult};
use crate::models::Rounding;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// Q128.128 multipliers for bits 1..=19 of |tick|, i.e. 1/sqrt(1.0001)^(2^i).
const BIT_MULTIPLIERS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

fn check_tick(tick: i32) -> PlannerResult<()> {
    if (MIN_TICK..=MAX_TICK).contains(&tick) {
        Ok(())
    } else {
        Err(PlannerError::InvalidRange {
            tick_lower: tick,
            tick_upper: tick,
            reason: format!("tick outside [{}, {}]", MIN_TICK, MAX_TICK),
        })
    }
}

fn sqrt_ratio_unchecked(tick: i32) -> BigInt {
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        BigInt::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        BigInt::one() << 128
    };
    for (bit, multiplier) in BIT_MULTIPLIERS {
        if abs_tick & bit != 0 {
            ratio = (&ratio * BigInt::from(multiplier)) >> 128;
        }
    }

    if tick > 0 {
        let max = (BigInt::one() << 256) - 1;
        ratio = max / ratio;
    }
    // Q128.128 -> Q64.96, rounding up
    (&ratio + ((BigInt::one() << 32) - 1)) >> 32
}

/// Exact `TickMath.getSqrtRatioAtTick` as a Q64.96 integer.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> PlannerResult<BigInt> {
    check_tick(tick)?;
    Ok(sqrt_ratio_unchecked(tick))
}

pub fn min_sqrt_ratio() -> BigInt {
    sqrt_ratio_unchecked(MIN_TICK)
}

pub fn max_sqrt_ratio() -> BigInt {
    sqrt_ratio_unchecked(MAX_TICK)
}

/// Greatest tick whose sqrt ratio is <= `sqrt_price_x96`.
///
/// Inputs below the minimum ratio map to `MIN_TICK`, inputs at or above the
/// maximum ratio map to `MAX_TICK`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: &BigInt) -> i32 {
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        let mid = lo + ((hi - lo + 1) / 2);
        if sqrt_ratio_unchecked(mid) <= *sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Lowest tick usable as a position bound for `tick_spacing`.
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    -(MAX_TICK / tick_spacing) * tick_spacing
}

/// Highest tick usable as a position bound for `tick_spacing`.
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

/// Snap `tick` onto the spacing grid, then clamp into the usable bounds.
pub fn align_to_spacing(tick: i32, tick_spacing: i32, rounding: Rounding) -> PlannerResult<i32> {
    if tick_spacing <= 0 {
        return Err(PlannerError::InvalidTickSpacing(tick_spacing));
    }
    let floor = tick.div_euclid(tick_spacing) * tick_spacing;
    let aligned = match rounding {
        Rounding::Down => floor,
        Rounding::Up if floor == tick => floor,
        Rounding::Up => floor + tick_spacing,
        Rounding::Nearest => {
            if (tick - floor) * 2 >= tick_spacing {
                floor + tick_spacing
            } else {
                floor
            }
        }
    };
    Ok(aligned.clamp(min_usable_tick(tick_spacing), max_usable_tick(tick_spacing)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_ratio_matches_protocol_constants() {
        assert_eq!(min_sqrt_ratio(), BigInt::from(4_295_128_739u64));
        assert_eq!(
            max_sqrt_ratio().to_string(),
            "1461446703485210103287273052203988822378723970342"
        );
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), BigInt::one() << 96);
    }

    #[test]
    fn sqrt_ratio_rejects_out_of_range_ticks() {
        assert!(get_sqrt_ratio_at_tick(MIN_TICK - 1).is_err());
        assert!(get_sqrt_ratio_at_tick(MAX_TICK + 1).is_err());
        assert!(get_sqrt_ratio_at_tick(MAX_TICK).is_ok());
    }

    #[test]
    fn sqrt_ratio_is_strictly_increasing() {
        let mut prev = get_sqrt_ratio_at_tick(-1000).unwrap();
        for tick in -999..=1000 {
            let next = get_sqrt_ratio_at_tick(tick).unwrap();
            assert!(next > prev, "tick {}", tick);
            prev = next;
        }
    }

    #[test]
    fn tick_at_sqrt_ratio_inverts_grid_points() {
        for tick in [MIN_TICK, -200_000, -60, -1, 0, 1, 60, 195_000, MAX_TICK - 1] {
            let sqrt = get_sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_ratio(&sqrt), tick);
            assert_eq!(get_tick_at_sqrt_ratio(&(&sqrt + 1)), tick);
            if tick > MIN_TICK {
                assert_eq!(get_tick_at_sqrt_ratio(&(&sqrt - 1)), tick - 1);
            }
        }
    }

    #[test]
    fn tick_at_sqrt_ratio_clamps() {
        assert_eq!(get_tick_at_sqrt_ratio(&BigInt::from(1)), MIN_TICK);
        assert_eq!(get_tick_at_sqrt_ratio(&(max_sqrt_ratio() * 4)), MAX_TICK);
    }

    #[test]
    fn usable_tick_bounds() {
        assert_eq!(min_usable_tick(60), -887_220);
        assert_eq!(max_usable_tick(60), 887_220);
        assert_eq!(max_usable_tick(10), 887_270);
        assert_eq!(max_usable_tick(200), 887_200);
        assert_eq!(min_usable_tick(1), MIN_TICK);
    }

    #[test]
    fn alignment_respects_direction() {
        assert_eq!(align_to_spacing(130, 60, Rounding::Down).unwrap(), 120);
        assert_eq!(align_to_spacing(130, 60, Rounding::Up).unwrap(), 180);
        assert_eq!(align_to_spacing(120, 60, Rounding::Up).unwrap(), 120);
        assert_eq!(align_to_spacing(-130, 60, Rounding::Down).unwrap(), -180);
        assert_eq!(align_to_spacing(-130, 60, Rounding::Up).unwrap(), -120);
        assert_eq!(align_to_spacing(-150, 60, Rounding::Nearest).unwrap(), -120);
        assert_eq!(align_to_spacing(-151, 60, Rounding::Nearest).unwrap(), -180);
        assert_eq!(align_to_spacing(MAX_TICK, 60, Rounding::Up).unwrap(), 887_220);
        assert_eq!(align_to_spacing(MIN_TICK, 60, Rounding::Down).unwrap(), -887_220);
        assert_eq!(
            align_to_spacing(10, 0, Rounding::Down),
            Err(PlannerError::InvalidTickSpacing(0))
        );
    }
}
