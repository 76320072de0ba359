// Human price <-> tick conversion.
//
// A price is always "quote per one base", in whole-token units. Internally the
// grid is raw token1 per raw token0, so both decimals and the canonical token
// order are folded in before anything touches the sqrt-price domain.

use num_bigint::BigInt;
use num_traits::{Float, One};

use crate::error::{PlannerError, PlannerResult};
use crate::math::tick_math::{
    self, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, max_sqrt_ratio, max_usable_tick, min_sqrt_ratio,
    min_usable_tick, MAX_TICK, MIN_TICK,
};
use crate::math::{pow10, ratio_to_f64};
use crate::models::{Rounding, TickRange, Token};

/// Exact value of a finite, positive f64 as num/den.
fn f64_to_fraction(value: f64) -> (BigInt, BigInt) {
    let (mantissa, exponent, _sign) = Float::integer_decode(value);
    let mantissa = BigInt::from(mantissa);
    if exponent >= 0 {
        (mantissa << exponent as u32, BigInt::one())
    } else {
        (mantissa, BigInt::one() << exponent.unsigned_abs() as u32)
    }
}

fn check_price(price: f64) -> PlannerResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(PlannerError::InvalidPrice { price });
    }
    Ok(())
}

fn base_is_token0(base: &Token, quote: &Token) -> PlannerResult<bool> {
    if base.address == quote.address {
        return Err(PlannerError::IdenticalTokens(base.address));
    }
    Ok(base.address < quote.address)
}

/// Q64.96 sqrt of the raw token1/token0 ratio implied by `price`, rounded down.
/// Not clamped to the protocol's sqrt-ratio bounds.
pub fn price_to_sqrt_ratio(price: f64, base: &Token, quote: &Token) -> PlannerResult<BigInt> {
    check_price(price)?;
    let (num, den) = f64_to_fraction(price);
    let (num, den) = if base_is_token0(base, quote)? {
        (num * pow10(quote.decimals as u32), den * pow10(base.decimals as u32))
    } else {
        (den * pow10(base.decimals as u32), num * pow10(quote.decimals as u32))
    };
    Ok(((num << 192u32) / den).sqrt())
}

/// Tick for `price`, snapped to `tick_spacing` in the `rounding` direction
/// along the tick axis. Prices beyond the tick domain clamp to the usable
/// bounds.
pub fn price_to_tick(
    price: f64,
    base: &Token,
    quote: &Token,
    tick_spacing: i32,
    rounding: Rounding,
) -> PlannerResult<i32> {
    if tick_spacing <= 0 {
        return Err(PlannerError::InvalidTickSpacing(tick_spacing));
    }
    let sqrt = price_to_sqrt_ratio(price, base, quote)?;

    let raw_tick = if sqrt < min_sqrt_ratio() {
        MIN_TICK
    } else if sqrt >= max_sqrt_ratio() {
        MAX_TICK
    } else {
        let floor = get_tick_at_sqrt_ratio(&sqrt);
        let on_grid = get_sqrt_ratio_at_tick(floor)? == sqrt;
        if rounding == Rounding::Up && !on_grid {
            floor + 1
        } else {
            floor
        }
    };
    tick_math::align_to_spacing(raw_tick, tick_spacing, rounding)
}

/// Human price (quote per base) at `tick`. Ticks outside the domain clamp.
/// Lossy by nature; use it for display and checks, not for sizing.
pub fn tick_to_price(tick: i32, base: &Token, quote: &Token) -> PlannerResult<f64> {
    let sqrt = get_sqrt_ratio_at_tick(tick.clamp(MIN_TICK, MAX_TICK))?;
    let ratio_x192 = &sqrt * &sqrt;
    let q192 = BigInt::one() << 192;
    let price = if base_is_token0(base, quote)? {
        ratio_to_f64(
            &(ratio_x192 * pow10(base.decimals as u32)),
            &(q192 * pow10(quote.decimals as u32)),
        )
    } else {
        ratio_to_f64(
            &(q192 * pow10(base.decimals as u32)),
            &(ratio_x192 * pow10(quote.decimals as u32)),
        )
    };
    Ok(price)
}

pub fn align_to_spacing(tick: i32, tick_spacing: i32, rounding: Rounding) -> PlannerResult<i32> {
    tick_math::align_to_spacing(tick, tick_spacing, rounding)
}

pub fn nearest_usable_tick(tick: i32, tick_spacing: i32) -> PlannerResult<i32> {
    tick_math::align_to_spacing(tick, tick_spacing, Rounding::Nearest)
}

/// Widest range the spacing allows.
pub fn full_range(tick_spacing: i32) -> PlannerResult<TickRange> {
    if tick_spacing <= 0 {
        return Err(PlannerError::InvalidTickSpacing(tick_spacing));
    }
    TickRange::new(min_usable_tick(tick_spacing), max_usable_tick(tick_spacing), tick_spacing)
}

/// Tick range covering at least [lower, upper] in quote-per-base prices.
///
/// `None` for `lower` means zero and `None` for `upper` means unbounded; both
/// `None` is the full range.
pub fn range_from_prices(
    lower: Option<f64>,
    upper: Option<f64>,
    base: &Token,
    quote: &Token,
    tick_spacing: i32,
) -> PlannerResult<TickRange> {
    if tick_spacing <= 0 {
        return Err(PlannerError::InvalidTickSpacing(tick_spacing));
    }
    let min_tick = min_usable_tick(tick_spacing);
    let max_tick = max_usable_tick(tick_spacing);

    // Tick grows with price when base is token0; otherwise the axis flips.
    let (tick_lower, tick_upper) = if base_is_token0(base, quote)? {
        let lo = match lower {
            Some(p) => price_to_tick(p, base, quote, tick_spacing, Rounding::Down)?,
            None => min_tick,
        };
        let hi = match upper {
            Some(p) => price_to_tick(p, base, quote, tick_spacing, Rounding::Up)?,
            None => max_tick,
        };
        (lo, hi)
    } else {
        let lo = match upper {
            Some(p) => price_to_tick(p, base, quote, tick_spacing, Rounding::Down)?,
            None => min_tick,
        };
        let hi = match lower {
            Some(p) => price_to_tick(p, base, quote, tick_spacing, Rounding::Up)?,
            None => max_tick,
        };
        (lo, hi)
    };

    if let (Some(lo), Some(hi)) = (lower, upper) {
        if lo >= hi {
            return Err(PlannerError::InvalidRange {
                tick_lower,
                tick_upper,
                reason: format!("lower price {} is not below upper price {}", lo, hi),
            });
        }
    }
    TickRange::new(tick_lower, tick_upper, tick_spacing)
}
