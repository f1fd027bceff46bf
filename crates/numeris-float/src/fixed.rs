//! Fixed-point big-integer helpers.
//!
//! The transcendental functions evaluate their series over `IBig` values
//! scaled by `2^wp` for a working precision `wp`. Series truncation and
//! the per-term integer divisions each contribute at most one ulp of
//! error, so callers carry guard bits sized to the term count.

use dashu::base::{BitTest, Signed, UnsignedAbs};
use dashu::integer::{IBig, UBig};
use parking_lot::Mutex;

use crate::mpf::{round_shift, Mpf};

/// Shifts a signed value right, rounding the magnitude to nearest.
pub(crate) fn shr_nearest(x: &IBig, shift: i64) -> IBig {
    if shift <= 0 {
        return x.clone() << ((-shift) as usize);
    }
    let mag = round_shift(&x.clone().unsigned_abs(), shift);
    let m = IBig::from(mag);
    if x.is_negative() {
        -m
    } else {
        m
    }
}

/// Converts a float to fixed-point at scale `2^wp`.
pub(crate) fn to_fixed(x: &Mpf, wp: i64) -> IBig {
    if x.is_zero() {
        return IBig::ZERO;
    }
    let shift = wp + x.exponent();
    if shift >= 0 {
        x.signed_mantissa() << (shift as usize)
    } else {
        shr_nearest(&x.signed_mantissa(), -shift)
    }
}

/// Converts a fixed-point value back to a float rounded to `prec` bits.
pub(crate) fn from_fixed(fx: &IBig, wp: i64, prec: i64) -> Mpf {
    Mpf::from_man_exp(fx, -wp).normalized(prec)
}

/// Fixed-point product: `(a * b) / 2^wp`.
pub(crate) fn mul_fixed(a: &IBig, b: &IBig, wp: i64) -> IBig {
    shr_nearest(&(a * b), wp)
}

/// Integer square root (floor).
pub(crate) fn isqrt(n: &UBig) -> UBig {
    if *n == UBig::ZERO {
        return UBig::ZERO;
    }
    let mut x = UBig::ONE << (n.bit_len() / 2 + 1);
    loop {
        let y = (&x + n / &x) >> 1usize;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Square root of a non-negative fixed-point value, staying at scale `2^wp`.
///
/// # Panics
///
/// Panics if `n` is negative.
pub(crate) fn sqrt_fixed(n: &IBig, wp: i64) -> IBig {
    assert!(!n.is_negative(), "sqrt of negative fixed-point value");
    let widened = n.clone().unsigned_abs() << (wp as usize);
    IBig::from(isqrt(&widened))
}

/// Nearest-integer division for a positive divisor (ties away from zero).
pub(crate) fn round_div(a: &IBig, b: &IBig) -> IBig {
    debug_assert!(!b.is_negative() && *b != IBig::ZERO);
    let q = a / b;
    let r = a - &q * b;
    let d = &r + &r;
    let neg_b = -b.clone();
    if d >= *b {
        q + IBig::ONE
    } else if d <= neg_b {
        q - IBig::ONE
    } else {
        q
    }
}

/// Gregory series for `arctan(1/k)` in fixed point, k >= 2.
fn atan_inv(k: i64, wp: i64) -> IBig {
    let k2 = IBig::from(k * k);
    let mut term = (IBig::ONE << (wp as usize)) / IBig::from(k);
    let mut sum = IBig::ZERO;
    let mut n = 1i64;
    let mut negate = false;
    while term != IBig::ZERO {
        let contribution = &term / IBig::from(n);
        if negate {
            sum -= contribution;
        } else {
            sum += contribution;
        }
        term = &term / &k2;
        n += 2;
        negate = !negate;
    }
    sum
}

// Constant caches hold the highest precision computed so far; lower
// precisions are served by rounding down.
static PI_CACHE: Mutex<(i64, IBig)> = Mutex::new((0, IBig::ZERO));
static LN2_CACHE: Mutex<(i64, IBig)> = Mutex::new((0, IBig::ZERO));

/// pi in fixed point at scale `2^wp` (Machin's formula).
pub(crate) fn pi_fixed(wp: i64) -> IBig {
    {
        let cache = PI_CACHE.lock();
        if cache.0 >= wp {
            return shr_nearest(&cache.1, cache.0 - wp);
        }
    }
    let wp2 = wp + 32;
    // pi = 16 atan(1/5) - 4 atan(1/239)
    let a = atan_inv(5, wp2);
    let b = atan_inv(239, wp2);
    let pi = (a << 4usize) - (b << 2usize);
    let mut cache = PI_CACHE.lock();
    if cache.0 < wp2 {
        *cache = (wp2, pi.clone());
    }
    shr_nearest(&pi, 32)
}

/// ln 2 in fixed point at scale `2^wp` (`2 atanh(1/3)`).
pub(crate) fn ln2_fixed(wp: i64) -> IBig {
    {
        let cache = LN2_CACHE.lock();
        if cache.0 >= wp {
            return shr_nearest(&cache.1, cache.0 - wp);
        }
    }
    let wp2 = wp + 32;
    let nine = IBig::from(9);
    let mut term = (IBig::ONE << (wp2 as usize)) / IBig::from(3);
    let mut sum = IBig::ZERO;
    let mut n = 1i64;
    while term != IBig::ZERO {
        sum += &term / IBig::from(n);
        term = &term / &nine;
        n += 2;
    }
    let ln2 = &sum + &sum;
    let mut cache = LN2_CACHE.lock();
    if cache.0 < wp2 {
        *cache = (wp2, ln2.clone());
    }
    shr_nearest(&ln2, 32)
}
