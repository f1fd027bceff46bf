//! # numeris-float
//!
//! Arbitrary-precision binary floating-point arithmetic for Numeris.
//!
//! The central type is [`Mpf`]: a sign / mantissa / exponent / bit-length
//! quadruple over `dashu` big integers, the currency the evaluation engine
//! passes between its operators. Every operation takes a target bit
//! precision and rounds to nearest.
//!
//! Beyond ring arithmetic this crate provides the transcendental functions
//! the engine orchestrates (exp, ln, sin, cos, atan, atan2, real powers),
//! process-wide caches for the fixed-point constants pi and ln 2, and a
//! small complex-arithmetic layer over `(Mpf, Mpf)` pairs.
//!
//! The engine reasons about *accuracy* (certified correct bits) separately
//! from *precision* (working mantissa width); this crate only ever deals in
//! precision and leaves the accuracy bookkeeping to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod complex;
mod fixed;
pub mod mpf;
mod proptests;
mod transcendental;

pub use mpf::Mpf;

/// log2(10), used for decimal-digit <-> bit conversions.
pub const LOG2_10: f64 = std::f64::consts::LOG2_10;

/// Converts a number of decimal digits to a bit precision.
///
/// One extra digit of slack is included, matching the convention of the
/// engine's entry point: `n` requested digits become roughly
/// `(n + 1) * log2(10)` bits.
#[must_use]
pub fn dps_to_prec(digits: u32) -> i64 {
    let bits = ((f64::from(digits) + 1.0) * LOG2_10).round() as i64;
    bits.max(1)
}

/// Converts a bit precision to the number of decimal digits it certifies.
#[must_use]
pub fn prec_to_dps(prec: i64) -> i64 {
    let digits = (prec as f64 / LOG2_10 - 1.0).round() as i64;
    digits.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dps_prec_roundtrip() {
        for digits in [1u32, 5, 15, 50, 100] {
            let prec = dps_to_prec(digits);
            assert!(prec >= i64::from(digits) * 3);
            assert!(prec_to_dps(prec) >= i64::from(digits) - 1);
        }
    }

    #[test]
    fn test_default_digit_target() {
        // 15 digits needs a 53-bit double and then some
        assert!(dps_to_prec(15) > 52);
    }
}
