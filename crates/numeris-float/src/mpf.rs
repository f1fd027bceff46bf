//! The arbitrary-precision binary float type.
//!
//! An [`Mpf`] represents `(-1)^sign * man * 2^exp` with an unsigned
//! mantissa and a cached mantissa bit length. Zero is the canonical
//! quadruple `(false, 0, 0, 0)`.
//!
//! `exp + bc` is a deliberately-rounded-up estimate of `log2 |x|` (the
//! true magnitude satisfies `2^(exp+bc-1) <= |x| < 2^(exp+bc)`), which the
//! evaluation engine uses as its cheap interval-arithmetic-friendly size
//! proxy: overestimating a magnitude is safe, underestimating is not.

use dashu::base::{BitTest, Signed, UnsignedAbs};
use dashu::integer::{IBig, UBig};
use numeris_integers::{Integer, Rational};
use std::cmp::Ordering;
use std::fmt;

/// An arbitrary-precision binary floating-point number.
#[derive(Clone)]
pub struct Mpf {
    sign: bool,
    man: UBig,
    exp: i64,
    bc: i64,
}

/// Shifts a magnitude right by `shift` bits, rounding to nearest-even.
pub(crate) fn round_shift(mag: &UBig, shift: i64) -> UBig {
    if shift <= 0 {
        return mag.clone() << ((-shift) as usize);
    }
    let shift = shift as usize;
    let q = mag.clone() >> shift;
    let rem = mag.clone() - (q.clone() << shift);
    let half = UBig::ONE << (shift - 1);
    match rem.cmp(&half) {
        Ordering::Greater => q + UBig::ONE,
        Ordering::Equal => {
            if q.bit(0) {
                q + UBig::ONE
            } else {
                q
            }
        }
        Ordering::Less => q,
    }
}

impl Mpf {
    fn from_sign_mag(sign: bool, man: UBig, exp: i64) -> Self {
        if man == UBig::ZERO {
            return Self::zero();
        }
        let bc = man.bit_len() as i64;
        Self {
            sign,
            man,
            exp,
            bc,
        }
    }

    /// The exact zero.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            sign: false,
            man: UBig::ZERO,
            exp: 0,
            bc: 0,
        }
    }

    /// The exact value 1.
    #[must_use]
    pub fn one() -> Self {
        Self::from_sign_mag(false, UBig::ONE, 0)
    }

    /// The exact value -1.
    #[must_use]
    pub fn neg_one() -> Self {
        Self::from_sign_mag(true, UBig::ONE, 0)
    }

    /// The exact value 1/2.
    #[must_use]
    pub fn half() -> Self {
        Self::from_sign_mag(false, UBig::ONE, -1)
    }

    /// Creates an exact float from a signed mantissa and exponent.
    #[must_use]
    pub fn from_man_exp(man: &IBig, exp: i64) -> Self {
        Self::from_sign_mag(man.is_negative(), man.clone().unsigned_abs(), exp)
    }

    /// Creates an exact float from an i64.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self::from_man_exp(&IBig::from(value), 0)
    }

    /// Creates a float from an exact integer, rounded to `prec` bits.
    #[must_use]
    pub fn from_integer(value: &Integer, prec: i64) -> Self {
        Self::from_man_exp(value.as_inner(), 0).normalized(prec)
    }

    /// Creates a float from an exact rational, rounded to `prec` bits.
    #[must_use]
    pub fn from_rational(value: &Rational, prec: i64) -> Self {
        Self::from_ratio(
            value.numerator().as_inner(),
            value.denominator().as_inner(),
            prec,
        )
    }

    /// Creates a float approximating `num / den`, rounded to `prec` bits.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    #[must_use]
    pub fn from_ratio(num: &IBig, den: &IBig, prec: i64) -> Self {
        assert!(*den != IBig::ZERO, "division by zero");
        if *num == IBig::ZERO {
            return Self::zero();
        }
        let sign = num.is_negative() != den.is_negative();
        let num_mag = num.clone().unsigned_abs();
        let den_mag = den.clone().unsigned_abs();
        // Widen the numerator so the raw quotient carries guard bits
        // beyond the target precision before rounding.
        let shift =
            (prec + 8 + den_mag.bit_len() as i64 - num_mag.bit_len() as i64).max(0) as usize;
        let q = (num_mag << shift) / den_mag;
        Self::from_sign_mag(sign, q, -(shift as i64)).normalized(prec)
    }

    /// Rounds to `prec` mantissa bits (round to nearest, ties to even).
    #[must_use]
    pub fn normalized(&self, prec: i64) -> Self {
        let prec = prec.max(1);
        if self.bc <= prec {
            return self.clone();
        }
        let shift = self.bc - prec;
        let man = round_shift(&self.man, shift);
        Self::from_sign_mag(self.sign, man, self.exp + shift)
    }

    /// Returns true if this is an exact zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.man == UBig::ZERO
    }

    /// Returns true if strictly negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.sign && !self.is_zero()
    }

    /// Returns the binary exponent.
    #[must_use]
    pub fn exponent(&self) -> i64 {
        self.exp
    }

    /// Returns the mantissa bit length (0 for zero).
    #[must_use]
    pub fn bit_count(&self) -> i64 {
        self.bc
    }

    /// Returns `exp + bc`, the rounded-up `log2 |x|` estimate.
    ///
    /// Meaningless for zero; callers are expected to map zero to their own
    /// minus-infinity sentinel first.
    #[must_use]
    pub fn mag(&self) -> i64 {
        self.exp + self.bc
    }

    /// Returns the mantissa with its sign applied.
    #[must_use]
    pub fn signed_mantissa(&self) -> IBig {
        let m = IBig::from(self.man.clone());
        if self.sign {
            -m
        } else {
            m
        }
    }

    /// Returns the negation.
    #[must_use]
    pub fn neg(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        Self {
            sign: !self.sign,
            man: self.man.clone(),
            exp: self.exp,
            bc: self.bc,
        }
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            sign: false,
            man: self.man.clone(),
            exp: self.exp,
            bc: self.bc,
        }
    }

    /// Returns this value scaled by `2^k` (exact).
    #[must_use]
    pub fn shifted(&self, k: i64) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        Self {
            sign: self.sign,
            man: self.man.clone(),
            exp: self.exp + k,
            bc: self.bc,
        }
    }

    /// Adds two floats, rounding the result to `prec` bits.
    #[must_use]
    pub fn add(&self, rhs: &Self, prec: i64) -> Self {
        if self.is_zero() {
            return rhs.normalized(prec);
        }
        if rhs.is_zero() {
            return self.normalized(prec);
        }
        let (hi, lo) = if self.exp >= rhs.exp {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let delta = hi.exp - lo.exp;
        // The smaller operand cannot influence the rounded result once it
        // sits entirely below the guard window.
        if delta > prec + lo.bc + 16 && hi.mag() > lo.mag() + prec + 4 {
            return hi.normalized(prec);
        }
        let man = (hi.signed_mantissa() << (delta as usize)) + lo.signed_mantissa();
        Self::from_man_exp(&man, lo.exp).normalized(prec)
    }

    /// Subtracts `rhs`, rounding the result to `prec` bits.
    #[must_use]
    pub fn sub(&self, rhs: &Self, prec: i64) -> Self {
        self.add(&rhs.neg(), prec)
    }

    /// Multiplies two floats, rounding the result to `prec` bits.
    #[must_use]
    pub fn mul(&self, rhs: &Self, prec: i64) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::zero();
        }
        let man = &self.man * &rhs.man;
        Self::from_sign_mag(self.sign != rhs.sign, man, self.exp + rhs.exp).normalized(prec)
    }

    /// Divides by `rhs`, rounding the result to `prec` bits.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is zero.
    #[must_use]
    pub fn div(&self, rhs: &Self, prec: i64) -> Self {
        assert!(!rhs.is_zero(), "division by zero");
        if self.is_zero() {
            return Self::zero();
        }
        let shift = (prec + 8 + rhs.bc - self.bc).max(0) as usize;
        let q = (self.man.clone() << shift) / &rhs.man;
        Self::from_sign_mag(
            self.sign != rhs.sign,
            q,
            self.exp - rhs.exp - shift as i64,
        )
        .normalized(prec)
    }

    /// Raises to an integer power, rounding the result to `prec` bits.
    ///
    /// # Panics
    ///
    /// Panics if the base is zero and `n` is negative.
    #[must_use]
    pub fn pow_int(&self, n: i64, prec: i64) -> Self {
        if n == 0 {
            return Self::one();
        }
        if self.is_zero() {
            assert!(n > 0, "zero to a negative power");
            return Self::zero();
        }
        let wp = prec + 64 - i64::from(n.unsigned_abs().leading_zeros()) + 6;
        let mut result = Self::one();
        let mut base = self.normalized(wp);
        let mut e = n.unsigned_abs();
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(&base, wp);
            }
            e >>= 1;
            if e > 0 {
                base = base.mul(&base, wp);
            }
        }
        if n < 0 {
            Self::one().div(&result, prec)
        } else {
            result.normalized(prec)
        }
    }

    /// Computes the square root, rounding the result to `prec` bits.
    ///
    /// # Panics
    ///
    /// Panics if the value is negative.
    #[must_use]
    pub fn sqrt(&self, prec: i64) -> Self {
        assert!(!self.is_negative(), "square root of a negative value");
        if self.is_zero() {
            return Self::zero();
        }
        // Widen the mantissa to an even-exponent representation with at
        // least 2*(prec+4) bits so the integer square root carries guard
        // bits.
        let mut shift = (2 * (prec + 4) - self.bc).max(0);
        if (self.exp - shift) % 2 != 0 {
            shift += 1;
        }
        let widened = self.man.clone() << (shift as usize);
        let root = crate::fixed::isqrt(&widened);
        Self::from_sign_mag(false, root, (self.exp - shift) / 2).normalized(prec)
    }

    /// Compares two values numerically.
    #[must_use]
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => {
                return if other.sign {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, true) => {
                return if self.sign {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, false) => {}
        }
        match (self.sign, other.sign) {
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            _ => {}
        }
        let mag_order = match self.mag().cmp(&other.mag()) {
            Ordering::Equal => {
                // Same magnitude window: align the mantissas exactly.
                let delta = self.exp - other.exp;
                if delta >= 0 {
                    (self.man.clone() << (delta as usize)).cmp(&other.man)
                } else {
                    self.man.cmp(&(other.man.clone() << ((-delta) as usize)))
                }
            }
            ord => ord,
        };
        if self.sign {
            mag_order.reverse()
        } else {
            mag_order
        }
    }

    /// Rounds to the nearest integer.
    #[must_use]
    pub fn to_ibig_nearest(&self) -> IBig {
        if self.is_zero() {
            return IBig::ZERO;
        }
        let mag = if self.exp >= 0 {
            self.man.clone() << (self.exp as usize)
        } else {
            round_shift(&self.man, -self.exp)
        };
        let m = IBig::from(mag);
        if self.sign {
            -m
        } else {
            m
        }
    }

    /// Converts to the nearest f64 (saturating to infinity/zero).
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let shift = (self.bc - 53).max(0);
        let top = round_shift(&self.man, shift);
        let top: u64 = top.try_into().unwrap_or(u64::MAX);
        let e = (self.exp + shift).clamp(-2000, 2000) as i32;
        let value = (top as f64) * 2f64.powi(e);
        if self.sign {
            -value
        } else {
            value
        }
    }
}

impl PartialEq for Mpf {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_value(other) == Ordering::Equal
    }
}

impl Eq for Mpf {}

impl PartialOrd for Mpf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_value(other))
    }
}

impl Ord for Mpf {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_value(other)
    }
}

impl fmt::Debug for Mpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "Mpf(0)");
        }
        write!(
            f,
            "Mpf({}{} * 2^{})",
            if self.sign { "-" } else { "" },
            self.man,
            self.exp
        )
    }
}

impl fmt::Display for Mpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mpf(v: i64) -> Mpf {
        Mpf::from_i64(v)
    }

    #[test]
    fn test_zero_invariants() {
        let z = Mpf::zero();
        assert!(z.is_zero());
        assert!(!z.is_negative());
        assert_eq!(z.bit_count(), 0);
        assert_eq!(z.neg(), Mpf::zero());
    }

    #[test]
    fn test_mag_is_rounded_up_log2() {
        assert_eq!(mpf(1).mag(), 1);
        assert_eq!(mpf(2).mag(), 2);
        assert_eq!(mpf(3).mag(), 2);
        assert_eq!(mpf(4).mag(), 3);
        assert_eq!(Mpf::half().mag(), 0);
    }

    #[test]
    fn test_add_exact() {
        let a = mpf(5);
        let b = mpf(7);
        assert_eq!(a.add(&b, 53), mpf(12));
        assert_eq!(a.sub(&a, 53), Mpf::zero());
    }

    #[test]
    fn test_add_negligible_operand() {
        let big = mpf(1);
        let tiny = Mpf::one().shifted(-200);
        let sum = big.add(&tiny, 53);
        // Rounded back to 53 bits the tiny term is invisible.
        assert_eq!(sum, mpf(1));
    }

    #[test]
    fn test_mul_div_roundtrip() {
        let a = mpf(3);
        let b = mpf(7);
        let q = a.div(&b, 80);
        let back = q.mul(&b, 60);
        let err = back.sub(&mpf(3), 60).abs();
        assert!(err.is_zero() || err.mag() < -50);
    }

    #[test]
    fn test_pow_int() {
        assert_eq!(mpf(2).pow_int(10, 53), mpf(1024));
        assert_eq!(mpf(2).pow_int(0, 53), Mpf::one());
        let inv = mpf(2).pow_int(-1, 53);
        assert_eq!(inv, Mpf::half());
        assert_eq!(mpf(-3).pow_int(3, 53), mpf(-27));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(mpf(4).sqrt(53), mpf(2));
        let r2 = mpf(2).sqrt(120);
        let back = r2.mul(&r2, 100);
        let err = back.sub(&mpf(2), 100).abs();
        assert!(err.is_zero() || err.mag() < -90);
    }

    #[test]
    fn test_cmp() {
        assert!(mpf(3) > mpf(2));
        assert!(mpf(-3) < mpf(2));
        assert!(mpf(-2) > mpf(-3));
        assert_eq!(mpf(4), Mpf::from_man_exp(&IBig::from(1), 2));
        assert!(Mpf::zero() < mpf(1));
        assert!(Mpf::zero() > mpf(-1));
    }

    #[test]
    fn test_from_ratio() {
        let third = Mpf::from_ratio(&IBig::from(1), &IBig::from(3), 60);
        let three = mpf(3);
        let back = third.mul(&three, 60);
        let err = back.sub(&Mpf::one(), 60).abs();
        assert!(err.is_zero() || err.mag() < -55);
    }

    #[test]
    fn test_to_ibig_nearest() {
        let v = Mpf::from_ratio(&IBig::from(7), &IBig::from(2), 60);
        assert_eq!(v.to_ibig_nearest(), IBig::from(4)); // ties to even
        let v = Mpf::from_ratio(&IBig::from(10), &IBig::from(4), 60);
        assert_eq!(v.to_ibig_nearest(), IBig::from(2)); // 2.5 -> 2
        let v = Mpf::from_ratio(&IBig::from(-7), &IBig::from(3), 60);
        assert_eq!(v.to_ibig_nearest(), IBig::from(-2));
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(mpf(42).to_f64(), 42.0);
        assert_eq!(Mpf::half().to_f64(), 0.5);
        let third = Mpf::from_ratio(&IBig::from(1), &IBig::from(3), 100);
        assert!((third.to_f64() - 1.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_normalized_rounding() {
        // 0b1111 rounded to 3 bits -> 0b1000 * 2^1 = 16
        let v = mpf(15).normalized(3);
        assert_eq!(v, mpf(16));
        // 0b1011 rounded to 3 bits -> ties-to-even on the dropped 1 bit:
        // 0b101|1 -> rem == half, quotient odd -> round up to 0b110
        let v = mpf(11).normalized(3);
        assert_eq!(v, mpf(12));
    }
}
