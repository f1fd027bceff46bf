//! Transcendental functions on [`Mpf`].
//!
//! Each function takes a target bit precision, evaluates a fixed-point
//! series at that precision plus guard bits, and rounds the result back.
//! Results carry *relative* accuracy close to the requested precision;
//! arguments whose own magnitude would erode that (huge trig arguments,
//! values near 1 for ln, tiny arguments for atan) get the working
//! precision boosted by the magnitude gap first.

use dashu::base::{BitTest, UnsignedAbs};
use dashu::integer::IBig;

use crate::fixed::{
    from_fixed, ln2_fixed, mul_fixed, pi_fixed, round_div, shr_nearest, sqrt_fixed, to_fixed,
};
use crate::mpf::Mpf;

impl Mpf {
    /// pi rounded to `prec` bits.
    #[must_use]
    pub fn pi(prec: i64) -> Self {
        let wp = prec + 10;
        from_fixed(&pi_fixed(wp), wp, prec)
    }

    /// e rounded to `prec` bits.
    #[must_use]
    pub fn e(prec: i64) -> Self {
        Self::one().exp(prec)
    }

    /// The natural exponential, rounded to `prec` bits.
    #[must_use]
    pub fn exp(&self, prec: i64) -> Self {
        if self.is_zero() {
            return Self::one();
        }
        // Reduce so |r| <= 1/2, evaluate the Taylor series, then square
        // back up. Each squaring doubles the relative error, hence the
        // 2k guard bits.
        let k = (self.mag() + 1).max(0);
        let wp = prec + 2 * k + 24;
        let r = shr_nearest(&to_fixed(self, wp), k);
        let mut sum = (IBig::ONE << (wp as usize)) + &r;
        let mut term = r.clone();
        let mut n = 2i64;
        loop {
            term = mul_fixed(&term, &r, wp) / IBig::from(n);
            if term == IBig::ZERO {
                break;
            }
            sum += &term;
            n += 1;
        }
        let mut man = sum;
        let mut scale = -wp;
        for _ in 0..k {
            man = &man * &man;
            scale *= 2;
            let bits = man.bit_len() as i64;
            if bits > wp + 8 {
                let shift = bits - (wp + 8);
                man = shr_nearest(&man, shift);
                scale += shift;
            }
        }
        Self::from_man_exp(&man, scale).normalized(prec)
    }

    /// The natural logarithm, rounded to `prec` bits.
    ///
    /// # Panics
    ///
    /// Panics if the value is zero or negative.
    #[must_use]
    pub fn ln(&self, prec: i64) -> Self {
        assert!(
            !self.is_zero() && !self.is_negative(),
            "log of a non-positive value"
        );
        // x - 1, exactly: arguments close to 1 force extra working bits
        // to keep the result's relative accuracy.
        let delta = self.sub(&Self::one(), self.bit_count() + 70);
        if delta.is_zero() {
            return Self::zero();
        }
        let boost = (-delta.mag()).max(0);
        let wp = prec + 24 + boost;
        // x = m * 2^e with m in [1, 2)
        let e = self.mag() - 1;
        let mfix = to_fixed(&self.shifted(-e), wp);
        let one_fixed = IBig::ONE << (wp as usize);
        // ln m = 2 atanh((m-1)/(m+1))
        let num = &mfix - &one_fixed;
        let den = &mfix + &one_fixed;
        let y = (num << (wp as usize)) / den;
        let y2 = mul_fixed(&y, &y, wp);
        let mut sum = y.clone();
        let mut term = y;
        let mut n = 3i64;
        loop {
            term = mul_fixed(&term, &y2, wp);
            if term == IBig::ZERO {
                break;
            }
            sum += &term / IBig::from(n);
            n += 2;
        }
        let mut result = &sum + &sum;
        if e != 0 {
            result += IBig::from(e) * ln2_fixed(wp);
        }
        from_fixed(&result, wp, prec)
    }

    /// Sine, rounded to `prec` bits.
    #[must_use]
    pub fn sin(&self, prec: i64) -> Self {
        self.cos_sin(prec).1
    }

    /// Cosine, rounded to `prec` bits.
    #[must_use]
    pub fn cos(&self, prec: i64) -> Self {
        self.cos_sin(prec).0
    }

    /// Computes (cos x, sin x) with one argument reduction.
    ///
    /// Large arguments need *absolute* precision for the reduction modulo
    /// pi/2, tiny arguments need extra bits to keep sin's relative
    /// accuracy; both boosts are `|mag|`.
    #[must_use]
    pub fn cos_sin(&self, prec: i64) -> (Self, Self) {
        if self.is_zero() {
            return (Self::one(), Self::zero());
        }
        if self.mag() < -(prec + 6) {
            // sin x = x, cos x = 1 to well beyond the target precision
            return (Self::one(), self.normalized(prec));
        }
        let wp = prec + 20 + self.mag().abs();
        let xf = to_fixed(self, wp);
        // pi at two extra guard bits, then pi/2 back at scale wp
        let halfpi = shr_nearest(&pi_fixed(wp + 2), 3);
        let n = round_div(&xf, &halfpi);
        let r = &xf - &n * &halfpi;
        let (c, s) = cos_sin_taylor(&r, wp);
        let quadrant = i64::try_from(&n % IBig::from(4)).expect("small remainder").rem_euclid(4);
        let (cq, sq) = match quadrant {
            0 => (c, s),
            1 => (-s, c),
            2 => (-c, -s),
            3 => (s, -c),
            _ => unreachable!(),
        };
        (from_fixed(&cq, wp, prec), from_fixed(&sq, wp, prec))
    }

    /// Inverse tangent, rounded to `prec` bits.
    #[must_use]
    pub fn atan(&self, prec: i64) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        if self.mag() < -(prec / 2 + 6) {
            // atan x = x - x^3/3 + ...; the cubic term is already below
            // the target precision here
            return self.normalized(prec);
        }
        let negate = self.is_negative();
        let x = self.abs();
        let wp = prec + 20 + (-x.mag()).max(0);
        let result_fixed = if x > Self::one() {
            let inv = Self::one().div(&x, wp);
            let inner = atan_taylor(&to_fixed(&inv, wp), wp);
            shr_nearest(&pi_fixed(wp), 1) - inner
        } else {
            atan_taylor(&to_fixed(&x, wp), wp)
        };
        let result = from_fixed(&result_fixed, wp, prec);
        if negate {
            result.neg()
        } else {
            result
        }
    }

    /// Two-argument inverse tangent: the angle of the point `(x, y)`.
    #[must_use]
    pub fn atan2(y: &Self, x: &Self, prec: i64) -> Self {
        if x.is_zero() {
            if y.is_zero() {
                return Self::zero();
            }
            let halfpi = Self::pi(prec + 2).shifted(-1).normalized(prec);
            return if y.is_negative() {
                halfpi.neg()
            } else {
                halfpi
            };
        }
        if !x.is_negative() {
            return y.div(x, prec + 10).atan(prec);
        }
        let base = y.abs().div(&x.abs(), prec + 10).atan(prec + 10);
        let result = Self::pi(prec + 10).sub(&base, prec);
        if y.is_negative() {
            result.neg()
        } else {
            result
        }
    }

    /// Real power `self^y` for a positive base, rounded to `prec` bits.
    ///
    /// # Panics
    ///
    /// Panics if the base is negative, or zero with `y <= 0`.
    #[must_use]
    pub fn pow(&self, y: &Self, prec: i64) -> Self {
        if y.is_zero() {
            return Self::one();
        }
        if self.is_zero() {
            assert!(!y.is_negative(), "zero to a non-positive power");
            return Self::zero();
        }
        assert!(!self.is_negative(), "negative base in real power");
        // x^y = exp(y ln x); exp needs the product accurate in absolute
        // terms, so size the working precision after a first estimate.
        let wp = prec + 16 + y.mag().max(0);
        let product = self.ln(wp).mul(y, wp);
        let wp = wp + product.mag().max(0);
        self.ln(wp).mul(y, wp).exp(prec)
    }
}

/// Simultaneous Taylor evaluation of cos and sin for |r| < 1 (fixed point).
fn cos_sin_taylor(r: &IBig, wp: i64) -> (IBig, IBig) {
    let r2 = mul_fixed(r, r, wp);
    let mut c = IBig::ONE << (wp as usize);
    let mut s = r.clone();
    let mut cterm = IBig::ONE << (wp as usize);
    let mut sterm = r.clone();
    let mut k = 1i64;
    loop {
        cterm = -(mul_fixed(&cterm, &r2, wp) / IBig::from((2 * k - 1) * (2 * k)));
        sterm = -(mul_fixed(&sterm, &r2, wp) / IBig::from((2 * k) * (2 * k + 1)));
        if cterm == IBig::ZERO && sterm == IBig::ZERO {
            break;
        }
        c += &cterm;
        s += &sterm;
        k += 1;
    }
    (c, s)
}

/// Taylor arctangent for t in [0, 1] (fixed point), with four argument
/// halvings so the series gains ~8 bits per term.
fn atan_taylor(t0: &IBig, wp: i64) -> IBig {
    const HALVINGS: usize = 4;
    let one_fixed = IBig::ONE << (wp as usize);
    let mut t = t0.clone();
    for _ in 0..HALVINGS {
        // atan t = 2 atan(t / (1 + sqrt(1 + t^2)))
        let t2 = mul_fixed(&t, &t, wp);
        let den = &one_fixed + sqrt_fixed(&(&one_fixed + &t2), wp);
        t = (t << (wp as usize)) / den;
    }
    let t2 = mul_fixed(&t, &t, wp);
    let mut sum = t.clone();
    let mut term = t;
    let mut n = 3i64;
    let mut negate = true;
    loop {
        term = mul_fixed(&term, &t2, wp);
        if term == IBig::ZERO {
            break;
        }
        let contribution = &term / IBig::from(n);
        if negate {
            sum -= contribution;
        } else {
            sum += contribution;
        }
        n += 2;
        negate = !negate;
    }
    sum << HALVINGS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close_f64(value: &Mpf, expected: f64, tol: f64) {
        let got = value.to_f64();
        assert!(
            (got - expected).abs() <= tol * expected.abs().max(1.0),
            "got {got}, expected {expected}"
        );
    }

    #[test]
    fn test_pi() {
        assert_close_f64(&Mpf::pi(60), std::f64::consts::PI, 1e-15);
    }

    #[test]
    fn test_exp_basic() {
        assert_eq!(Mpf::zero().exp(60), Mpf::one());
        assert_close_f64(&Mpf::one().exp(60), std::f64::consts::E, 1e-15);
        assert_close_f64(&Mpf::from_i64(-5).exp(60), (-5f64).exp(), 1e-14);
        assert_close_f64(&Mpf::from_i64(30).exp(60), 30f64.exp(), 1e-13);
    }

    #[test]
    fn test_ln_basic() {
        assert_eq!(Mpf::one().ln(60), Mpf::zero());
        assert_close_f64(&Mpf::from_i64(2).ln(60), std::f64::consts::LN_2, 1e-15);
        assert_close_f64(&Mpf::from_i64(1000).ln(60), 1000f64.ln(), 1e-15);
        assert_close_f64(&Mpf::half().ln(60), -std::f64::consts::LN_2, 1e-15);
    }

    #[test]
    fn test_ln_exp_roundtrip() {
        let x = Mpf::from_ratio(&IBig::from(7), &IBig::from(3), 140);
        let back = x.exp(130).ln(120);
        let err = back.sub(&x, 120).abs();
        assert!(err.is_zero() || err.mag() < -100);
    }

    #[test]
    fn test_ln_near_one_keeps_relative_accuracy() {
        // x = 1 + 2^-40; ln x = 2^-40 - 2^-81 + ...
        let x = Mpf::one().add(&Mpf::one().shifted(-40), 200);
        let l = x.ln(80);
        let expected = Mpf::one().shifted(-40).sub(&Mpf::one().shifted(-81), 120);
        let err = l.sub(&expected, 120).abs();
        assert!(err.is_zero() || err.mag() < -40 - 75);
    }

    #[test]
    fn test_sin_cos_basic() {
        assert_close_f64(&Mpf::one().sin(60), 1f64.sin(), 1e-15);
        assert_close_f64(&Mpf::one().cos(60), 1f64.cos(), 1e-15);
        assert_close_f64(&Mpf::from_i64(-3).sin(60), (-3f64).sin(), 1e-14);
        assert_close_f64(&Mpf::from_i64(100).cos(60), 100f64.cos(), 1e-13);
    }

    #[test]
    fn test_sin_near_pi_is_tiny() {
        // sin(pi_approx) = pi - pi_approx up to O(eps^3): must come out
        // around 2^-150, not zero and not noise
        let pi = Mpf::pi(150);
        let s = pi.sin(60);
        assert!(!s.is_zero());
        assert!(s.mag() <= -140);
    }

    #[test]
    fn test_pythagorean_identity() {
        let x = Mpf::from_ratio(&IBig::from(5), &IBig::from(7), 120);
        let (c, s) = x.cos_sin(110);
        let sum = c.mul(&c, 120).add(&s.mul(&s, 120), 120);
        let err = sum.sub(&Mpf::one(), 120).abs();
        assert!(err.is_zero() || err.mag() < -100);
    }

    #[test]
    fn test_atan() {
        assert_close_f64(&Mpf::one().atan(60), std::f64::consts::FRAC_PI_4, 1e-15);
        assert_close_f64(&Mpf::from_i64(10).atan(60), 10f64.atan(), 1e-15);
        assert_close_f64(&Mpf::from_i64(-2).atan(60), (-2f64).atan(), 1e-15);
        // atan(1) * 4 == pi to high precision
        let quad = Mpf::one().atan(200);
        let four = Mpf::from_i64(4);
        let err = quad.mul(&four, 200).sub(&Mpf::pi(200), 200).abs();
        assert!(err.is_zero() || err.mag() < -190);
    }

    #[test]
    fn test_atan_tiny_argument() {
        let x = Mpf::one().shifted(-200);
        assert_eq!(x.atan(60), x);
    }

    #[test]
    fn test_atan2_quadrants() {
        let one = Mpf::one();
        let neg = one.neg();
        assert_close_f64(&Mpf::atan2(&one, &one, 60), std::f64::consts::FRAC_PI_4, 1e-15);
        assert_close_f64(
            &Mpf::atan2(&one, &neg, 60),
            3.0 * std::f64::consts::FRAC_PI_4,
            1e-15,
        );
        assert_close_f64(
            &Mpf::atan2(&neg, &neg, 60),
            -3.0 * std::f64::consts::FRAC_PI_4,
            1e-15,
        );
        assert_close_f64(&Mpf::atan2(&one, &Mpf::zero(), 60), std::f64::consts::FRAC_PI_2, 1e-15);
        assert_close_f64(&Mpf::atan2(&Mpf::zero(), &neg, 60), std::f64::consts::PI, 1e-15);
    }

    #[test]
    fn test_pow_real() {
        let two = Mpf::from_i64(2);
        assert_close_f64(&two.pow(&Mpf::half(), 60), std::f64::consts::SQRT_2, 1e-15);
        let sqrt2_direct = two.sqrt(90);
        let sqrt2_pow = two.pow(&Mpf::half(), 90);
        let err = sqrt2_pow.sub(&sqrt2_direct, 90).abs();
        assert!(err.is_zero() || err.mag() < -80);
    }

    #[test]
    fn test_e() {
        assert_close_f64(&Mpf::e(60), std::f64::consts::E, 1e-15);
    }
}
