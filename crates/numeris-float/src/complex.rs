//! Complex arithmetic over `(Mpf, Mpf)` pairs.
//!
//! The evaluation engine represents complex values as separate real and
//! imaginary parts with independent accuracies, so this module works on
//! part pairs rather than introducing a dedicated complex type.

use crate::mpf::Mpf;

/// Complex addition.
#[must_use]
pub fn add(a: (&Mpf, &Mpf), b: (&Mpf, &Mpf), prec: i64) -> (Mpf, Mpf) {
    (a.0.add(b.0, prec), a.1.add(b.1, prec))
}

/// Complex multiplication: `(a + bi)(c + di)`.
#[must_use]
pub fn mul(a: (&Mpf, &Mpf), b: (&Mpf, &Mpf), prec: i64) -> (Mpf, Mpf) {
    let wp = prec + 10;
    let (re_a, im_a) = a;
    let (re_b, im_b) = b;
    let re = re_a.mul(re_b, wp).sub(&im_a.mul(im_b, wp), prec);
    let im = re_a.mul(im_b, wp).add(&im_a.mul(re_b, wp), prec);
    (re, im)
}

/// Complex absolute value: `sqrt(re^2 + im^2)`.
#[must_use]
pub fn abs(re: &Mpf, im: &Mpf, prec: i64) -> Mpf {
    if im.is_zero() {
        return re.abs().normalized(prec);
    }
    if re.is_zero() {
        return im.abs().normalized(prec);
    }
    let wp = prec + 10;
    re.mul(re, wp).add(&im.mul(im, wp), wp).sqrt(prec)
}

/// Complex reciprocal: `conj(z) / |z|^2`.
#[must_use]
pub fn recip(re: &Mpf, im: &Mpf, prec: i64) -> (Mpf, Mpf) {
    let wp = prec + 10;
    let norm = re.mul(re, wp).add(&im.mul(im, wp), wp);
    (re.div(&norm, prec), im.neg().div(&norm, prec))
}

/// Complex integer power by binary exponentiation.
///
/// Negative exponents go through the reciprocal of the positive power.
#[must_use]
pub fn pow_int(re: &Mpf, im: &Mpf, n: i64, prec: i64) -> (Mpf, Mpf) {
    if n == 0 {
        return (Mpf::one(), Mpf::zero());
    }
    if n < 0 {
        let (pr, pi) = pow_int(re, im, -n, prec + 10);
        return recip(&pr, &pi, prec);
    }
    // squarings double the relative error, so budget a guard bit per
    // exponent bit
    let wp = prec + 10 + (64 - n.leading_zeros() as i64);
    let mut result = (Mpf::one(), Mpf::zero());
    let mut base = (re.clone(), im.clone());
    let mut k = n;
    while k > 0 {
        if k & 1 == 1 {
            result = mul((&result.0, &result.1), (&base.0, &base.1), wp);
        }
        k >>= 1;
        if k > 0 {
            base = mul((&base.0, &base.1), (&base.0, &base.1), wp);
        }
    }
    (result.0.normalized(prec), result.1.normalized(prec))
}

/// Complex exponential: `e^(re + im*i) = e^re (cos im + i sin im)`.
#[must_use]
pub fn exp(re: &Mpf, im: &Mpf, prec: i64) -> (Mpf, Mpf) {
    let wp = prec + 10;
    let magnitude = re.exp(wp);
    let (c, s) = im.cos_sin(wp);
    (magnitude.mul(&c, prec), magnitude.mul(&s, prec))
}

/// Complex base raised to a real power, via the polar form:
/// `z^y = |z|^y (cos(y theta) + i sin(y theta))` with `theta = arg z`.
///
/// # Panics
///
/// Panics if `z` is zero and `y` is not positive.
#[must_use]
pub fn pow_real(re: &Mpf, im: &Mpf, y: &Mpf, prec: i64) -> (Mpf, Mpf) {
    if re.is_zero() && im.is_zero() {
        assert!(!y.is_zero() && !y.is_negative(), "zero base needs a positive exponent");
        return (Mpf::zero(), Mpf::zero());
    }
    let wp = prec + 10 + y.mag().max(0);
    let r = abs(re, im, wp);
    let theta = Mpf::atan2(im, re, wp);
    let magnitude = r.pow(y, wp);
    let angle = y.mul(&theta, wp);
    let (c, s) = angle.cos_sin(wp);
    (magnitude.mul(&c, prec), magnitude.mul(&s, prec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(value: &Mpf, expected: f64) -> bool {
        (value.to_f64() - expected).abs() <= 1e-13 * expected.abs().max(1.0)
    }

    #[test]
    fn test_abs() {
        let three = Mpf::from_i64(3);
        let four = Mpf::from_i64(4);
        assert_eq!(abs(&three, &four, 60), Mpf::from_i64(5));
        assert_eq!(abs(&Mpf::zero(), &four.neg(), 60), four);
    }

    #[test]
    fn test_mul() {
        // (1 + 2i)(3 + 4i) = -5 + 10i
        let (re, im) = mul(
            (&Mpf::one(), &Mpf::from_i64(2)),
            (&Mpf::from_i64(3), &Mpf::from_i64(4)),
            60,
        );
        assert_eq!(re, Mpf::from_i64(-5));
        assert_eq!(im, Mpf::from_i64(10));
    }

    #[test]
    fn test_pow_int_i_cycle() {
        // i^4 = 1
        let (re, im) = pow_int(&Mpf::zero(), &Mpf::one(), 4, 60);
        assert!(close(&re, 1.0));
        assert!(im.is_zero() || im.mag() < -50);
    }

    #[test]
    fn test_pow_int_negative() {
        // (1 + i)^-2 = -i/2
        let (re, im) = pow_int(&Mpf::one(), &Mpf::one(), -2, 60);
        assert!(re.is_zero() || re.mag() < -50);
        assert!(close(&im, -0.5));
    }

    #[test]
    fn test_exp_euler() {
        // e^(i pi) = -1
        let (re, im) = exp(&Mpf::zero(), &Mpf::pi(120), 60);
        assert!(close(&re, -1.0));
        assert!(im.is_zero() || im.mag() < -50);
    }

    #[test]
    fn test_pow_real_sqrt_of_i() {
        // i^(1/2) = (1 + i)/sqrt(2)
        let (re, im) = pow_real(&Mpf::zero(), &Mpf::one(), &Mpf::half(), 60);
        let expected = 0.5f64.sqrt();
        assert!(close(&re, expected));
        assert!(close(&im, expected));
    }

    #[test]
    fn test_recip() {
        let (re, im) = recip(&Mpf::one(), &Mpf::one(), 60);
        assert!(close(&re, 0.5));
        assert!(close(&im, -0.5));
    }
}
