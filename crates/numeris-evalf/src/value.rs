//! The approximate value passed between evaluators, and the accuracy
//! arithmetic kernel that reasons about it.
//!
//! An [`Approx`] is a complex value split into optional real and imaginary
//! parts, each tagged with the number of certified correct bits. An absent
//! part is an *exact* zero. A present part may also be a *scaled zero*: a
//! tiny power of two with accuracy −1, standing for "too small to resolve
//! at this precision, but order of magnitude known" (produced when
//! summation cancels completely).

use dashu::integer::IBig;
use numeris_core::{display, ExprArena, ExprHandle};
use numeris_float::Mpf;

use crate::error::{EvalError, EvalResult};

/// Accuracy sentinel for "infinitely accurate" (exact values).
pub const ACC_INF: i64 = i64::MAX / 4;

/// Accuracy sentinel for "unknown / untrustworthy".
pub const ACC_NEG_INF: i64 = i64::MIN / 4;

/// An approximate complex value with per-part accuracy bounds.
#[derive(Clone, Debug)]
pub struct Approx {
    /// Real part; `None` is an exact zero.
    pub re: Option<Mpf>,
    /// Imaginary part; `None` is an exact zero.
    pub im: Option<Mpf>,
    /// Certified correct bits in the real part (meaningful when present).
    pub re_acc: i64,
    /// Certified correct bits in the imaginary part.
    pub im_acc: i64,
}

impl Approx {
    /// The exact zero value.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            re: None,
            im: None,
            re_acc: ACC_INF,
            im_acc: ACC_INF,
        }
    }

    /// A purely real value.
    #[must_use]
    pub fn real(value: Mpf, acc: i64) -> Self {
        if value.is_zero() {
            return Self::zero();
        }
        Self {
            re: Some(value),
            im: None,
            re_acc: acc,
            im_acc: ACC_INF,
        }
    }

    /// A purely imaginary value.
    #[must_use]
    pub fn imaginary(value: Mpf, acc: i64) -> Self {
        if value.is_zero() {
            return Self::zero();
        }
        Self {
            re: None,
            im: Some(value),
            re_acc: ACC_INF,
            im_acc: acc,
        }
    }

    /// True if both parts are exactly zero.
    #[must_use]
    pub fn is_exact_zero(&self) -> bool {
        self.re.is_none() && self.im.is_none()
    }

    /// True if the imaginary part is exactly zero.
    #[must_use]
    pub fn is_real(&self) -> bool {
        self.im.is_none()
    }

    /// Negates both parts in place.
    pub fn negate(&mut self) {
        if let Some(re) = &self.re {
            self.re = Some(re.neg());
        }
        if let Some(im) = &self.im {
            self.im = Some(im.neg());
        }
    }
}

/// `⌈log2 |x|⌉` for a present part, the minus-infinity sentinel otherwise.
///
/// Deliberately rounded up: overestimating a magnitude is safe for the
/// error bounds derived from it, underestimating is not.
pub(crate) fn fastlog(x: Option<&Mpf>) -> i64 {
    match x {
        Some(v) if !v.is_zero() => v.mag(),
        _ => ACC_NEG_INF,
    }
}

/// A scaled-zero placeholder: the value `2^mag`, to be tagged with
/// accuracy −1 by the caller.
pub(crate) fn scaled_zero(mag: i64) -> Mpf {
    Mpf::from_man_exp(&IBig::ONE, mag)
}

/// Combined relative accuracy of a complex value: worst-case absolute
/// error over the larger part's magnitude, with the max-norm standing in
/// for the true complex norm (at most half a bit pessimistic).
///
/// Exact zero is infinitely accurate.
#[must_use]
pub fn complex_accuracy(value: &Approx) -> i64 {
    match (&value.re, &value.im) {
        (None, None) => ACC_INF,
        (Some(_), None) => value.re_acc,
        (None, Some(_)) => value.im_acc,
        (Some(re), Some(im)) => {
            let re_size = fastlog(Some(re));
            let im_size = fastlog(Some(im));
            let absolute_error = (re_size - value.re_acc).max(im_size - value.im_acc);
            let relative_error = absolute_error - re_size.max(im_size);
            -relative_error
        }
    }
}

/// Tags raw backend output with accuracies at a common working precision.
///
/// The dominant part gets exactly `prec`; the smaller part loses the
/// magnitude gap. An exactly-zero part stays absent.
///
/// # Panics
///
/// Panics if both parts are zero: a complex zero with unknown accuracy is
/// not representable and signals a logic error upstream.
pub(crate) fn finalize_complex(re: Mpf, im: Mpf, prec: i64) -> Approx {
    assert!(
        !(re.is_zero() && im.is_zero()),
        "complex zero with unknown accuracy"
    );
    if re.is_zero() {
        return Approx::imaginary(im, prec);
    }
    if im.is_zero() {
        return Approx::real(re, prec);
    }
    let size_re = re.mag();
    let size_im = im.mag();
    let (re_acc, im_acc) = if size_re > size_im {
        (prec, prec + (size_im - size_re).min(0))
    } else {
        (prec + (size_re - size_im).min(0), prec)
    };
    Approx {
        re: Some(re),
        im: Some(im),
        re_acc,
        im_acc,
    }
}

/// Replaces negligible parts with exact zero.
///
/// A part is chopped when its magnitude falls below `-prec + 4`, or when
/// it is both low-accuracy and disproportionately small next to the other
/// part: near-zero noise must not be reported as a real result.
pub(crate) fn chop_parts(value: &mut Approx, prec: i64) {
    if let Some(re) = &value.re {
        if re.mag() < -prec + 4 {
            value.re = None;
            value.re_acc = ACC_INF;
        }
    }
    if let Some(im) = &value.im {
        if im.mag() < -prec + 4 {
            value.im = None;
            value.im_acc = ACC_INF;
        }
    }
    if let (Some(re), Some(im)) = (&value.re, &value.im) {
        let delta = re.mag() - im.mag();
        if value.re_acc < 2 && delta - value.re_acc <= -prec + 4 {
            value.re = None;
            value.re_acc = ACC_INF;
        } else if value.im_acc < 2 && -delta - value.im_acc <= -prec + 4 {
            value.im = None;
            value.im_acc = ACC_INF;
        }
    }
}

/// Fails with a precision-exhaustion error if the combined accuracy falls
/// short of the requested target.
pub(crate) fn check_target(
    arena: &ExprArena,
    expr: ExprHandle,
    result: &Approx,
    prec: i64,
) -> EvalResult<()> {
    if complex_accuracy(result) < prec {
        return Err(EvalError::PrecisionExhausted {
            expr: display::render(arena, expr),
        });
    }
    Ok(())
}
