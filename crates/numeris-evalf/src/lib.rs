//! Adaptive-precision numeric evaluation of expression trees.
//!
//! The engine approximates an expression to a requested number of decimal
//! digits and certifies how many bits of the answer are trustworthy.
//! Evaluators track accuracy through every operation; when cancellation
//! or ill conditioning eats into the target, the working precision is
//! escalated and the offending subtree re-evaluated, up to a configurable
//! ceiling. Results that still miss the target are returned with their
//! honest (lower) certified accuracy, or rejected in strict mode.
//!
//! The top-level entry point is [`evaluate`]; [`evalf`] is the recursive
//! engine underneath it, exposed for callers that want to work in bits
//! and drive the options themselves.

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod arith;
mod dispatch;
mod error;
mod functions;
mod integral;
mod options;
mod policy;
mod sum;
mod value;

mod proptests;

pub use dispatch::evalf;
pub use error::{EvalError, EvalResult};
pub use numeris_float::dps_to_prec;
pub use options::{Binding, EvalOptions, DEFAULT_MAXPREC};
pub use policy::{EscalationPolicy, IntegerPartPolicy};
pub use value::{complex_accuracy, Approx, ACC_INF, ACC_NEG_INF};

use numeris_core::{ExprArena, ExprHandle};
use numeris_float::Mpf;

/// Default digit count for callers with no particular target: slightly
/// beyond what an `f64` can hold.
pub const DEFAULT_DIGITS: u32 = 15;

/// A finished evaluation: each present part carries the value and the
/// number of leading bits certified accurate.
///
/// An absent part is exactly zero. Both parts absent means the value is
/// exactly zero.
#[derive(Clone, Debug)]
pub struct CertifiedValue {
    /// Real part with its certified accuracy in bits.
    pub re: Option<(Mpf, i64)>,
    /// Imaginary part with its certified accuracy in bits.
    pub im: Option<(Mpf, i64)>,
}

impl CertifiedValue {
    /// Returns true if the value is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.re.is_none() && self.im.is_none()
    }

    /// Returns true if the value has no imaginary part.
    #[must_use]
    pub fn is_real(&self) -> bool {
        self.im.is_none()
    }

    /// The real part, if present.
    #[must_use]
    pub fn real(&self) -> Option<&Mpf> {
        self.re.as_ref().map(|(v, _)| v)
    }

    /// The imaginary part, if present.
    #[must_use]
    pub fn imag(&self) -> Option<&Mpf> {
        self.im.as_ref().map(|(v, _)| v)
    }
}

/// Evaluates `expr` to `digits` decimal digits.
///
/// The returned parts are rounded to their certified accuracy, which is
/// capped at the requested precision. A part whose accuracy could not be
/// established at all and whose magnitude is below the target resolution
/// is reported as exactly zero; strict mode turns that case (and every
/// other accuracy shortfall) into [`EvalError::PrecisionExhausted`].
///
/// # Errors
///
/// Returns an error for unbound symbols, undefined operations (log of
/// zero, zero to a negative power), unsupported complex cases, and, in
/// strict mode, unreachable accuracy targets.
pub fn evaluate(
    arena: &mut ExprArena,
    expr: ExprHandle,
    digits: u32,
    options: &mut EvalOptions,
) -> EvalResult<CertifiedValue> {
    let prec = dps_to_prec(digits);
    options.maxprec = options.maxprec.max(prec);
    options.cache.clear();
    let v = evalf(arena, expr, prec + 4, options)?;
    Ok(CertifiedValue {
        re: wrap_part(v.re, v.re_acc, prec),
        im: wrap_part(v.im, v.im_acc, prec),
    })
}

/// Rounds one result part to its certified accuracy.
///
/// A scaled zero that survived to the top level has no certified bits;
/// its magnitude bound says the true value is below the target
/// resolution, so it collapses to exact zero here.
fn wrap_part(value: Option<Mpf>, acc: i64, prec: i64) -> Option<(Mpf, i64)> {
    let value = value?;
    if acc < 1 && value.mag() < -prec {
        return None;
    }
    let p = acc.min(prec).max(1);
    Some((value.normalized(p), p))
}
