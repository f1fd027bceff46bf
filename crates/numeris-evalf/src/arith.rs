//! Evaluators for sums, products, and powers.

use dashu::base::{BitTest, UnsignedAbs};
use dashu::integer::IBig;
use numeris_core::{Constant, ExprArena, ExprHandle, ExprNode};
use numeris_float::{complex, Mpf};

use crate::dispatch::evalf;
use crate::error::{EvalError, EvalResult};
use crate::options::{EvalOptions, MaxPrecScope};
use crate::sum::add_terms;
use crate::value::{complex_accuracy, finalize_complex, Approx, ACC_INF};

/// Evaluates a sum of expressions.
///
/// Summands are evaluated ten guard bits above the working precision and
/// combined part-wise through guarded summation. Cancellation shows up as
/// an accuracy shortfall, answered by re-evaluating everything higher;
/// the subtree ceiling is clamped to twice the current working precision
/// so one cancelling sum cannot blow the precision budget for the whole
/// call.
pub(crate) fn evalf_add(
    arena: &mut ExprArena,
    args: &[ExprHandle],
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let target_prec = prec;
    let mut scope = MaxPrecScope::clamp(options, 2 * prec);
    let policy = scope.escalation;
    let mut working = prec + 10;
    let mut attempt = 0u32;
    loop {
        let mut re_terms = Vec::with_capacity(args.len());
        let mut im_terms = Vec::with_capacity(args.len());
        for &arg in args {
            let term = evalf(arena, arg, working + 10, &mut scope)?;
            if let Some(re) = term.re {
                re_terms.push((re, term.re_acc));
            }
            if let Some(im) = term.im {
                im_terms.push((im, term.im_acc));
            }
        }
        let (re, re_acc) = add_terms(&re_terms, working, target_prec);
        let (im, im_acc) = add_terms(&im_terms, working, target_prec);
        let result = Approx {
            re,
            im,
            re_acc,
            im_acc,
        };
        let acc = complex_accuracy(&result);
        if acc >= target_prec {
            return Ok(result);
        }
        if working - target_prec > scope.maxprec {
            log::debug!("add: wanted {target_prec} accurate bits, got {acc}");
            return Ok(result);
        }
        working += policy.step(attempt, target_prec - acc);
        // the ceiling tracks the escalation so deep cancellations stay
        // resolvable, up to the outer ceiling
        scope.reclamp(2 * working);
        attempt += 1;
    }
}

/// Evaluates a product of expressions.
///
/// Purely real and purely imaginary factors fold into one exact integer
/// product (mantissas multiplied, exponents added) with the sign and the
/// power of `i` tracked in a single phase counter, since `-1 = i^2`.
/// Genuinely complex factors are multiplied in afterwards by explicit
/// cross terms recombined through guarded summation.
pub(crate) fn evalf_mul(
    arena: &mut ExprArena,
    args: &[ExprHandle],
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let target_prec = prec;
    // guard bits: one per factor, multiplication loses at most that
    let working = prec + args.len() as i64 + 5;

    let mut man = IBig::ONE;
    let mut exp = 0i64;
    let mut bc = 1i64;
    let mut phase = 0i64;
    let mut acc = ACC_INF;
    let mut scalar_used = false;
    let mut complex_factors: Vec<Approx> = Vec::new();

    for &arg in args {
        let v = evalf(arena, arg, working, options)?;
        let (w, w_acc) = match (&v.re, &v.im) {
            (Some(_), Some(_)) => {
                acc = acc.min(complex_accuracy(&v));
                complex_factors.push(v);
                continue;
            }
            (Some(re), None) => (re.clone(), v.re_acc),
            (None, Some(im)) => {
                phase += 1;
                (im.clone(), v.im_acc)
            }
            // a zero factor annihilates the product
            (None, None) => return Ok(Approx::zero()),
        };
        if w.is_negative() {
            phase += 2;
        }
        man = man * IBig::from(w.signed_mantissa().unsigned_abs());
        exp += w.exponent();
        bc += w.bit_count();
        if bc > 3 * working {
            // keep the accumulator from growing without bound
            man = man >> (working as usize);
            exp += working;
            bc = man.bit_len() as i64;
        }
        acc = acc.min(w_acc);
        scalar_used = true;
    }

    let scalar = Mpf::from_man_exp(&man, exp).normalized(working);
    let quarter = phase.rem_euclid(4);

    if complex_factors.is_empty() {
        return Ok(match quarter {
            0 => Approx::real(scalar, acc),
            1 => Approx::imaginary(scalar, acc),
            2 => Approx::real(scalar.neg(), acc),
            _ => Approx::imaginary(scalar.neg(), acc),
        });
    }

    // fold the scalar product (sign included, i-rotation deferred) into
    // the complex accumulator
    let negate_scalar = quarter == 2 || quarter == 3;
    let (mut cre, mut cim, start) = if scalar_used || negate_scalar {
        let s = if negate_scalar { scalar.neg() } else { scalar };
        (Some(s), None, 0)
    } else {
        let first = &complex_factors[0];
        (first.re.clone(), first.im.clone(), 1)
    };

    for factor in &complex_factors[start..] {
        let re = cre.clone().unwrap_or_else(Mpf::zero);
        let im = cim.clone().unwrap_or_else(Mpf::zero);
        let wre = factor.re.clone().unwrap_or_else(Mpf::zero);
        let wim = factor.im.clone().unwrap_or_else(Mpf::zero);
        // (a + bi)(c + di) = (ac - bd) + (ad + bc)i
        let a = re.mul(&wre, working);
        let b = im.neg().mul(&wim, working);
        let c = re.mul(&wim, working);
        let d = im.mul(&wre, working);
        (cre, _) = add_terms(&[(a, acc), (b, acc)], working, target_prec);
        (cim, _) = add_terms(&[(c, acc), (d, acc)], working, target_prec);
    }

    if complex_accuracy(&Approx {
        re: cre.clone(),
        im: cim.clone(),
        re_acc: acc,
        im_acc: acc,
    }) < target_prec
    {
        log::debug!("mul: wanted {target_prec} accurate bits, got {acc}");
    }

    // apply the deferred i^phase rotation
    if quarter == 1 || quarter == 3 {
        let rotated_re = cim.map(|v| v.neg());
        let rotated_im = cre;
        return Ok(Approx {
            re: rotated_re,
            im: rotated_im,
            re_acc: acc,
            im_acc: acc,
        });
    }
    Ok(Approx {
        re: cre,
        im: cim,
        re_acc: acc,
        im_acc: acc,
    })
}

/// Evaluates `base^exp`.
pub(crate) fn evalf_pow(
    arena: &mut ExprArena,
    base: ExprHandle,
    exponent: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let target_prec = prec;

    // Integer exponents are fast-pathed without evaluating the exponent
    // as an expression.
    if let ExprNode::Integer(n) = arena.get(exponent) {
        if let Some(p) = n.to_i64() {
            return evalf_pow_int(arena, base, p, target_prec, options);
        }
    }
    // A literal 1/2 means square root.
    if let ExprNode::Rational(r) = arena.get(exponent) {
        if *r == numeris_integers::Rational::from_i64(1, 2) {
            return evalf_sqrt(arena, base, target_prec, options);
        }
    }

    // Evaluate the exponent first to learn its magnitude: exponentiation
    // multiplies relative error by roughly the exponent.
    let mut working = prec + 10;
    let mut y = evalf(arena, exponent, working, options)?;
    if y.is_exact_zero() {
        return Ok(Approx::real(Mpf::one(), target_prec));
    }
    let ysize = match &y.re {
        Some(re) => re.mag(),
        None => 0,
    };
    if ysize > 5 {
        working += ysize;
        y = evalf(arena, exponent, working, options)?;
    }

    let base_is_e = matches!(arena.get(base), ExprNode::Constant(Constant::E));
    if let Some(yim) = &y.im {
        // complex exponent: only the exponential constant has a
        // dedicated path
        if !base_is_e {
            return Err(EvalError::NotImplemented {
                what: "complex exponent with a general base".into(),
            });
        }
        let yre = y.re.clone().unwrap_or_else(Mpf::zero);
        let (re, im) = complex::exp(&yre, yim, working);
        return Ok(finalize_complex(re, im, target_prec));
    }
    let yre = match y.re {
        Some(v) => v,
        None => return Ok(Approx::real(Mpf::one(), target_prec)),
    };
    if base_is_e {
        return Ok(Approx::real(yre.exp(target_prec), target_prec));
    }

    let b = evalf(arena, base, working + 5, options)?;
    if b.is_exact_zero() {
        if yre.is_negative() {
            return Err(EvalError::Undefined {
                what: "zero raised to a negative power".into(),
            });
        }
        return Ok(Approx::zero());
    }
    match (&b.re, &b.im) {
        (_, Some(bim)) => {
            // complex base, real exponent: polar form
            let bre = b.re.clone().unwrap_or_else(Mpf::zero);
            let (re, im) = complex::pow_real(&bre, bim, &yre, target_prec);
            Ok(finalize_complex(re, im, target_prec))
        }
        (Some(bre), None) if bre.is_negative() => {
            // negative real base: rotate through the complex plane
            let (re, im) = complex::pow_real(bre, &Mpf::zero(), &yre, target_prec);
            Ok(finalize_complex(re, im, target_prec))
        }
        (Some(bre), None) => Ok(Approx::real(bre.pow(&yre, target_prec), target_prec)),
        (None, None) => unreachable!("zero base handled above"),
    }
}

/// Integer-exponent power: `base^p` without evaluating `p` numerically.
fn evalf_pow_int(
    arena: &mut ExprArena,
    base: ExprHandle,
    p: i64,
    target_prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    if p == 0 {
        return Ok(Approx::real(Mpf::one(), target_prec));
    }
    // each squaring doubles relative error: boost by log2 |p|
    let working = target_prec + (64 - i64::from(p.unsigned_abs().leading_zeros()));
    let b = evalf(arena, base, working + 5, options)?;
    match (&b.re, &b.im) {
        (Some(re), None) => Ok(Approx::real(re.pow_int(p, target_prec), target_prec)),
        (None, Some(im)) => {
            // (i b)^p = i^p b^p: the 4-cycle of i
            let z = im.pow_int(p, target_prec);
            Ok(match p.rem_euclid(4) {
                0 => Approx::real(z, target_prec),
                1 => Approx::imaginary(z, target_prec),
                2 => Approx::real(z.neg(), target_prec),
                _ => Approx::imaginary(z.neg(), target_prec),
            })
        }
        (Some(re), Some(im)) => {
            // general complex base, full input accuracy assumed
            let (zre, zim) = complex::pow_int(re, im, p, working);
            Ok(finalize_complex(zre, zim, target_prec))
        }
        (None, None) => {
            if p < 0 {
                return Err(EvalError::Undefined {
                    what: "zero raised to a negative power".into(),
                });
            }
            Ok(Approx::zero())
        }
    }
}

/// Square-root special case of the power evaluator.
fn evalf_sqrt(
    arena: &mut ExprArena,
    base: ExprHandle,
    target_prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let b = evalf(arena, base, target_prec + 5, options)?;
    match (&b.re, &b.im) {
        (Some(re), None) if re.is_negative() => {
            // square root of a negative real is purely imaginary
            Ok(Approx::imaginary(re.neg().sqrt(target_prec), target_prec))
        }
        (Some(re), None) => Ok(Approx::real(re.sqrt(target_prec), target_prec)),
        (_, Some(im)) => {
            let re = b.re.clone().unwrap_or_else(Mpf::zero);
            let (zre, zim) = complex::pow_real(&re, im, &Mpf::half(), target_prec);
            Ok(finalize_complex(zre, zim, target_prec))
        }
        (None, None) => Ok(Approx::zero()),
    }
}
