//! Evaluators for trig, logarithm, arctangent, absolute value,
//! real/imaginary-part extraction, and floor/ceiling.

use numeris_core::{display, expr::functions, ExprArena, ExprHandle};
use numeris_float::Mpf;
use numeris_integers::Integer;
use smallvec::smallvec;

use crate::dispatch::evalf;
use crate::error::{EvalError, EvalResult};
use crate::options::EvalOptions;
use crate::value::{check_target, fastlog, Approx, ACC_NEG_INF};

/// Which of the two trig evaluators is wanted.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrigKind {
    Sin,
    Cos,
}

/// Evaluates sin or cos of a real argument.
///
/// The danger zone is an argument near a root of the function: the output
/// shrinks while its absolute error stays put, so relative accuracy
/// collapses. The loop measures the absolute precision actually carried
/// by the input (`xprec - xsize`), subtracts the output's cancellation
/// gap, and re-evaluates the argument wider until the target holds.
pub(crate) fn evalf_trig(
    arena: &mut ExprArena,
    arg: ExprHandle,
    kind: TrigKind,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    // 20 guard bits make a restart unlikely for ordinary arguments
    let mut xprec = prec + 20;
    let mut x = evalf(arena, arg, xprec, options)?;
    if x.im.is_some() {
        return Err(EvalError::NotImplemented {
            what: "trigonometric function of a complex argument".into(),
        });
    }
    let Some(mut xre) = x.re else {
        return Ok(match kind {
            TrigKind::Cos => Approx::real(Mpf::one(), prec),
            TrigKind::Sin => Approx::zero(),
        });
    };
    let xsize = xre.mag();
    // magnitude below one bit: no root is reachable, compute directly
    if xsize < 1 {
        let y = apply_trig(&xre, kind, prec);
        return Ok(Approx::real(y, prec));
    }
    if xsize >= 10 {
        // large arguments need absolute precision for the reduction
        // modulo pi
        xprec = prec + xsize;
        x = evalf(arena, arg, xprec, options)?;
        xre = x.re.unwrap_or_else(Mpf::zero);
    }
    loop {
        let y = apply_trig(&xre, kind, prec);
        // a rounded-to-zero output sits at the working noise floor
        let ysize = if y.is_zero() { -xprec } else { y.mag() };
        let gap = -ysize;
        let accuracy = (xprec - xsize) - gap;
        if accuracy >= prec {
            return Ok(Approx::real(y, prec));
        }
        log::debug!("trig: accuracy {accuracy}, wanted {prec}, gap {gap}");
        if xprec > options.maxprec {
            return Ok(Approx::real(y, accuracy));
        }
        xprec += gap;
        x = evalf(arena, arg, xprec, options)?;
        xre = x.re.unwrap_or_else(Mpf::zero);
    }
}

fn apply_trig(x: &Mpf, kind: TrigKind, prec: i64) -> Mpf {
    match kind {
        TrigKind::Sin => x.sin(prec),
        TrigKind::Cos => x.cos(prec),
    }
}

/// Evaluates the natural logarithm.
pub(crate) fn evalf_log(
    arena: &mut ExprArena,
    expr: ExprHandle,
    arg: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let workprec = prec + 10;
    let x = evalf(arena, arg, workprec, options)?;

    if let Some(xim) = &x.im {
        // log z = log |z| + i arg(z); the magnitude goes back through
        // the evaluator so near-one magnitudes stay adaptive
        let xre = x.re.clone().unwrap_or_else(Mpf::zero);
        let im = Mpf::atan2(xim, &xre, prec);
        let abs_expr = arena.func(functions::ABS, smallvec![arg]);
        let log_abs = arena.func(functions::LN, smallvec![abs_expr]);
        let re_part = evalf(arena, log_abs, prec, options)?;
        return Ok(Approx {
            re: re_part.re,
            im: Some(im),
            re_acc: re_part.re_acc,
            im_acc: prec,
        });
    }

    let Some(xre) = x.re else {
        return Err(EvalError::Undefined {
            what: display::render(arena, expr),
        });
    };
    let negative = xre.is_negative();
    let mut re = xre.abs().ln(prec);
    let size = fastlog(Some(&re));
    if prec - size > workprec {
        // the log all but vanished (or rounded away entirely): the
        // argument is so close to 1 that the evaluated argument itself
        // has lost the digits we need. Evaluate arg - 1 symbolically
        // and log1p it back.
        let neg_one = arena.integer(-1);
        let shifted = arena.add(smallvec![arg, neg_one]);
        let delta = evalf(arena, shifted, prec, options)?;
        let dre = delta.re.clone().unwrap_or_else(Mpf::zero);
        if dre.is_zero() {
            return Ok(Approx::zero());
        }
        let prec2 = workprec - fastlog(Some(&dre));
        re = dre.add(&Mpf::one(), prec2).abs().ln(prec);
    }
    if negative {
        // log(-x) = log x + i pi
        return Ok(Approx {
            re: Some(re),
            im: Some(Mpf::pi(prec)),
            re_acc: prec,
            im_acc: prec,
        });
    }
    if re.is_zero() {
        return Ok(Approx::zero());
    }
    Ok(Approx::real(re, prec))
}

/// Evaluates the arctangent of a real argument.
pub(crate) fn evalf_atan(
    arena: &mut ExprArena,
    arg: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let x = evalf(arena, arg, prec + 5, options)?;
    if x.im.is_some() {
        return Err(EvalError::NotImplemented {
            what: "arctangent of a complex argument".into(),
        });
    }
    match x.re {
        Some(xre) => Ok(Approx::real(xre.atan(prec), prec)),
        None => Ok(Approx::zero()),
    }
}

/// Evaluates the absolute value (complex modulus).
pub(crate) fn get_abs(
    arena: &mut ExprArena,
    arg: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let v = evalf(arena, arg, prec + 2, options)?;
    match (&v.re, &v.im) {
        (Some(re), Some(im)) => {
            let acc = v.re_acc.min(v.im_acc);
            Ok(Approx::real(
                numeris_float::complex::abs(re, im, prec),
                acc,
            ))
        }
        (Some(re), None) => Ok(Approx::real(re.abs(), v.re_acc)),
        (None, Some(im)) => Ok(Approx::real(im.abs(), v.im_acc)),
        (None, None) => Ok(Approx::zero()),
    }
}

/// Which part a `re(..)` / `im(..)` node extracts.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComplexPart {
    Re,
    Im,
}

/// Extracts the real or imaginary part of a value.
///
/// The requested part of a mixed value may be far less accurate than the
/// value as a whole, so this escalates until the part itself is certified
/// or revealed to be negligible.
pub(crate) fn get_complex_part(
    arena: &mut ExprArena,
    arg: ExprHandle,
    part: ComplexPart,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let mut workprec = prec;
    let mut attempt = 0u32;
    loop {
        let v = evalf(arena, arg, workprec, options)?;
        let (value, acc) = match part {
            ComplexPart::Re => (v.re, v.re_acc),
            ComplexPart::Im => (v.im, v.im_acc),
        };
        // a part whose magnitude sits below the target resolution is
        // negligible; escalating further cannot change the answer
        let tiny = value.as_ref().is_some_and(|x| x.mag() < -prec);
        if value.is_none() || acc >= prec || tiny || workprec >= options.maxprec {
            return Ok(match value {
                None => Approx::zero(),
                Some(x) => Approx::real(x, acc),
            });
        }
        workprec += 30i64.max(1i64 << attempt.min(40));
        attempt += 1;
    }
}

/// Rounding direction for integer determination.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntDir {
    /// Greatest integer below: floor.
    Floor,
    /// Least integer above: ceiling.
    Ceiling,
}

impl IntDir {
    fn sign(self) -> i8 {
        match self {
            IntDir::Floor => -1,
            IntDir::Ceiling => 1,
        }
    }
}

/// Evaluates floor or ceiling, applied to each part of a complex value.
///
/// The probe-then-certify structure: a cheap evaluation estimates how far
/// the value sits from the nearest integer; if it might be within
/// rounding distance, re-evaluate wider. The candidate integer is then
/// *certified* by evaluating the exact symbolic residual
/// `part - candidate` and demanding its sign be distinguishable from
/// zero: floor and ceiling must never round the wrong way, so an
/// indistinguishable residual propagates precision exhaustion.
pub(crate) fn get_integer_part(
    arena: &mut ExprArena,
    arg: ExprHandle,
    dir: IntDir,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let policy = options.integer_part;
    let probe = evalf(arena, arg, policy.probe_prec, options)?;
    if probe.is_exact_zero() {
        return Ok(Approx::zero());
    }

    // distance from certainty: magnitude minus certified bits, per part
    let mut gap = ACC_NEG_INF;
    if probe.re.is_some() {
        gap = gap.max(fastlog(probe.re.as_ref()) - probe.re_acc);
    }
    if probe.im.is_some() {
        gap = gap.max(fastlog(probe.im.as_ref()) - probe.im_acc);
    }
    let (value, wprec) = if gap >= -policy.margin {
        let boosted = policy.probe_prec + policy.margin + gap;
        (evalf(arena, arg, boosted, options)?, boosted)
    } else {
        (probe, policy.probe_prec)
    };

    let is_complex = value.im.is_some();
    let re_int = match &value.re {
        Some(x) => {
            let part_expr = if is_complex {
                arena.func(functions::RE, smallvec![arg])
            } else {
                arg
            };
            Some(calc_part(arena, part_expr, x, wprec, dir, options)?)
        }
        None => None,
    };
    let im_int = match &value.im {
        Some(x) => {
            let part_expr = arena.func(functions::IM, smallvec![arg]);
            Some(calc_part(arena, part_expr, x, wprec, dir, options)?)
        }
        None => None,
    };

    // The certified parts are exact integers; report them at the
    // requested precision.
    let to_part = |n: Option<Integer>| n.map(|n| Mpf::from_man_exp(n.as_inner(), 0));
    Ok(Approx {
        re: to_part(re_int).filter(|x| !x.is_zero()),
        im: to_part(im_int).filter(|x| !x.is_zero()),
        re_acc: prec,
        im_acc: prec,
    })
}

/// Determines floor/ceiling of one real part, certifying the direction
/// through the exact residual.
fn calc_part(
    arena: &mut ExprArena,
    part_expr: ExprHandle,
    approx: &Mpf,
    wprec: i64,
    dir: IntDir,
    options: &mut EvalOptions,
) -> EvalResult<Integer> {
    let policy = options.integer_part;
    let mut x = approx.clone();
    let mut is_int = x.exponent() >= 0;
    let mut nint = Integer::from(x.to_ibig_nearest());

    if is_int {
        // The approximation landed exactly on an integer; make sure the
        // evaluation had enough precision to tell the true value apart
        // from it.
        let residual = residual_expr(arena, part_expr, &nint);
        let r = evalf(arena, residual, policy.residual_prec, options)?;
        if r.re.is_none() {
            // the residual is exactly zero: the value is this integer
            return Ok(nint);
        }
        let size = -fastlog(r.re.as_ref()) + 2;
        if size > wprec {
            let v = evalf(arena, part_expr, size, options)?;
            x = v.re.unwrap_or_else(Mpf::zero);
            nint = Integer::from(x.to_ibig_nearest());
            is_int = x.exponent() >= 0;
        }
    }

    if !is_int {
        let residual = residual_expr(arena, part_expr, &nint);
        let r = evalf(arena, residual, policy.residual_prec, options)?;
        check_target(arena, residual, &r, policy.residual_target)?;
        let rre = r.re.unwrap_or_else(Mpf::zero);
        let residual_sign: i8 = if rre.is_zero() {
            0
        } else if rre.is_negative() {
            -1
        } else {
            1
        };
        // nearest-integer rounding needs one directional fixup when the
        // true value lies on the rounded-away side
        if residual_sign == dir.sign() {
            nint = match dir {
                IntDir::Floor => nint - Integer::new(1),
                IntDir::Ceiling => nint + Integer::new(1),
            };
        }
    }
    Ok(nint)
}

/// Interns the exact residual `part_expr - n`.
fn residual_expr(arena: &mut ExprArena, part_expr: ExprHandle, n: &Integer) -> ExprHandle {
    let neg_n = arena.big_integer(-n);
    arena.add(smallvec![part_expr, neg_n])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_dir_sign() {
        assert_eq!(IntDir::Floor.sign(), -1);
        assert_eq!(IntDir::Ceiling.sign(), 1);
    }
}
