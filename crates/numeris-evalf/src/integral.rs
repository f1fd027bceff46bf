//! Evaluator for definite integrals.
//!
//! The sampling closure tracks the magnitude of the largest integrand
//! value seen; together with the quadrature rule's own error estimate
//! this bounds the accuracy of the result and drives the retry loop.

use numeris_core::{ExprArena, ExprHandle, ExprNode};
use numeris_float::Mpf;
use numeris_quad::TanhSinh;

use crate::dispatch::evalf;
use crate::error::{EvalError, EvalResult};
use crate::options::{Binding, EvalOptions, MaxPrecScope};
use crate::value::{complex_accuracy, fastlog, scaled_zero, Approx, ACC_NEG_INF};

/// Evaluates a definite integral with the escalate-and-retry loop around
/// [`do_integral`].
pub(crate) fn evalf_integral(
    arena: &mut ExprArena,
    expr: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let policy = options.escalation;
    let maxprec = options.maxprec;
    let mut workprec = prec;
    let mut attempt = 0u32;
    loop {
        let result = do_integral(arena, expr, workprec, options)?;
        let accuracy = complex_accuracy(&result);
        if accuracy >= prec || workprec >= maxprec {
            return Ok(result);
        }
        workprec = (workprec + policy.integral_step(attempt, prec, accuracy)).min(maxprec);
        attempt += 1;
    }
}

/// One quadrature pass at a fixed working precision.
fn do_integral(
    arena: &mut ExprArena,
    expr: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let ExprNode::Integral {
        integrand,
        var,
        lower,
        upper,
    } = arena.get(expr).clone()
    else {
        unreachable!("dispatched on an integral node");
    };

    let mut scope = MaxPrecScope::clamp(options, 2 * prec);
    let xlow = eval_real_bound(arena, lower, prec + 15, &mut scope)?;
    let xhigh = eval_real_bound(arena, upper, prec + 15, &mut scope)?;
    if xlow == xhigh {
        return Ok(Approx::zero());
    }

    let working = prec + 5;
    let saved_binding = scope.substitutions.remove(&var);

    let mut have_re = false;
    let mut have_im = false;
    let mut max_re_term = ACC_NEG_INF;
    let mut max_im_term = ACC_NEG_INF;
    let mut failure: Option<EvalError> = None;

    let quad = {
        let scope = &mut scope;
        let arena = &mut *arena;
        let have_re = &mut have_re;
        let have_im = &mut have_im;
        let max_re_term = &mut max_re_term;
        let max_im_term = &mut max_im_term;
        let failure = &mut failure;
        TanhSinh::new(prec).integrate(
            move |t: &Mpf| {
                if failure.is_some() {
                    return (Mpf::zero(), Mpf::zero());
                }
                scope.substitutions.insert(var, Binding::Float(t.clone()));
                match evalf(arena, integrand, working, scope) {
                    Ok(v) => {
                        *have_re |= v.re.is_some();
                        *have_im |= v.im.is_some();
                        *max_re_term = (*max_re_term).max(fastlog(v.re.as_ref()));
                        *max_im_term = (*max_im_term).max(fastlog(v.im.as_ref()));
                        (
                            v.re.unwrap_or_else(Mpf::zero),
                            v.im.unwrap_or_else(Mpf::zero),
                        )
                    }
                    Err(e) => {
                        *failure = Some(e);
                        (Mpf::zero(), Mpf::zero())
                    }
                }
            },
            &xlow,
            &xhigh,
        )
    };

    match saved_binding {
        Some(b) => {
            scope.substitutions.insert(var, b);
        }
        None => {
            scope.substitutions.remove(&var);
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    let quad_error = if quad.error.is_zero() {
        ACC_NEG_INF
    } else {
        quad.error.mag()
    };
    let (re, re_acc) = tag_part(quad.re, have_re, max_re_term, quad_error, prec);
    let (im, im_acc) = tag_part(quad.im, have_im, max_im_term, quad_error, prec);
    Ok(Approx {
        re,
        im,
        re_acc,
        im_acc,
    })
}

/// Derives the accuracy of one result part from the largest sampled term
/// and the quadrature error estimate.
fn tag_part(
    value: Mpf,
    present: bool,
    max_term: i64,
    quad_error: i64,
    prec: i64,
) -> (Option<Mpf>, i64) {
    if !present {
        return (None, ACC_NEG_INF);
    }
    if value.is_zero() {
        // cancelled to nothing: order of magnitude bounded by the worst
        // term and the quadrature error
        let mag = (-prec).min(-max_term).min(-quad_error);
        return (Some(scaled_zero(mag)), -1);
    }
    let size = value.mag();
    // worst sampled term bounds the summation error relative to the
    // working precision; the rule's own estimate bounds the rest
    let acc = -(max_term - size - prec).max(quad_error);
    (Some(value), acc)
}

/// Evaluates an integration bound, which must be finite and real.
fn eval_real_bound(
    arena: &mut ExprArena,
    bound: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Mpf> {
    let v = evalf(arena, bound, prec, options)?;
    if v.im.is_some() {
        return Err(EvalError::NotImplemented {
            what: "complex integration bound".into(),
        });
    }
    Ok(v.re.unwrap_or_else(Mpf::zero))
}

#[cfg(test)]
mod tests {
    use super::*;
    use numeris_core::functions;
    use smallvec::smallvec;

    fn assert_close(value: &Approx, expected: &Mpf, bits: i64) {
        let re = value.re.clone().unwrap_or_else(Mpf::zero);
        let diff = re.sub(expected, 120).abs();
        assert!(
            diff.is_zero() || diff.mag() < expected.mag() - bits,
            "got {re:?}, expected {expected:?}"
        );
    }

    #[test]
    fn test_integral_of_x_squared() {
        let mut arena = ExprArena::new();
        let var = arena.intern_symbol("x");
        let x = arena.symbol("x");
        let two = arena.integer(2);
        let body = arena.pow(x, two);
        let zero = arena.integer(0);
        let one = arena.integer(1);
        let integral = arena.integral(body, var, zero, one);
        let mut options = EvalOptions::new();
        let v = evalf_integral(&mut arena, integral, 53, &mut options).unwrap();
        let third = Mpf::from_rational(&numeris_integers::Rational::from_i64(1, 3), 80);
        assert_close(&v, &third, 48);
        assert!(v.re_acc >= 53);
    }

    #[test]
    fn test_integral_of_sine_arch() {
        let mut arena = ExprArena::new();
        let var = arena.intern_symbol("t");
        let t = arena.symbol("t");
        let body = arena.func(functions::SIN, smallvec![t]);
        let zero = arena.integer(0);
        let pi = arena.pi();
        let integral = arena.integral(body, var, zero, pi);
        let mut options = EvalOptions::new();
        let v = evalf_integral(&mut arena, integral, 53, &mut options).unwrap();
        assert_close(&v, &Mpf::from_i64(2), 48);
    }

    #[test]
    fn test_empty_interval_is_exact_zero() {
        let mut arena = ExprArena::new();
        let var = arena.intern_symbol("x");
        let x = arena.symbol("x");
        let one = arena.integer(1);
        let integral = arena.integral(x, var, one, one);
        let mut options = EvalOptions::new();
        let v = evalf_integral(&mut arena, integral, 53, &mut options).unwrap();
        assert!(v.is_exact_zero());
    }

    #[test]
    fn test_variable_binding_restored_after_integration() {
        let mut arena = ExprArena::new();
        let var = arena.intern_symbol("x");
        let x = arena.symbol("x");
        let zero = arena.integer(0);
        let one = arena.integer(1);
        let integral = arena.integral(x, var, zero, one);
        let mut options = EvalOptions::new();
        options.bind_float(var, Mpf::from_i64(9));
        let v = evalf_integral(&mut arena, integral, 53, &mut options).unwrap();
        assert_close(&v, &Mpf::half(), 48);
        assert!(matches!(
            options.substitutions.get(&var),
            Some(Binding::Float(_))
        ));
    }
}
