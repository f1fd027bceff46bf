//! The central evaluation dispatcher.
//!
//! [`evalf`] matches on the node kind and hands off to the specialized
//! evaluator. Kinds without one lower to a composite that has: division
//! becomes multiplication by an inverse power, `tan` becomes `sin/cos`,
//! `exp` and `sqrt` become powers, `log10` a quotient of logarithms. The
//! lowered nodes are interned in the arena, so repeated evaluation pays
//! the rewrite once.

use numeris_core::{display, functions, Constant, ExprArena, ExprHandle, ExprNode, SymbolId};
use numeris_float::Mpf;
use smallvec::smallvec;

use crate::arith::{evalf_add, evalf_mul, evalf_pow};
use crate::error::{EvalError, EvalResult};
use crate::functions::{
    evalf_atan, evalf_log, evalf_trig, get_abs, get_complex_part, get_integer_part, ComplexPart,
    IntDir, TrigKind,
};
use crate::integral::evalf_integral;
use crate::options::{Binding, EvalOptions};
use crate::value::{chop_parts, check_target, Approx, ACC_INF};

/// Evaluates an expression to roughly `prec` accurate bits.
///
/// The returned approximation carries its own certified accuracy, which
/// can fall short of `prec` when the max-precision ceiling is reached.
/// In strict mode a shortfall is an error instead.
///
/// # Errors
///
/// Returns an error for unbound symbols, mathematically undefined
/// operations, unsupported complex cases, and (in strict mode) results
/// whose certified accuracy misses the target.
pub fn evalf(
    arena: &mut ExprArena,
    expr: ExprHandle,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let node = arena.get(expr).clone();
    let mut result = match node {
        ExprNode::Integer(n) => {
            let exact = Mpf::from_man_exp(n.as_inner(), 0);
            let rounded = exact.normalized(prec);
            let acc = if rounded == exact { ACC_INF } else { prec };
            Approx::real(rounded, acc)
        }
        ExprNode::Rational(r) => Approx::real(Mpf::from_rational(&r, prec), prec),
        ExprNode::Constant(Constant::Pi) => Approx::real(Mpf::pi(prec), prec),
        ExprNode::Constant(Constant::E) => Approx::real(Mpf::e(prec), prec),
        ExprNode::Constant(Constant::ImaginaryUnit) => Approx::imaginary(Mpf::one(), ACC_INF),
        ExprNode::Symbol(id) => evalf_symbol(arena, id, prec, options)?,
        ExprNode::Add(args) => evalf_add(arena, &args, prec, options)?,
        ExprNode::Mul(args) => evalf_mul(arena, &args, prec, options)?,
        ExprNode::Pow { base, exp } => evalf_pow(arena, base, exp, prec, options)?,
        ExprNode::Neg(inner) => {
            let mut v = evalf(arena, inner, prec, options)?;
            v.negate();
            v
        }
        ExprNode::Div { num, den } => {
            let neg_one = arena.integer(-1);
            let inverse = arena.pow(den, neg_one);
            let lowered = arena.mul(smallvec![num, inverse]);
            evalf(arena, lowered, prec, options)?
        }
        ExprNode::Function { id, args } => {
            evalf_function(arena, expr, id, &args, prec, options)?
        }
        ExprNode::Integral { .. } => evalf_integral(arena, expr, prec, options)?,
    };

    if options.verbose {
        log::debug!(
            "{} @ {prec} bits: re_acc {} im_acc {}",
            display::render(arena, expr),
            result.re_acc,
            result.im_acc
        );
    }
    if options.chop {
        chop_parts(&mut result, prec);
    }
    if options.strict {
        check_target(arena, expr, &result, prec)?;
    }
    Ok(result)
}

/// Evaluates a function application, lowering kinds without a dedicated
/// evaluator.
fn evalf_function(
    arena: &mut ExprArena,
    expr: ExprHandle,
    id: numeris_core::FunctionId,
    args: &[ExprHandle],
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let &[x] = args else {
        return Err(EvalError::NotImplemented {
            what: format!(
                "{}-argument call of {}",
                args.len(),
                functions::name(id).unwrap_or("unknown function")
            ),
        });
    };
    match id {
        functions::SIN => evalf_trig(arena, x, TrigKind::Sin, prec, options),
        functions::COS => evalf_trig(arena, x, TrigKind::Cos, prec, options),
        functions::TAN => {
            // tan x = sin x * (cos x)^-1
            let sin = arena.func(functions::SIN, smallvec![x]);
            let cos = arena.func(functions::COS, smallvec![x]);
            let neg_one = arena.integer(-1);
            let sec = arena.pow(cos, neg_one);
            let lowered = arena.mul(smallvec![sin, sec]);
            evalf(arena, lowered, prec, options)
        }
        functions::EXP => {
            let e = arena.e();
            let lowered = arena.pow(e, x);
            evalf(arena, lowered, prec, options)
        }
        functions::LN => evalf_log(arena, expr, x, prec, options),
        functions::LOG10 => {
            // log10 x = ln x * (ln 10)^-1
            let ln_x = arena.func(functions::LN, smallvec![x]);
            let ten = arena.integer(10);
            let ln_ten = arena.func(functions::LN, smallvec![ten]);
            let neg_one = arena.integer(-1);
            let inv = arena.pow(ln_ten, neg_one);
            let lowered = arena.mul(smallvec![ln_x, inv]);
            evalf(arena, lowered, prec, options)
        }
        functions::SQRT => {
            let half = arena.rational(1, 2);
            let lowered = arena.pow(x, half);
            evalf(arena, lowered, prec, options)
        }
        functions::ABS => get_abs(arena, x, prec, options),
        functions::ATAN => evalf_atan(arena, x, prec, options),
        functions::RE => get_complex_part(arena, x, ComplexPart::Re, prec, options),
        functions::IM => get_complex_part(arena, x, ComplexPart::Im, prec, options),
        functions::FLOOR => get_integer_part(arena, x, IntDir::Floor, prec, options),
        functions::CEILING => get_integer_part(arena, x, IntDir::Ceiling, prec, options),
        _ => Err(EvalError::NotImplemented {
            what: functions::name(id)
                .unwrap_or("unknown function")
                .to_string(),
        }),
    }
}

/// Resolves a symbol through the substitution bindings.
///
/// Float bindings are used directly and never memoized, so callers that
/// rebind a symbol per evaluation (the quadrature sampler does) need no
/// cache invalidation. Expression bindings are evaluated once and
/// memoized; the cached value is reused only when it was computed at
/// this precision or higher.
fn evalf_symbol(
    arena: &mut ExprArena,
    id: SymbolId,
    prec: i64,
    options: &mut EvalOptions,
) -> EvalResult<Approx> {
    let binding = match options.substitutions.get(&id) {
        Some(b) => b.clone(),
        None => {
            let name = arena
                .symbol_name(id)
                .unwrap_or("<unknown symbol>")
                .to_string();
            return Err(EvalError::UnboundSymbol { name });
        }
    };
    match binding {
        Binding::Float(v) => {
            if v.is_zero() {
                return Ok(Approx::zero());
            }
            Ok(Approx::real(v.normalized(prec), prec))
        }
        Binding::Expr(bound) => {
            if let Some((cached_prec, cached)) = options.cache.get(&id) {
                if *cached_prec >= prec {
                    return Ok(cached.clone());
                }
            }
            let v = evalf(arena, bound, prec, options)?;
            options.cache.insert(id, (prec, v.clone()));
            Ok(v)
        }
    }
}
