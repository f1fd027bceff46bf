//! Plain-text expression rendering.
//!
//! Used for diagnostics only (precision-exhaustion errors carry the
//! offending sub-expression). Output is unambiguous, not pretty: compound
//! arguments are parenthesized unconditionally.

use crate::arena::ExprArena;
use crate::expr::{functions, Constant, ExprNode};
use crate::handle::ExprHandle;

/// Renders an expression to a plain-text string.
#[must_use]
pub fn render(arena: &ExprArena, handle: ExprHandle) -> String {
    let mut out = String::new();
    write_expr(arena, handle, &mut out);
    out
}

fn write_expr(arena: &ExprArena, handle: ExprHandle, out: &mut String) {
    match arena.get(handle) {
        ExprNode::Integer(n) => out.push_str(&n.to_string()),
        ExprNode::Rational(r) => out.push_str(&r.to_string()),
        ExprNode::Constant(Constant::Pi) => out.push_str("pi"),
        ExprNode::Constant(Constant::E) => out.push('e'),
        ExprNode::Constant(Constant::ImaginaryUnit) => out.push('i'),
        ExprNode::Symbol(id) => match arena.symbol_name(*id) {
            Some(name) => out.push_str(name),
            None => out.push_str(&format!("_{id}")),
        },
        ExprNode::Add(args) => write_nary(arena, args, " + ", out),
        ExprNode::Mul(args) => write_nary(arena, args, "*", out),
        ExprNode::Pow { base, exp } => {
            write_child(arena, *base, out);
            out.push('^');
            write_child(arena, *exp, out);
        }
        ExprNode::Neg(arg) => {
            out.push('-');
            write_child(arena, *arg, out);
        }
        ExprNode::Div { num, den } => {
            write_child(arena, *num, out);
            out.push('/');
            write_child(arena, *den, out);
        }
        ExprNode::Function { id, args } => {
            match functions::name(*id) {
                Some(name) => out.push_str(name),
                None => out.push_str(&format!("f{id}")),
            }
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(arena, *arg, out);
            }
            out.push(')');
        }
        ExprNode::Integral {
            integrand,
            var,
            lower,
            upper,
        } => {
            out.push_str("integral(");
            write_expr(arena, *integrand, out);
            out.push_str(", ");
            match arena.symbol_name(*var) {
                Some(name) => out.push_str(name),
                None => out.push_str(&format!("_{var}")),
            }
            out.push_str(" = ");
            write_expr(arena, *lower, out);
            out.push_str("..");
            write_expr(arena, *upper, out);
            out.push(')');
        }
    }
}

fn write_nary(arena: &ExprArena, args: &[ExprHandle], sep: &str, out: &mut String) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        write_child(arena, *arg, out);
    }
}

fn write_child(arena: &ExprArena, handle: ExprHandle, out: &mut String) {
    if arena.get(handle).is_atom() {
        write_expr(arena, handle, out);
    } else {
        out.push('(');
        write_expr(arena, handle, out);
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::functions;

    #[test]
    fn test_render_composite() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let two = arena.integer(2);
        let pow = arena.pow(x, two);
        let sin = arena.func(functions::SIN, smallvec::smallvec![pow]);
        let neg = arena.neg(sin);
        assert_eq!(render(&arena, neg), "-(sin(x^2))");
    }

    #[test]
    fn test_render_sum_and_rational() {
        let mut arena = ExprArena::new();
        let third = arena.rational(1, 3);
        let pi = arena.pi();
        let sum = arena.add(smallvec::smallvec![third, pi]);
        assert_eq!(render(&arena, sum), "1/3 + pi");
    }
}
