//! Expression node types.
//!
//! This module defines the node kinds the evaluation engine dispatches on.
//! The set is closed: every kind either has a specialized evaluator or
//! lowers to a composite of kinds that do.

use num_traits::{One, Zero};
use numeris_integers::{Integer, Rational};
use smallvec::SmallVec;

use crate::handle::ExprHandle;

/// Unique identifier for a symbol.
pub type SymbolId = u32;

/// Unique identifier for a function.
pub type FunctionId = u32;

/// A named exact constant with a dedicated numeric evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    /// The circle constant pi.
    Pi,
    /// The base of the natural logarithm.
    E,
    /// The imaginary unit i.
    ImaginaryUnit,
}

/// An expression node stored in the arena.
///
/// Each variant is designed to be cache-friendly, using `SmallVec` for
/// inline storage of small argument lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    // === Atoms ===
    /// An exact arbitrary-precision integer literal.
    Integer(Integer),

    /// An exact rational number.
    ///
    /// Invariant: in lowest terms, positive denominator, not an integer.
    Rational(Rational),

    /// A named exact constant (pi, e, i).
    Constant(Constant),

    /// A symbolic variable, resolved through substitution bindings.
    Symbol(SymbolId),

    // === Compound Expressions ===
    /// Sum of expressions: a + b + c + ...
    ///
    /// Invariant: at least 2 arguments.
    Add(SmallVec<[ExprHandle; 4]>),

    /// Product of expressions: a * b * c * ...
    ///
    /// Invariant: at least 2 arguments.
    Mul(SmallVec<[ExprHandle; 4]>),

    /// Power expression: base^exp.
    Pow {
        /// The base of the power.
        base: ExprHandle,
        /// The exponent.
        exp: ExprHandle,
    },

    /// Negation: -expr.
    Neg(ExprHandle),

    /// Division: numerator / denominator.
    Div {
        /// The numerator.
        num: ExprHandle,
        /// The denominator.
        den: ExprHandle,
    },

    // === Functions ===
    /// A function application: f(arg1, arg2, ...).
    Function {
        /// The function identifier.
        id: FunctionId,
        /// The arguments.
        args: SmallVec<[ExprHandle; 2]>,
    },

    /// A definite integral over a single real variable.
    Integral {
        /// The integrand, in terms of `var`.
        integrand: ExprHandle,
        /// The integration variable.
        var: SymbolId,
        /// Lower bound.
        lower: ExprHandle,
        /// Upper bound.
        upper: ExprHandle,
    },
}

impl ExprNode {
    /// Returns true if this node is an atom (no children).
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            ExprNode::Integer(_)
                | ExprNode::Rational(_)
                | ExprNode::Constant(_)
                | ExprNode::Symbol(_)
        )
    }

    /// Returns true if this node is a numeric literal.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, ExprNode::Integer(_) | ExprNode::Rational(_))
    }

    /// Returns true if this is the integer zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, ExprNode::Integer(n) if n.is_zero())
    }

    /// Returns true if this is the integer one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, ExprNode::Integer(n) if n.is_one())
    }

    /// Returns the children of this node.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 4]> {
        match self {
            ExprNode::Integer(_)
            | ExprNode::Rational(_)
            | ExprNode::Constant(_)
            | ExprNode::Symbol(_) => SmallVec::new(),
            ExprNode::Add(args) | ExprNode::Mul(args) => args.clone(),
            ExprNode::Pow { base, exp } => smallvec::smallvec![*base, *exp],
            ExprNode::Neg(arg) => smallvec::smallvec![*arg],
            ExprNode::Div { num, den } => smallvec::smallvec![*num, *den],
            ExprNode::Function { args, .. } => args.iter().copied().collect(),
            ExprNode::Integral {
                integrand,
                lower,
                upper,
                ..
            } => smallvec::smallvec![*integrand, *lower, *upper],
        }
    }
}

/// Standard function identifiers.
pub mod functions {
    use super::FunctionId;

    /// Sine function.
    pub const SIN: FunctionId = 0;
    /// Cosine function.
    pub const COS: FunctionId = 1;
    /// Tangent function.
    pub const TAN: FunctionId = 2;
    /// Natural exponential.
    pub const EXP: FunctionId = 3;
    /// Natural logarithm.
    pub const LN: FunctionId = 4;
    /// Logarithm base 10.
    pub const LOG10: FunctionId = 5;
    /// Square root.
    pub const SQRT: FunctionId = 6;
    /// Absolute value.
    pub const ABS: FunctionId = 7;
    /// Inverse tangent.
    pub const ATAN: FunctionId = 8;
    /// Real part of a complex value.
    pub const RE: FunctionId = 9;
    /// Imaginary part of a complex value.
    pub const IM: FunctionId = 10;
    /// Floor (greatest integer <= x).
    pub const FLOOR: FunctionId = 11;
    /// Ceiling (least integer >= x).
    pub const CEILING: FunctionId = 12;

    /// Returns the display name of a standard function id, if known.
    #[must_use]
    pub fn name(id: FunctionId) -> Option<&'static str> {
        Some(match id {
            SIN => "sin",
            COS => "cos",
            TAN => "tan",
            EXP => "exp",
            LN => "ln",
            LOG10 => "log10",
            SQRT => "sqrt",
            ABS => "abs",
            ATAN => "atan",
            RE => "re",
            IM => "im",
            FLOOR => "floor",
            CEILING => "ceiling",
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_atom() {
        assert!(ExprNode::Integer(Integer::new(42)).is_atom());
        assert!(ExprNode::Symbol(0).is_atom());
        assert!(ExprNode::Constant(Constant::Pi).is_atom());
        assert!(!ExprNode::Neg(ExprHandle::new(0)).is_atom());
    }

    #[test]
    fn test_is_zero_one() {
        assert!(ExprNode::Integer(Integer::new(0)).is_zero());
        assert!(!ExprNode::Integer(Integer::new(1)).is_zero());
        assert!(ExprNode::Integer(Integer::new(1)).is_one());
    }

    #[test]
    fn test_function_names() {
        assert_eq!(functions::name(functions::SIN), Some("sin"));
        assert_eq!(functions::name(functions::CEILING), Some("ceiling"));
        assert_eq!(functions::name(999), None);
    }
}
