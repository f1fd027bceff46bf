//! Engine error taxonomy.
//!
//! Three recoverable kinds plus `Undefined` for mathematically undefined
//! requests. Invariant violations (a complex zero reaching
//! `finalize_complex`, a zero divisor inside the backend) panic instead:
//! they indicate a bug in an evaluator, not a property of the input.

use thiserror::Error;

/// Errors surfaced by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The requested accuracy could not be certified within the
    /// max-precision ceiling. Carries the offending sub-expression.
    #[error("precision exhausted while evaluating {expr}")]
    PrecisionExhausted {
        /// Rendered form of the sub-expression that failed.
        expr: String,
    },

    /// No evaluator exists for this node kind or argument combination.
    #[error("numeric evaluation not implemented for {what}")]
    NotImplemented {
        /// Description of the unsupported construct.
        what: String,
    },

    /// A symbol had no substitution binding.
    #[error("no substitution binding for symbol {name}")]
    UnboundSymbol {
        /// The symbol's name.
        name: String,
    },

    /// The expression is mathematically undefined.
    #[error("{what} is undefined")]
    Undefined {
        /// Description of the undefined operation.
        what: String,
    },
}

/// Result alias used throughout the engine.
pub type EvalResult<T> = Result<T, EvalError>;
