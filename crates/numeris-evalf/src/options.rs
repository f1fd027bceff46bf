//! Per-call working options.
//!
//! One [`EvalOptions`] is created per top-level evaluation and threaded
//! mutably through every recursive call. Operators that need to lower the
//! max-precision ceiling for their subtree do so through [`MaxPrecScope`],
//! which restores the previous ceiling on every exit path.

use numeris_core::{ExprHandle, SymbolId};
use numeris_float::Mpf;
use rustc_hash::FxHashMap;

use crate::policy::{EscalationPolicy, IntegerPartPolicy};
use crate::value::Approx;

/// Default max working precision in bits (about 100 decimal digits).
pub const DEFAULT_MAXPREC: i64 = 333;

/// What a symbol is bound to.
#[derive(Clone, Debug)]
pub enum Binding {
    /// A sub-expression, evaluated recursively on first use and memoized.
    Expr(ExprHandle),
    /// An already-computed float, used directly (zero means exact zero).
    Float(Mpf),
}

/// Process-scoped configuration for one top-level evaluation.
#[derive(Clone, Debug)]
pub struct EvalOptions {
    /// Substitution bindings for symbols.
    pub substitutions: FxHashMap<SymbolId, Binding>,
    /// Current max working precision ceiling in bits.
    pub maxprec: i64,
    /// Replace negligible parts with exact zero after each node.
    pub chop: bool,
    /// Fail instead of returning an under-accurate result.
    pub strict: bool,
    /// Emit a per-node evaluation trace through the `log` facade.
    pub verbose: bool,
    /// Retry step schedule shared by all operators.
    pub escalation: EscalationPolicy,
    /// Floor/ceiling probe thresholds.
    pub integer_part: IntegerPartPolicy,
    /// Memoized symbol evaluations: symbol -> (precision, value).
    pub(crate) cache: FxHashMap<SymbolId, (i64, Approx)>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            substitutions: FxHashMap::default(),
            maxprec: DEFAULT_MAXPREC,
            chop: false,
            strict: false,
            verbose: false,
            escalation: EscalationPolicy::default(),
            integer_part: IntegerPartPolicy::default(),
            cache: FxHashMap::default(),
        }
    }
}

impl EvalOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a symbol to a sub-expression.
    pub fn bind_expr(&mut self, symbol: SymbolId, expr: ExprHandle) -> &mut Self {
        self.substitutions.insert(symbol, Binding::Expr(expr));
        self
    }

    /// Binds a symbol to a float value.
    pub fn bind_float(&mut self, symbol: SymbolId, value: Mpf) -> &mut Self {
        self.substitutions.insert(symbol, Binding::Float(value));
        self
    }
}

/// Scoped clamp of the max-precision ceiling.
///
/// Dereferences to the wrapped options; the prior ceiling is restored on
/// drop, so early returns and error propagation cannot leak a lowered
/// ceiling to siblings.
pub(crate) struct MaxPrecScope<'a> {
    options: &'a mut EvalOptions,
    saved: i64,
}

impl<'a> MaxPrecScope<'a> {
    pub(crate) fn clamp(options: &'a mut EvalOptions, ceiling: i64) -> Self {
        let saved = options.maxprec;
        options.maxprec = options.maxprec.min(ceiling);
        Self { options, saved }
    }

    /// Moves the clamped ceiling, still bounded by the saved outer one.
    ///
    /// Retry loops that escalate their working precision raise the
    /// ceiling along with it, so a deep cancellation can still be
    /// resolved without unclamping the subtree entirely.
    pub(crate) fn reclamp(&mut self, ceiling: i64) {
        self.options.maxprec = self.saved.min(ceiling);
    }
}

impl std::ops::Deref for MaxPrecScope<'_> {
    type Target = EvalOptions;

    fn deref(&self) -> &EvalOptions {
        self.options
    }
}

impl std::ops::DerefMut for MaxPrecScope<'_> {
    fn deref_mut(&mut self) -> &mut EvalOptions {
        self.options
    }
}

impl Drop for MaxPrecScope<'_> {
    fn drop(&mut self) {
        self.options.maxprec = self.saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_restores_on_drop() {
        let mut options = EvalOptions::new();
        options.maxprec = 300;
        {
            let scope = MaxPrecScope::clamp(&mut options, 100);
            assert_eq!(scope.maxprec, 100);
        }
        assert_eq!(options.maxprec, 300);
    }

    #[test]
    fn test_scope_never_raises_ceiling() {
        let mut options = EvalOptions::new();
        options.maxprec = 50;
        {
            let scope = MaxPrecScope::clamp(&mut options, 100);
            assert_eq!(scope.maxprec, 50);
        }
        assert_eq!(options.maxprec, 50);
    }
}
