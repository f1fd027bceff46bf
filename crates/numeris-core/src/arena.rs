//! Arena allocator for expression storage.
//!
//! All expressions live contiguously in a `Vec`, with hash-consing ensuring
//! each unique expression is stored exactly once. The evaluator holds a
//! `&mut ExprArena` so it can intern helper expressions (residuals, lowered
//! composites) during evaluation; existing nodes are never modified.

use hashbrown::HashMap;
use numeris_integers::{Integer, Rational};
use smallvec::SmallVec;

use crate::expr::{Constant, ExprNode, FunctionId, SymbolId};
use crate::handle::ExprHandle;

/// The main arena for storing expressions.
#[derive(Debug, Default)]
pub struct ExprArena {
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Interning table: maps node content to its handle.
    intern_map: HashMap<ExprNode, ExprHandle>,
    /// Symbol table: maps symbol names to their IDs.
    symbols: HashMap<String, SymbolId>,
    /// Reverse symbol table for display.
    symbol_names: Vec<String>,
}

impl ExprArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an expression node, returning its handle.
    ///
    /// If an identical node already exists, returns the existing handle.
    ///
    /// # Panics
    ///
    /// Panics if the arena grows beyond `u32::MAX` nodes.
    pub fn intern(&mut self, node: ExprNode) -> ExprHandle {
        if let Some(&handle) = self.intern_map.get(&node) {
            return handle;
        }

        let index = self.nodes.len();
        assert!(index < u32::MAX as usize, "arena capacity exceeded");

        let handle = ExprHandle::new(index as u32);
        self.nodes.push(node.clone());
        self.intern_map.insert(node, handle);
        handle
    }

    /// Gets the node at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> &ExprNode {
        &self.nodes[handle.index() as usize]
    }

    /// Interns a symbol name, returning its unique ID.
    pub fn intern_symbol(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.symbols.get(name) {
            return id;
        }

        let id = self.symbol_names.len() as SymbolId;
        self.symbols.insert(name.to_string(), id);
        self.symbol_names.push(name.to_string());
        id
    }

    /// Gets the name of a symbol by its ID.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbol_names.get(id as usize).map(String::as_str)
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Convenience constructors ===

    /// Creates an integer expression.
    pub fn integer(&mut self, value: i64) -> ExprHandle {
        self.intern(ExprNode::Integer(Integer::new(value)))
    }

    /// Creates an integer expression from an exact big integer.
    pub fn big_integer(&mut self, value: Integer) -> ExprHandle {
        self.intern(ExprNode::Integer(value))
    }

    /// Creates a rational expression; integers collapse to `Integer` nodes.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    pub fn rational(&mut self, num: i64, den: i64) -> ExprHandle {
        let r = Rational::from_i64(num, den);
        match r.to_integer() {
            Some(n) => self.big_integer(n),
            None => self.intern(ExprNode::Rational(r)),
        }
    }

    /// Creates a symbol expression.
    pub fn symbol(&mut self, name: &str) -> ExprHandle {
        let id = self.intern_symbol(name);
        self.intern(ExprNode::Symbol(id))
    }

    /// Creates a named-constant expression.
    pub fn constant(&mut self, c: Constant) -> ExprHandle {
        self.intern(ExprNode::Constant(c))
    }

    /// Creates the constant pi.
    pub fn pi(&mut self) -> ExprHandle {
        self.constant(Constant::Pi)
    }

    /// Creates the constant e.
    pub fn e(&mut self) -> ExprHandle {
        self.constant(Constant::E)
    }

    /// Creates the imaginary unit.
    pub fn imaginary_unit(&mut self) -> ExprHandle {
        self.constant(Constant::ImaginaryUnit)
    }

    /// Creates an addition expression.
    pub fn add(&mut self, args: impl Into<SmallVec<[ExprHandle; 4]>>) -> ExprHandle {
        let args = args.into();
        if args.len() == 1 {
            return args[0];
        }
        self.intern(ExprNode::Add(args))
    }

    /// Creates a multiplication expression.
    pub fn mul(&mut self, args: impl Into<SmallVec<[ExprHandle; 4]>>) -> ExprHandle {
        let args = args.into();
        if args.len() == 1 {
            return args[0];
        }
        self.intern(ExprNode::Mul(args))
    }

    /// Creates a power expression.
    pub fn pow(&mut self, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Pow { base, exp })
    }

    /// Creates a negation expression.
    pub fn neg(&mut self, arg: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Neg(arg))
    }

    /// Creates a division expression.
    pub fn div(&mut self, num: ExprHandle, den: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Div { num, den })
    }

    /// Creates a function application.
    pub fn func(
        &mut self,
        id: FunctionId,
        args: impl Into<SmallVec<[ExprHandle; 2]>>,
    ) -> ExprHandle {
        self.intern(ExprNode::Function {
            id,
            args: args.into(),
        })
    }

    /// Creates a definite integral expression.
    pub fn integral(
        &mut self,
        integrand: ExprHandle,
        var: SymbolId,
        lower: ExprHandle,
        upper: ExprHandle,
    ) -> ExprHandle {
        self.intern(ExprNode::Integral {
            integrand,
            var,
            lower,
            upper,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::functions;

    #[test]
    fn test_arena_basic() {
        let mut arena = ExprArena::new();

        let x = arena.symbol("x");
        let y = arena.symbol("y");
        let x2 = arena.symbol("x");

        assert_eq!(x, x2);
        assert_ne!(x, y);
    }

    #[test]
    fn test_hash_consing() {
        let mut arena = ExprArena::new();

        let x = arena.symbol("x");
        let one = arena.integer(1);

        let sum1 = arena.add(smallvec::smallvec![x, one]);
        let sum2 = arena.add(smallvec::smallvec![x, one]);

        assert_eq!(sum1, sum2);
        // x, 1, (x + 1)
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_rational_collapses_to_integer() {
        let mut arena = ExprArena::new();
        let a = arena.rational(4, 2);
        let b = arena.integer(2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_function_and_integral_nodes() {
        let mut arena = ExprArena::new();
        let x = arena.symbol("x");
        let xid = arena.intern_symbol("x");
        let sin_x = arena.func(functions::SIN, smallvec::smallvec![x]);
        let zero = arena.integer(0);
        let pi = arena.pi();
        let integral = arena.integral(sin_x, xid, zero, pi);

        assert_eq!(arena.get(sin_x).children().len(), 1);
        assert_eq!(arena.get(integral).children().len(), 3);
    }
}
