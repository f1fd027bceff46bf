//! # Numeris
//!
//! Certified arbitrary-precision numeric evaluation of symbolic
//! expression trees.
//!
//! Numeris approximates expressions built from exact integers,
//! rationals, constants, and elementary functions to any requested
//! number of decimal digits, and tells you how many of those digits it
//! can actually vouch for. Working precision escalates automatically
//! when cancellation or ill conditioning threatens the target.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use numeris::prelude::*;
//!
//! let mut arena = ExprArena::new();
//! let one = arena.integer(1);
//! let three = arena.integer(3);
//! let third = arena.div(one, three);
//! let value = evaluate(&mut arena, third, 10, &mut EvalOptions::new())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use numeris_core as core;
pub use numeris_evalf as evalf;
pub use numeris_float as float;
pub use numeris_integers as integers;
pub use numeris_quad as quad;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use numeris_core::{functions, Constant, ExprArena, ExprHandle, ExprNode};
    pub use numeris_evalf::{evaluate, Binding, CertifiedValue, EvalError, EvalOptions};
    pub use numeris_float::Mpf;
    pub use numeris_integers::{Integer, Rational};
    pub use numeris_quad::TanhSinh;
}
