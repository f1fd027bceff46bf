//! # numeris-core
//!
//! Core expression representation for the Numeris adaptive-precision
//! evaluator.
//!
//! This crate provides:
//! - Arena-allocated expression storage with hash-consing
//! - Type-safe expression handles
//! - O(1) structural equality via interning
//! - A plain-text renderer used in error diagnostics
//!
//! ## Design Principles
//!
//! - **Immutable trees**: nodes are never mutated after interning; the
//!   evaluator reads kinds and children and may intern *new* nodes (e.g.
//!   residuals for floor/ceiling certification), never change existing ones
//! - **Hash-Consing**: every structurally unique expression stored exactly once
//! - **Zero-Cost Handles**: 32-bit indices instead of pointers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod display;
pub mod expr;
pub mod handle;

pub use arena::ExprArena;
pub use expr::functions;
pub use expr::{Constant, ExprNode, FunctionId, SymbolId};
pub use handle::ExprHandle;
