//! # numeris-integers
//!
//! Exact arbitrary-precision integer and rational arithmetic for Numeris.
//!
//! These are the exact values the evaluation engine consumes: expression
//! atoms are stored as [`Integer`] and [`Rational`] and only ever converted
//! *to* floating-point approximations, never the other way around.
//!
//! This crate wraps `dashu`:
//! - Arbitrary precision integers ([`Integer`])
//! - Arbitrary precision rationals ([`Rational`]), always in lowest terms

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod integer;
pub mod rational;

#[cfg(test)]
mod proptests;

pub use integer::Integer;
pub use rational::Rational;
