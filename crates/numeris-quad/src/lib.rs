//! # numeris-quad
//!
//! Arbitrary-precision numerical integration for Numeris.
//!
//! The single rule provided is tanh-sinh (double-exponential) quadrature
//! over [`Mpf`] values. The variable change `x = tanh(pi/2 sinh(t))`
//! makes the transformed integrand decay double-exponentially, so the
//! trapezoid rule converges at roughly one digit per function evaluation
//! and tolerates integrable endpoint singularities.
//!
//! Integrands are complex-valued: the evaluation engine integrates the
//! real and imaginary parts in one pass and compares the reported error
//! against its accuracy target to decide whether to retry at higher
//! precision.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod tanh_sinh;

pub use tanh_sinh::{QuadResult, TanhSinh};

pub use numeris_float::Mpf;
