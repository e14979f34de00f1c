//! Forward-mode automatic differentiation with exact gradients and Hessians.
//!
//! A [`Real`] carries a value together with its first and second derivatives
//! with respect to a set of declared variables. Every operation propagates
//! both orders, so a single evaluation of a function yields its value,
//! gradient and Hessian. [`Bare`] is the same interface without derivatives,
//! over any [`Element`] type.
//!
//! Operations write into a destination (`r.mul(&a, &b)`), so a scalar's
//! buffers are reused across a computation. [`DenseVector`], [`SparseVector`],
//! [`DenseMatrix`] and [`SparseMatrix`] hold scalars and provide element-wise
//! arithmetic, products, reductions and reordering.
//!
//! ```
//! use numbat::{variables, ConstScalar, Real64, Scalar};
//!
//! let mut x = Real64::new(1.5);
//! let mut y = Real64::new(2.5);
//! variables(2, &mut [&mut x, &mut y]).unwrap();
//!
//! // x³ + y³ - 3xy
//! let f = &(&(&x * &x) * &x) + &(&(&y * &y) * &y);
//! let f = f - &(&x * &y) * 3.0;
//!
//! assert!((f.derivative(0) - (3.0 * 1.5 * 1.5 - 3.0 * 2.5)).abs() < 1e-12);
//! assert!((f.hessian_at(0, 1) + 3.0).abs() < 1e-12);
//! assert!((f.hessian_at(1, 1) - 15.0).abs() < 1e-12);
//! ```
//!
//! For one-shot evaluation of plain functions see [`gradient`], [`jacobian`]
//! and [`hessian`].

pub mod algorithm;
pub mod api;
pub mod bare;
pub mod element;
pub mod error;
pub mod float;
pub mod matrix;
pub mod opcode;
pub mod real;
pub mod scalar;
pub mod special;
mod traits;
pub mod vector;

#[cfg(feature = "nalgebra")]
pub mod nalgebra_support;
#[cfg(feature = "serde")]
mod serde_support;

pub use api::{gradient, hessian, jacobian};
pub use bare::Bare;
pub use element::Element;
pub use error::{Error, Result};
pub use float::Float;
pub use matrix::{
    ConstMatrix, DenseMatrix, DenseMatrixBase, DenseMatrixView, DenseMatrixViewMut, Matrix,
    SparseMatrix,
};
pub use opcode::OpCode;
pub use real::{variables, Real};
pub use scalar::{Arg, ConstScalar, DynScalar, Parts, Scalar};
pub use vector::{ConstVector, DenseVector, SparseVector, Vector};

/// Differentiable scalar over `f64`.
pub type Real64 = Real<f64>;
/// Differentiable scalar over `f32`.
pub type Real32 = Real<f32>;
