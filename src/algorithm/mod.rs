//! Dense linear algebra on top of the matrix and scalar traits.
//!
//! Every step is a scalar operation, so derivatives carried by the input
//! entries flow through to the results. Inputs may be any [`ConstMatrix`],
//! views included; results are owned dense matrices and vectors.
//!
//! [`ConstMatrix`]: crate::ConstMatrix

pub mod back_substitution;
pub mod cholesky;
pub mod hessenberg;

pub use back_substitution::back_substitution;
pub use cholesky::{cholesky, cholesky_ldl, cholesky_ldl_force_pd, Ldl};
pub use hessenberg::{hessenberg, hessenberg_with_transform};

use crate::error::{Error, Result};
use crate::matrix::ConstMatrix;

/// Side length of `a`, or [`Error::NotSquare`].
fn square<M: ConstMatrix + ?Sized>(op: &'static str, a: &M) -> Result<usize> {
    let (rows, cols) = a.dims();
    if rows != cols {
        return Err(Error::NotSquare { op, rows, cols });
    }
    Ok(rows)
}
