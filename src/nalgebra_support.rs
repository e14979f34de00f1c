//! nalgebra adapters.
//!
//! Values cross the boundary as plain numbers: `DVector`/`DMatrix` carry the
//! element values of a vector or matrix, derivatives stay on the numbat side.
//! The `*_nalgebra` drivers mirror [`crate::api`] with nalgebra inputs and outputs.

use nalgebra::{DMatrix, DVector};

use crate::float::Float;
use crate::matrix::{ConstMatrix, DenseMatrix};
use crate::real::Real;
use crate::scalar::{ConstScalar, Scalar};
use crate::vector::{ConstVector, DenseVector};

/// Element values of `v`.
pub fn to_dvector<V>(v: &V) -> DVector<<V::Scalar as ConstScalar>::Elem>
where
    V: ConstVector + ?Sized,
{
    DVector::from_iterator(v.dim(), (0..v.dim()).map(|i| v.const_at(i).value()))
}

/// Element values of `m`.
pub fn to_dmatrix<M>(m: &M) -> DMatrix<<M::Scalar as ConstScalar>::Elem>
where
    M: ConstMatrix + ?Sized,
{
    let (rows, cols) = m.dims();
    DMatrix::from_fn(rows, cols, |i, j| m.const_at(i, j).value())
}

/// Constants with the values of `v`.
pub fn from_dvector<S: Scalar>(v: &DVector<S::Elem>) -> DenseVector<S> {
    v.iter().map(|&x| constant(x)).collect()
}

/// Constants with the values of `m`.
pub fn from_dmatrix<S: Scalar>(m: &DMatrix<S::Elem>) -> DenseMatrix<S> {
    let (rows, cols) = m.shape();
    let values = (0..rows)
        .flat_map(|i| (0..cols).map(move |j| (i, j)))
        .map(|ij| constant(m[ij]))
        .collect();
    DenseMatrix::from_parts(values, rows, cols)
}

fn constant<S: Scalar>(v: S::Elem) -> S {
    let mut s = S::null();
    s.set_value(v);
    s
}

/// Value and gradient of `f` at `x`.
pub fn gradient_nalgebra<F: Float>(
    f: impl FnOnce(&[Real<F>]) -> Real<F>,
    x: &DVector<F>,
) -> (F, DVector<F>) {
    let (value, g) = crate::api::gradient(f, x.as_slice());
    (value, DVector::from_vec(g))
}

/// Values and Jacobian `J[(i, j)] = ∂fᵢ/∂xⱼ` of `f` at `x`.
pub fn jacobian_nalgebra<F: Float>(
    f: impl FnOnce(&[Real<F>]) -> Vec<Real<F>>,
    x: &DVector<F>,
) -> (DVector<F>, DMatrix<F>) {
    let (values, rows) = crate::api::jacobian(f, x.as_slice());
    let m = values.len();
    let flat: Vec<F> = rows.into_iter().flatten().collect();
    (
        DVector::from_vec(values),
        DMatrix::from_row_slice(m, x.len(), &flat),
    )
}

/// Value, gradient and Hessian of `f` at `x`.
pub fn hessian_nalgebra<F: Float>(
    f: impl FnOnce(&[Real<F>]) -> Real<F>,
    x: &DVector<F>,
) -> (F, DVector<F>, DMatrix<F>) {
    let n = x.len();
    let (value, g, h) = crate::api::hessian(f, x.as_slice());
    let flat: Vec<F> = h.into_iter().flatten().collect();
    (
        value,
        DVector::from_vec(g),
        DMatrix::from_row_slice(n, n, &flat),
    )
}
