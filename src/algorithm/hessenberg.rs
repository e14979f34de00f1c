//! Reduction to upper Hessenberg form by Householder reflections.
//!
//! Column `k` is reflected onto `μ e₁` with `μ = ‖x‖ ≥ 0`, so the
//! subdiagonal of the result is non-negative except possibly its last entry.
//! Symmetric input yields a symmetric tridiagonal matrix.

use crate::error::Result;
use crate::matrix::{dot_into, ConstMatrix, DenseMatrix};
use crate::opcode::OpCode;
use crate::scalar::{ConstScalar, Scalar};

use super::square;

/// Upper Hessenberg `h` orthogonally similar to `a`.
pub fn hessenberg<M>(a: &M) -> Result<DenseMatrix<M::Scalar>>
where
    M: ConstMatrix + ?Sized,
    M::Scalar: Scalar,
{
    square("hessenberg", a)?;
    let mut h = a.as_dense_matrix();
    reduce(&mut h, None);
    Ok(h)
}

/// Upper Hessenberg `h` and orthogonal `u` with `h = uᵀ a u`.
pub fn hessenberg_with_transform<M>(
    a: &M,
) -> Result<(DenseMatrix<M::Scalar>, DenseMatrix<M::Scalar>)>
where
    M: ConstMatrix + ?Sized,
    M::Scalar: Scalar,
{
    let n = square("hessenberg", a)?;
    let mut h = a.as_dense_matrix();
    let mut u = DenseMatrix::<M::Scalar>::identity(n);
    reduce(&mut h, Some(&mut u));
    Ok((h, u))
}

fn reduce<S: Scalar>(h: &mut DenseMatrix<S>, mut u: Option<&mut DenseMatrix<S>>) {
    let n = h.dims().0;
    let zero = S::Elem::default();
    let two = S::from_f64(2.0);
    let mut sigma = S::null();
    let mut mu = S::null();
    let mut beta = S::null();
    let mut w = S::null();
    let mut t = S::null();
    let mut v: Vec<S> = Vec::with_capacity(n);

    for k in 0..n.saturating_sub(2) {
        // x = h[k+1.., k]; v = x - μ e₁ and the reflector is I - β v vᵀ
        dot_into(&mut sigma, &mut t, (k + 2..n).map(|i| (&h[(i, k)], &h[(i, k)])));
        if sigma.value() == zero {
            continue;
        }
        let x0 = &h[(k + 1, k)];
        t.mul(x0, x0).apply_with(OpCode::Add, &sigma);
        mu.sqrt(&t);

        v.clear();
        v.extend((k + 1..n).map(|i| h[(i, k)].clone()));
        if x0.value() <= zero {
            v[0].sub(x0, &mu);
        } else {
            // x0 - μ without cancellation
            t.add(x0, &mu);
            v[0].div(&sigma, &t).apply(OpCode::Neg);
        }
        t.mul(&v[0], &v[0]).apply_with(OpCode::Add, &sigma);
        beta.div(&two, &t);

        // h = P h on rows k+1.., where column k becomes μ e₁
        for c in k + 1..n {
            let column = v.iter().enumerate().map(|(i, vi)| (vi, &h[(k + 1 + i, c)]));
            dot_into(&mut w, &mut t, column);
            w.apply_with(OpCode::Mul, &beta);
            for (i, vi) in v.iter().enumerate() {
                t.mul(&w, vi);
                h[(k + 1 + i, c)].apply_with(OpCode::Sub, &t);
            }
        }
        h[(k + 1, k)].set(&mu);
        for i in k + 2..n {
            h[(i, k)].reset();
        }

        // h = h P and u = u P on columns k+1..
        reflect_columns(h, &v, &beta, k + 1, &mut w, &mut t);
        if let Some(u) = u.as_deref_mut() {
            reflect_columns(u, &v, &beta, k + 1, &mut w, &mut t);
        }
    }
}

/// `m[.., from..] -= β (m[.., from..] v) vᵀ`.
fn reflect_columns<S: Scalar>(
    m: &mut DenseMatrix<S>,
    v: &[S],
    beta: &S,
    from: usize,
    w: &mut S,
    t: &mut S,
) {
    let rows = m.dims().0;
    for r in 0..rows {
        dot_into(w, t, v.iter().enumerate().map(|(j, vj)| (&m[(r, from + j)], vj)));
        w.apply_with(OpCode::Mul, beta);
        for (j, vj) in v.iter().enumerate() {
            t.mul(&*w, vj);
            m[(r, from + j)].apply_with(OpCode::Sub, &*t);
        }
    }
}
