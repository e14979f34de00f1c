//! Cholesky factorizations of symmetric matrices.
//!
//! Only the lower triangle of the input is read. [`cholesky`] computes
//! `a = l lᵀ`; [`cholesky_ldl`] computes `a = l d lᵀ` with a unit lower
//! triangular `l`; [`cholesky_ldl_force_pd`] factors `a + e` for a
//! non-negative diagonal `e` chosen so that the factorization exists and is
//! numerically stable (Gill, Murray and Wright).

use crate::element::Element;
use crate::error::{Error, Result};
use crate::matrix::{dot_into, ConstMatrix, DenseMatrix, MElemOf, Matrix};
use crate::opcode::OpCode;
use crate::scalar::{ConstScalar, Scalar};
use crate::vector::DenseVector;

use super::square;

/// Result of an `l d lᵀ` factorization.
#[derive(Clone, Debug, PartialEq)]
pub struct Ldl<S> {
    /// Unit lower triangular factor.
    pub l: DenseMatrix<S>,
    /// Diagonal of `d`.
    pub d: DenseVector<S>,
}

/// Lower triangular `l` with `a = l lᵀ`.
///
/// Fails with [`Error::NotPositiveDefinite`] at the first pivot that is not
/// strictly positive.
pub fn cholesky<M>(a: &M) -> Result<DenseMatrix<M::Scalar>>
where
    M: ConstMatrix + ?Sized,
    M::Scalar: Scalar,
{
    let n = square("cholesky", a)?;
    let zero = MElemOf::<M>::default();
    let mut l = DenseMatrix::<M::Scalar>::null(n, n);
    let mut s = M::Scalar::null();
    let mut t = M::Scalar::null();
    for i in 0..n {
        for j in 0..=i {
            dot_into(&mut s, &mut t, (0..j).map(|k| (&l[(i, k)], &l[(j, k)])));
            t.sub(a.const_at(i, j), &s);
            if i == j {
                if t.value() <= zero {
                    return Err(Error::NotPositiveDefinite(i));
                }
                l[(i, i)].sqrt(&t);
            } else {
                t.apply_with(OpCode::Div, &l[(j, j)]);
                l[(i, j)].set(&t);
            }
        }
    }
    Ok(l)
}

/// Unit lower triangular `l` and diagonal `d` with `a = l d lᵀ`.
///
/// Indefinite matrices factor as long as no pivot is exactly zero.
pub fn cholesky_ldl<M>(a: &M) -> Result<Ldl<M::Scalar>>
where
    M: ConstMatrix + ?Sized,
    M::Scalar: Scalar,
{
    let n = square("cholesky_ldl", a)?;
    let zero = MElemOf::<M>::default();
    let mut f = Ldl::null(n);
    let mut s = M::Scalar::null();
    let mut t = M::Scalar::null();
    for j in 0..n {
        f.weighted_dot(&mut s, &mut t, j, j);
        f.d[j].sub(a.const_at(j, j), &s);
        if f.d[j].value() == zero {
            return Err(Error::ZeroPivot {
                op: "cholesky_ldl",
                index: j,
            });
        }
        f.set_unit_diagonal(j);
        for i in j + 1..n {
            f.weighted_dot(&mut s, &mut t, i, j);
            t.sub(a.const_at(i, j), &s);
            t.apply_with(OpCode::Div, &f.d[j]);
            f.l[(i, j)].set(&t);
        }
    }
    Ok(f)
}

/// Modified `l d lᵀ` factorization of `a + e`, with every `d` entry positive.
///
/// `e` is zero when `a` is sufficiently positive definite. Otherwise pivots
/// are raised to at least `max(|c_jj|, θ_j² / β², δ)`, where `θ_j` bounds the
/// column below the pivot, `β²` is derived from the largest diagonal and
/// off-diagonal magnitudes and `δ` is a small multiple of machine epsilon.
pub fn cholesky_ldl_force_pd<M>(a: &M) -> Result<Ldl<M::Scalar>>
where
    M: ConstMatrix + ?Sized,
    M::Scalar: Scalar,
{
    let n = square("cholesky_ldl_force_pd", a)?;
    let (beta2, delta) = modification_bounds(a, n);
    let beta2 = M::Scalar::from_f64(beta2);
    let delta = M::Scalar::from_f64(delta);

    let mut f = Ldl::null(n);
    // c(i, j) = a(i, j) - Σₖ l(j, k) c(i, k), for i >= j
    let mut c = DenseMatrix::<M::Scalar>::null(n, n);
    let mut s = M::Scalar::null();
    let mut t = M::Scalar::null();
    let mut theta = M::Scalar::null();
    let mut raised = 0usize;
    for j in 0..n {
        f.weighted_dot(&mut s, &mut t, j, j);
        c[(j, j)].sub(a.const_at(j, j), &s);

        theta.reset();
        for i in j + 1..n {
            dot_into(&mut s, &mut t, (0..j).map(|k| (&f.l[(j, k)], &c[(i, k)])));
            c[(i, j)].sub(a.const_at(i, j), &s);
            t.abs(&c[(i, j)]);
            if t.greater(&theta) {
                theta.set(&t);
            }
        }

        let d = &mut f.d[j];
        d.abs(&c[(j, j)]);
        t.mul(&theta, &theta).apply_with(OpCode::Div, &beta2);
        if t.greater(&*d) {
            d.set(&t);
        }
        if delta.greater(&*d) {
            d.set(&delta);
        }
        if d.value() != c[(j, j)].value() {
            raised += 1;
        }

        f.set_unit_diagonal(j);
        for i in j + 1..n {
            t.div(&c[(i, j)], &f.d[j]);
            f.l[(i, j)].set(&t);
        }
    }
    if raised > 0 {
        log::debug!("cholesky_ldl_force_pd: raised {raised} of {n} pivots");
    }
    Ok(f)
}

/// `(β², δ)` for the modified factorization, from the values of `a`.
fn modification_bounds<M: ConstMatrix + ?Sized>(a: &M, n: usize) -> (f64, f64) {
    let mut gamma = 0.0f64;
    let mut xi = 0.0f64;
    for i in 0..n {
        gamma = gamma.max(a.const_at(i, i).get_f64().abs());
        for j in 0..i {
            xi = xi.max(a.const_at(i, j).get_f64().abs());
        }
    }
    let eps = <MElemOf<M> as Element>::EPSILON;
    let nu = ((n * n) as f64 - 1.0).sqrt().max(1.0);
    let beta2 = gamma.max(xi / nu).max(eps);
    let delta = eps * (gamma + xi).max(1.0);
    (beta2, delta)
}

impl<S: Scalar> Ldl<S> {
    fn null(n: usize) -> Self {
        Ldl {
            l: DenseMatrix::null(n, n),
            d: DenseVector::null(n),
        }
    }

    fn set_unit_diagonal(&mut self, j: usize) {
        let one = S::from_f64(1.0);
        self.l.at(j, j).set(&one);
    }

    /// `s = Σ_{k<j} l(i, k) l(j, k) d(k)`.
    fn weighted_dot(&self, s: &mut S, t: &mut S, i: usize, j: usize) {
        s.reset();
        for k in 0..j {
            t.mul(&self.l[(i, k)], &self.l[(j, k)]);
            t.apply_with(OpCode::Mul, &self.d[k]);
            s.apply_with(OpCode::Add, &*t);
        }
    }

    /// `l d lᵀ` as a dense matrix.
    pub fn reconstruct(&self) -> DenseMatrix<S> {
        let n = self.d.len();
        let mut ld = DenseMatrix::<S>::null(n, n);
        for i in 0..n {
            for j in 0..n {
                ld.at(i, j).mul(&self.l[(i, j)], &self.d[j]);
            }
        }
        let mut r = DenseMatrix::<S>::null(n, n);
        r.mdot_m(&ld, &self.l.t());
        r
    }
}
