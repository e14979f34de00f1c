//! Vectors of scalars.
//!
//! [`ConstVector`] is the read side (dimension, element lookup, traversal of
//! stored entries); [`Vector`] adds mutable access and element-wise
//! arithmetic. Element-wise operations write into `self` from distinct
//! operands; the `*_assign` forms use `self` as the first operand.

mod dense;
mod sparse;

pub use dense::DenseVector;
pub use sparse::SparseVector;

use crate::error::check_dims;
use crate::matrix::ConstMatrix;
use crate::opcode::OpCode;
use crate::scalar::{Arg, ConstScalar, DynScalar, Scalar};

/// Element type of a vector's scalars.
pub type ElemOf<V> = <<V as ConstVector>::Scalar as ConstScalar>::Elem;

/// Read-only vector of scalars.
pub trait ConstVector {
    type Scalar: ConstScalar;

    /// Logical length, implicit zeros included.
    fn dim(&self) -> usize;

    /// Element `i`. Panics if `i >= dim()`.
    fn const_at(&self, i: usize) -> &Self::Scalar;

    /// Stored entries in index order. Dense vectors yield every element;
    /// sparse vectors skip implicit zeros.
    fn nonzero(&self) -> impl Iterator<Item = (usize, &Self::Scalar)> + '_;

    /// Element-wise value equality within `epsilon`.
    fn equals<B>(&self, b: &B, epsilon: f64) -> bool
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        if self.dim() != b.dim() {
            return false;
        }
        (0..self.dim()).all(|i| self.const_at(i).equals(b.const_at(i), epsilon))
    }

    /// Fold over the stored entries.
    fn reduce<R, Fun>(&self, init: R, mut f: Fun) -> R
    where
        Fun: FnMut(R, &Self::Scalar) -> R,
    {
        let mut r = init;
        for (_, s) in self.nonzero() {
            r = f(r, s);
        }
        r
    }
}

/// Mutable vector of scalars.
pub trait Vector: ConstVector<Scalar: Scalar> {
    /// Mutable element `i`. Panics if `i >= dim()`; sparse vectors
    /// materialize a zero entry.
    fn at(&mut self, i: usize) -> &mut Self::Scalar;

    /// Stored entries in index order, mutably.
    fn nonzero_mut(&mut self) -> impl Iterator<Item = (usize, &mut Self::Scalar)> + '_;

    /// Copy every element of `a`. Panics on dimension mismatch.
    fn set<A>(&mut self, a: &A)
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        check_dims("set", (self.dim(), 1), (a.dim(), 1));
        for i in 0..self.dim() {
            self.at(i).set(a.const_at(i));
        }
    }

    /// Zero every stored entry.
    fn reset(&mut self) {
        for (_, s) in self.nonzero_mut() {
            s.reset();
        }
    }

    /// Visit every stored entry mutably.
    fn map<Fun>(&mut self, mut f: Fun)
    where
        Fun: FnMut(&mut Self::Scalar),
    {
        for (_, s) in self.nonzero_mut() {
            f(s);
        }
    }

    /// Replace every stored entry by a function of its old value.
    fn map_set<Fun>(&mut self, mut f: Fun)
    where
        Fun: FnMut(&Self::Scalar) -> Self::Scalar,
    {
        for (_, s) in self.nonzero_mut() {
            *s = f(s);
        }
    }

    // ── Vector ∘ vector ──

    fn vadd_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise(self, OpCode::Add, a, b, "vadd_v");
    }

    fn vsub_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise(self, OpCode::Sub, a, b, "vsub_v");
    }

    fn vmul_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise(self, OpCode::Mul, a, b, "vmul_v");
    }

    fn vdiv_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise(self, OpCode::Div, a, b, "vdiv_v");
    }

    // ── Vector ∘ scalar ──

    fn vadd_s<A>(&mut self, a: &A, s: &DynScalar<'_, ElemOf<Self>>)
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        broadcast(self, OpCode::Add, a, s, "vadd_s");
    }

    fn vsub_s<A>(&mut self, a: &A, s: &DynScalar<'_, ElemOf<Self>>)
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        broadcast(self, OpCode::Sub, a, s, "vsub_s");
    }

    fn vmul_s<A>(&mut self, a: &A, s: &DynScalar<'_, ElemOf<Self>>)
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        broadcast(self, OpCode::Mul, a, s, "vmul_s");
    }

    fn vdiv_s<A>(&mut self, a: &A, s: &DynScalar<'_, ElemOf<Self>>)
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        broadcast(self, OpCode::Div, a, s, "vdiv_s");
    }

    // ── In place ──

    fn vadd_v_assign<B>(&mut self, b: &B)
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise_assign(self, OpCode::Add, b, "vadd_v_assign");
    }

    fn vsub_v_assign<B>(&mut self, b: &B)
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise_assign(self, OpCode::Sub, b, "vsub_v_assign");
    }

    fn vmul_v_assign<B>(&mut self, b: &B)
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise_assign(self, OpCode::Mul, b, "vmul_v_assign");
    }

    fn vdiv_v_assign<B>(&mut self, b: &B)
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        elementwise_assign(self, OpCode::Div, b, "vdiv_v_assign");
    }

    fn vadd_s_assign(&mut self, s: &DynScalar<'_, ElemOf<Self>>) {
        for i in 0..self.dim() {
            self.at(i).apply_with(OpCode::Add, s);
        }
    }

    fn vsub_s_assign(&mut self, s: &DynScalar<'_, ElemOf<Self>>) {
        for i in 0..self.dim() {
            self.at(i).apply_with(OpCode::Sub, s);
        }
    }

    /// Scaling by a finite factor keeps implicit zeros implicit.
    fn vmul_s_assign(&mut self, s: &DynScalar<'_, ElemOf<Self>>) {
        if s.get_f64().is_finite() {
            for (_, x) in self.nonzero_mut() {
                x.apply_with(OpCode::Mul, s);
            }
        } else {
            for i in 0..self.dim() {
                self.at(i).apply_with(OpCode::Mul, s);
            }
        }
    }

    fn vdiv_s_assign(&mut self, s: &DynScalar<'_, ElemOf<Self>>) {
        for i in 0..self.dim() {
            self.at(i).apply_with(OpCode::Div, s);
        }
    }

    // ── Matrix products ──

    /// `self = a · b` for a matrix `a` and a vector `b`.
    fn mdot_v<M, B>(&mut self, a: &M, b: &B)
    where
        M: ConstMatrix + ?Sized,
        B: ConstVector + ?Sized,
        M::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        let (n, m) = a.dims();
        check_dims("mdot_v", (m, 1), (b.dim(), 1));
        check_dims("mdot_v", (n, 1), (self.dim(), 1));
        let mut t = Self::Scalar::null();
        for i in 0..n {
            let r = self.at(i);
            r.reset();
            for (j, bj) in b.nonzero() {
                t.mul(a.const_at(i, j), bj);
                r.apply_with(OpCode::Add, &t);
            }
        }
    }

    /// `self = aᵀ · b`, i.e. the row vector `a` times the matrix `b`.
    fn vdot_m<A, M>(&mut self, a: &A, b: &M)
    where
        A: ConstVector + ?Sized,
        M: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        M::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        let (n, m) = b.dims();
        check_dims("vdot_m", (n, 1), (a.dim(), 1));
        check_dims("vdot_m", (m, 1), (self.dim(), 1));
        let mut t = Self::Scalar::null();
        for j in 0..m {
            let r = self.at(j);
            r.reset();
            for (i, ai) in a.nonzero() {
                t.mul(ai, b.const_at(i, j));
                r.apply_with(OpCode::Add, &t);
            }
        }
    }
}

/// `r[i] = op(a[i], b[i])` over every index.
pub(crate) fn elementwise<R, A, B>(r: &mut R, op: OpCode, a: &A, b: &B, name: &'static str)
where
    R: Vector + ?Sized,
    A: ConstVector + ?Sized,
    B: ConstVector + ?Sized,
    A::Scalar: ConstScalar<Elem = ElemOf<R>>,
    B::Scalar: ConstScalar<Elem = ElemOf<R>>,
{
    check_dims(name, (r.dim(), 1), (a.dim(), 1));
    check_dims(name, (r.dim(), 1), (b.dim(), 1));
    for i in 0..r.dim() {
        r.at(i).binary(op, a.const_at(i).into(), b.const_at(i).into());
    }
}

/// `r[i] = op(a[i], s)` over every index.
pub(crate) fn broadcast<R, A>(
    r: &mut R,
    op: OpCode,
    a: &A,
    s: &DynScalar<'_, ElemOf<R>>,
    name: &'static str,
)
where
    R: Vector + ?Sized,
    A: ConstVector + ?Sized,
    A::Scalar: ConstScalar<Elem = ElemOf<R>>,
{
    check_dims(name, (r.dim(), 1), (a.dim(), 1));
    for i in 0..r.dim() {
        r.at(i).binary(op, a.const_at(i).into(), Arg::Other(s));
    }
}

/// `r[i] = op(r[i], b[i])` over every index.
pub(crate) fn elementwise_assign<R, B>(r: &mut R, op: OpCode, b: &B, name: &'static str)
where
    R: Vector + ?Sized,
    B: ConstVector + ?Sized,
    B::Scalar: ConstScalar<Elem = ElemOf<R>>,
{
    check_dims(name, (r.dim(), 1), (b.dim(), 1));
    for i in 0..r.dim() {
        r.at(i).apply_with(op, b.const_at(i));
    }
}
