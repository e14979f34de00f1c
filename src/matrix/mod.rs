//! Matrices of scalars.
//!
//! [`ConstMatrix`] is the read side and [`Matrix`] the mutable side. Dense
//! matrices are row-major with O(1) transposed and sliced views; sparse
//! matrices store only their nonzero entries.

mod dense;
mod sparse;

pub use dense::{
    DenseMatrix, DenseMatrixBase, DenseMatrixView, DenseMatrixViewMut, Storage, StorageMut,
};
pub use sparse::SparseMatrix;

use std::fmt;

use num_traits::One;

use crate::bare::Bare;
use crate::error::{check_dims, check_index, check_permutation, Error, Result};
use crate::opcode::OpCode;
use crate::scalar::{Arg, ConstScalar, DynScalar, Scalar};
use crate::vector::{ConstVector, DenseVector};

/// Element type of a matrix's scalars.
pub type MElemOf<M> = <<M as ConstMatrix>::Scalar as ConstScalar>::Elem;

/// Read-only matrix of scalars.
pub trait ConstMatrix {
    type Scalar: ConstScalar;

    /// `(rows, cols)`.
    fn dims(&self) -> (usize, usize);

    /// Element `(i, j)`. Panics when out of bounds.
    fn const_at(&self, i: usize, j: usize) -> &Self::Scalar;

    /// Square and equal to its transpose within `epsilon`.
    fn is_symmetric(&self, epsilon: f64) -> bool {
        let (n, m) = self.dims();
        if n != m {
            return false;
        }
        (0..n).all(|i| (i + 1..n).all(|j| self.const_at(i, j).equals(self.const_at(j, i), epsilon)))
    }

    /// Element-wise value equality within `epsilon`.
    fn equals<B>(&self, b: &B, epsilon: f64) -> bool
    where
        B: ConstMatrix + ?Sized,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        let (n, m) = self.dims();
        if (n, m) != b.dims() {
            return false;
        }
        (0..n).all(|i| (0..m).all(|j| self.const_at(i, j).equals(b.const_at(i, j), epsilon)))
    }

    /// Fold over every element in row-major order.
    fn reduce<R, Fun>(&self, init: R, mut f: Fun) -> R
    where
        Fun: FnMut(R, &Self::Scalar) -> R,
    {
        let (n, m) = self.dims();
        let mut r = init;
        for i in 0..n {
            for j in 0..m {
                r = f(r, self.const_at(i, j));
            }
        }
        r
    }

    /// Copy of row `i`.
    fn row(&self, i: usize) -> DenseVector<Self::Scalar>
    where
        Self::Scalar: Clone,
    {
        let (n, m) = self.dims();
        check_index((i, 0), (n, m.max(1)));
        (0..m).map(|j| self.const_at(i, j).clone()).collect()
    }

    /// Copy of column `j`.
    fn col(&self, j: usize) -> DenseVector<Self::Scalar>
    where
        Self::Scalar: Clone,
    {
        let (n, m) = self.dims();
        check_index((0, j), (n.max(1), m));
        (0..n).map(|i| self.const_at(i, j).clone()).collect()
    }

    /// Copy of the diagonal. Panics unless square.
    fn diag(&self) -> DenseVector<Self::Scalar>
    where
        Self::Scalar: Clone,
    {
        let (n, m) = self.dims();
        if n != m {
            panic!("{}", Error::NotSquare { op: "diag", rows: n, cols: m });
        }
        (0..n).map(|i| self.const_at(i, i).clone()).collect()
    }

    /// Owned, compact dense copy.
    fn as_dense_matrix(&self) -> DenseMatrix<Self::Scalar>
    where
        Self::Scalar: Clone,
    {
        let (n, m) = self.dims();
        let values = (0..n)
            .flat_map(|i| (0..m).map(move |j| (i, j)))
            .map(|(i, j)| self.const_at(i, j).clone())
            .collect();
        DenseMatrix::from_parts(values, n, m)
    }

    /// Sparse copy holding every element that is not a plain zero.
    fn as_sparse_matrix(&self) -> SparseMatrix<Self::Scalar>
    where
        Self::Scalar: Scalar,
    {
        let (n, m) = self.dims();
        let zero = MElemOf::<Self>::default();
        let mut r = SparseMatrix::<Self::Scalar>::null(n, m);
        for i in 0..n {
            for j in 0..m {
                let s = self.const_at(i, j);
                if s.value() != zero || s.order() > 0 {
                    r.at(i, j).set(s);
                }
            }
        }
        r
    }
}

/// Mutable matrix of scalars.
///
/// Binary operations write into `self` from operands that must not be
/// `self`; [`mdot_m_assign`](Matrix::mdot_m_assign) and
/// [`pre_mdot_m_assign`](Matrix::pre_mdot_m_assign) cover products that
/// update `self` in place.
pub trait Matrix: ConstMatrix<Scalar: Scalar> {
    /// Mutable element `(i, j)`. Panics when out of bounds; sparse matrices
    /// materialize a zero entry.
    fn at(&mut self, i: usize, j: usize) -> &mut Self::Scalar;

    /// Exchange elements `a` and `b`.
    fn swap(&mut self, a: (usize, usize), b: (usize, usize));

    /// Copy every element of `a`.
    fn set<A>(&mut self, a: &A)
    where
        A: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        let (n, m) = self.dims();
        check_dims("set", (n, m), a.dims());
        for i in 0..n {
            for j in 0..m {
                self.at(i, j).set(a.const_at(i, j));
            }
        }
    }

    /// Constant ones on the diagonal; other elements are reset.
    fn set_identity(&mut self) {
        let (n, m) = self.dims();
        let one = Bare::new(MElemOf::<Self>::one());
        for i in 0..n {
            for j in 0..m {
                if i == j {
                    self.at(i, j).set(&one);
                } else {
                    self.at(i, j).reset();
                }
            }
        }
    }

    /// Zero every element, keeping allocations.
    fn reset(&mut self) {
        self.map(|s| s.reset());
    }

    /// Visit every element mutably.
    fn map<Fun>(&mut self, mut f: Fun)
    where
        Fun: FnMut(&mut Self::Scalar),
    {
        let (n, m) = self.dims();
        for i in 0..n {
            for j in 0..m {
                f(self.at(i, j));
            }
        }
    }

    /// Replace every element by a function of its old value.
    fn map_set<Fun>(&mut self, mut f: Fun)
    where
        Fun: FnMut(&Self::Scalar) -> Self::Scalar,
    {
        self.map(|s| *s = f(s));
    }

    // ── Matrix ∘ matrix ──

    fn madd_m<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstMatrix + ?Sized,
        B: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        elementwise(self, OpCode::Add, a, b, "madd_m");
    }

    fn msub_m<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstMatrix + ?Sized,
        B: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        elementwise(self, OpCode::Sub, a, b, "msub_m");
    }

    /// Element-wise (Hadamard) product.
    fn mmul_m<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstMatrix + ?Sized,
        B: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        elementwise(self, OpCode::Mul, a, b, "mmul_m");
    }

    fn mdiv_m<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstMatrix + ?Sized,
        B: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        elementwise(self, OpCode::Div, a, b, "mdiv_m");
    }

    // ── Matrix ∘ scalar ──

    fn madd_s<A>(&mut self, a: &A, s: &DynScalar<'_, MElemOf<Self>>)
    where
        A: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        broadcast(self, OpCode::Add, a, s, "madd_s");
    }

    fn msub_s<A>(&mut self, a: &A, s: &DynScalar<'_, MElemOf<Self>>)
    where
        A: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        broadcast(self, OpCode::Sub, a, s, "msub_s");
    }

    fn mmul_s<A>(&mut self, a: &A, s: &DynScalar<'_, MElemOf<Self>>)
    where
        A: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        broadcast(self, OpCode::Mul, a, s, "mmul_s");
    }

    fn mdiv_s<A>(&mut self, a: &A, s: &DynScalar<'_, MElemOf<Self>>)
    where
        A: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        broadcast(self, OpCode::Div, a, s, "mdiv_s");
    }

    // ── Products ──

    /// Matrix product `self = a · b`.
    fn mdot_m<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstMatrix + ?Sized,
        B: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        let (n, k) = a.dims();
        let (k2, m) = b.dims();
        check_dims("mdot_m", (k, m), (k2, m));
        check_dims("mdot_m", (n, m), self.dims());
        let mut t = Self::Scalar::null();
        for i in 0..n {
            for j in 0..m {
                let r = self.at(i, j);
                dot_into(r, &mut t, (0..k).map(|l| (a.const_at(i, l), b.const_at(l, j))));
            }
        }
    }

    /// `self = self · b` for a square `b`, one row at a time.
    fn mdot_m_assign<B>(&mut self, b: &B)
    where
        B: ConstMatrix + ?Sized,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        let (n, m) = self.dims();
        check_dims("mdot_m_assign", (m, m), b.dims());
        let mut t = Self::Scalar::null();
        let mut row: Vec<Self::Scalar> = (0..m).map(|_| Self::Scalar::null()).collect();
        for i in 0..n {
            for (j, r) in row.iter_mut().enumerate() {
                dot_into(r, &mut t, (0..m).map(|l| (self.const_at(i, l), b.const_at(l, j))));
            }
            for (j, r) in row.iter().enumerate() {
                self.at(i, j).set(r);
            }
        }
    }

    /// `self = a · self` for a square `a`, one column at a time.
    fn pre_mdot_m_assign<A>(&mut self, a: &A)
    where
        A: ConstMatrix + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        let (n, m) = self.dims();
        check_dims("pre_mdot_m_assign", (n, n), a.dims());
        let mut t = Self::Scalar::null();
        let mut col: Vec<Self::Scalar> = (0..n).map(|_| Self::Scalar::null()).collect();
        for j in 0..m {
            for (i, r) in col.iter_mut().enumerate() {
                dot_into(r, &mut t, (0..n).map(|l| (a.const_at(i, l), self.const_at(l, j))));
            }
            for (i, r) in col.iter().enumerate() {
                self.at(i, j).set(r);
            }
        }
    }

    /// Outer product `self = a bᵀ`.
    fn outer<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = MElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = MElemOf<Self>>,
    {
        check_dims("outer", (a.dim(), b.dim()), self.dims());
        for i in 0..a.dim() {
            for j in 0..b.dim() {
                self.at(i, j).mul(a.const_at(i), b.const_at(j));
            }
        }
    }

    // ── Permutations ──

    fn swap_rows(&mut self, i: usize, j: usize) {
        let (n, m) = self.dims();
        check_index((i.max(j), 0), (n, 1));
        if i != j {
            for k in 0..m {
                self.swap((i, k), (j, k));
            }
        }
    }

    fn swap_columns(&mut self, i: usize, j: usize) {
        let (n, m) = self.dims();
        check_index((0, i.max(j)), (1, m));
        if i != j {
            for k in 0..n {
                self.swap((k, i), (k, j));
            }
        }
    }

    /// Reorder rows so that the new row `i` is the old row `pi[i]`.
    fn permute_rows(&mut self, pi: &[usize]) -> Result<()> {
        check_permutation(pi, self.dims().0)?;
        apply_cycles(pi, |i, j| self.swap_rows(i, j));
        Ok(())
    }

    /// Reorder columns so that the new column `j` is the old column `pi[j]`.
    fn permute_columns(&mut self, pi: &[usize]) -> Result<()> {
        check_permutation(pi, self.dims().1)?;
        apply_cycles(pi, |i, j| self.swap_columns(i, j));
        Ok(())
    }

    /// `self = P self Pᵀ`, i.e. `new(i, j) = old(pi[i], pi[j])`.
    fn symmetric_permutation(&mut self, pi: &[usize]) -> Result<()> {
        let (n, m) = self.dims();
        if n != m {
            return Err(Error::NotSquare {
                op: "symmetric_permutation",
                rows: n,
                cols: m,
            });
        }
        self.permute_rows(pi)?;
        self.permute_columns(pi)
    }
}

/// `r = Σ xₖ yₖ`, using `t` as scratch. An empty sum resets `r`.
pub(crate) fn dot_into<'a, S, X, Y>(
    r: &mut S,
    t: &mut S,
    mut terms: impl Iterator<Item = (&'a X, &'a Y)>,
)
where
    S: Scalar,
    X: ConstScalar<Elem = S::Elem> + 'a,
    Y: ConstScalar<Elem = S::Elem> + 'a,
{
    match terms.next() {
        None => r.reset(),
        Some((x, y)) => {
            r.mul(x, y);
            for (x, y) in terms {
                t.mul(x, y);
                r.apply_with(OpCode::Add, &*t);
            }
        }
    }
}

/// Apply the permutation `new[i] = old[pi[i]]` as a sequence of swaps,
/// one cycle at a time. `pi` must be valid.
fn apply_cycles(pi: &[usize], mut swap: impl FnMut(usize, usize)) {
    let mut visited = vec![false; pi.len()];
    for start in 0..pi.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut j = start;
        while pi[j] != start {
            let k = pi[j];
            swap(j, k);
            visited[k] = true;
            j = k;
        }
    }
}

fn elementwise<R, A, B>(r: &mut R, op: OpCode, a: &A, b: &B, name: &'static str)
where
    R: Matrix + ?Sized,
    A: ConstMatrix + ?Sized,
    B: ConstMatrix + ?Sized,
    A::Scalar: ConstScalar<Elem = MElemOf<R>>,
    B::Scalar: ConstScalar<Elem = MElemOf<R>>,
{
    let (n, m) = r.dims();
    check_dims(name, (n, m), a.dims());
    check_dims(name, (n, m), b.dims());
    for i in 0..n {
        for j in 0..m {
            r.at(i, j).binary(op, a.const_at(i, j).into(), b.const_at(i, j).into());
        }
    }
}

fn broadcast<R, A>(r: &mut R, op: OpCode, a: &A, s: &DynScalar<'_, MElemOf<R>>, name: &'static str)
where
    R: Matrix + ?Sized,
    A: ConstMatrix + ?Sized,
    A::Scalar: ConstScalar<Elem = MElemOf<R>>,
{
    let (n, m) = r.dims();
    check_dims(name, (n, m), a.dims());
    for i in 0..n {
        for j in 0..m {
            r.at(i, j).binary(op, a.const_at(i, j).into(), Arg::Other(s));
        }
    }
}

/// `[[a, b],\n [c, d]]`.
pub(crate) fn fmt_matrix<M>(m: &M, f: &mut fmt::Formatter<'_>) -> fmt::Result
where
    M: ConstMatrix + ?Sized,
{
    let (rows, cols) = m.dims();
    write!(f, "[")?;
    for i in 0..rows {
        if i > 0 {
            write!(f, ",\n ")?;
        }
        write!(f, "[")?;
        for j in 0..cols {
            if j > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", m.const_at(i, j).value())?;
        }
        write!(f, "]")?;
    }
    write!(f, "]")
}
