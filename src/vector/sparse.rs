use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use crate::error::{check_dims, check_index, check_permutation, Error, Result};
use crate::matrix::SparseMatrix;
use crate::opcode::OpCode;
use crate::scalar::{ConstScalar, DynScalar, Scalar};

use super::{broadcast, elementwise, ConstVector, DenseVector, ElemOf, Vector};

/// Sparse vector of scalars.
///
/// Entries live in an index-ordered map; absent entries are exact zeros
/// without derivatives. Writes through [`Vector::at`] may leave zero entries
/// behind; they stay stored until [`compact`](SparseVector::compact).
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector<S> {
    values: BTreeMap<usize, S>,
    n: usize,
    zero: S,
}

impl<S: Scalar> SparseVector<S> {
    /// All-zero vector of logical length `n`.
    pub fn null(n: usize) -> Self {
        SparseVector {
            values: BTreeMap::new(),
            n,
            zero: S::null(),
        }
    }

    /// Vector of length `n` with `values[k]` stored at `indices[k]`.
    pub fn new(indices: &[usize], values: Vec<S>, n: usize) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(Error::LengthMismatch {
                what: "values",
                expected: indices.len(),
                got: values.len(),
            });
        }
        let mut r = SparseVector::<S>::null(n);
        for (&i, v) in indices.iter().zip(values) {
            if i >= n {
                return Err(Error::IndexOutOfBounds {
                    index: (i, 0),
                    dims: (n, 1),
                });
            }
            if r.values.insert(i, v).is_some() {
                return Err(Error::DuplicateIndex(i));
            }
        }
        Ok(r)
    }

    /// Constants from plain values.
    pub fn from_f64s(indices: &[usize], values: &[f64], n: usize) -> Result<Self> {
        SparseVector::new(indices, values.iter().map(|&v| S::from_f64(v)).collect(), n)
    }

    /// Drop stored entries whose value and derivatives are all zero.
    pub fn compact(&mut self) {
        let before = self.values.len();
        self.values.retain(|_, s| !is_plain_zero(s));
        log::debug!(
            "compacted sparse vector of dimension {}: {} -> {} entries",
            self.n,
            before,
            self.values.len()
        );
    }

    /// Sort by value, ascending unless `reverse`.
    ///
    /// Implicit zeros are placed between the non-positive and the positive
    /// stored entries, so the logical order is sorted as well.
    pub fn sort(&mut self, reverse: bool) {
        let mut sorted: Vec<S> = std::mem::take(&mut self.values).into_values().collect();
        sorted.sort_by(|a, b| {
            let o = a.value().partial_cmp(&b.value()).unwrap_or(Ordering::Equal);
            if reverse {
                o.reverse()
            } else {
                o
            }
        });
        let gap = self.n - sorted.len();
        let (positive_shift, other_shift) = if reverse { (0, gap) } else { (gap, 0) };
        let zero = S::Elem::default();
        for (i, s) in sorted.into_iter().enumerate() {
            let shift = if s.value() > zero { positive_shift } else { other_shift };
            self.values.insert(i + shift, s);
        }
    }

    /// Dense copy; absent entries become constant zeros.
    pub fn as_dense_vector(&self) -> DenseVector<S> {
        (0..self.n).map(|i| self.const_at(i).clone()).collect()
    }

    #[inline]
    pub fn as_sparse_vector(&self) -> SparseVector<S> {
        self.clone()
    }

    /// Append the entries of `a` after the current end.
    pub fn append(&mut self, a: &SparseVector<S>) {
        for (&i, s) in &a.values {
            self.values.insert(self.n + i, s.clone());
        }
        self.n += a.n;
    }

    /// Copy of the logical range `from..to`.
    pub fn slice(&self, from: usize, to: usize) -> SparseVector<S> {
        if from > to || to > self.n {
            panic!("invalid slice {from}..{to} of a vector of length {}", self.n);
        }
        let mut r = SparseVector::<S>::null(to - from);
        for (&i, s) in self.values.range(from..to) {
            r.values.insert(i - from, s.clone());
        }
        r
    }

    /// Reshape into a row-major `rows x cols` sparse matrix.
    pub fn into_matrix(self, rows: usize, cols: usize) -> Result<SparseMatrix<S>> {
        SparseMatrix::from_vector(self, rows, cols)
    }
}

impl<S> SparseVector<S> {
    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored indices in increasing order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.values.keys().copied()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (usize, S)> {
        self.values.into_iter()
    }

    pub(crate) fn insert(&mut self, i: usize, s: S) {
        check_index((i, 0), (self.n, 1));
        self.values.insert(i, s);
    }

    /// Exchange logical elements `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        check_index((i.max(j), 0), (self.n, 1));
        let a = self.values.remove(&i);
        let b = self.values.remove(&j);
        if let Some(a) = a {
            self.values.insert(j, a);
        }
        if let Some(b) = b {
            self.values.insert(i, b);
        }
    }

    /// Reverse the logical order.
    pub fn reverse_order(&mut self) {
        let n = self.n;
        self.values = std::mem::take(&mut self.values)
            .into_iter()
            .map(|(i, s)| (n - 1 - i, s))
            .collect();
    }

    /// Reorder so that the new element `i` is the old element `pi[i]`.
    pub fn permute(&mut self, pi: &[usize]) -> Result<()> {
        check_permutation(pi, self.n)?;
        let mut old = std::mem::take(&mut self.values);
        for (i, &k) in pi.iter().enumerate() {
            if let Some(s) = old.remove(&k) {
                self.values.insert(i, s);
            }
        }
        Ok(())
    }
}

fn is_plain_zero<S: ConstScalar>(s: &S) -> bool {
    let zero = S::Elem::default();
    let p = s.parts();
    p.value == zero
        && p.gradient.map_or(true, |g| g.iter().all(|&d| d == zero))
        && p.hessian.map_or(true, |h| h.iter().all(|&d| d == zero))
}

fn is_finite<S: ConstScalar + ?Sized>(s: &S) -> bool {
    s.get_f64().is_finite()
}

impl<S: ConstScalar> ConstVector for SparseVector<S> {
    type Scalar = S;

    #[inline]
    fn dim(&self) -> usize {
        self.n
    }

    #[track_caller]
    fn const_at(&self, i: usize) -> &S {
        check_index((i, 0), (self.n, 1));
        self.values.get(&i).unwrap_or(&self.zero)
    }

    fn nonzero(&self) -> impl Iterator<Item = (usize, &S)> + '_ {
        self.values.iter().map(|(&i, s)| (i, s))
    }
}

impl<S: Scalar> Vector for SparseVector<S> {
    #[track_caller]
    fn at(&mut self, i: usize) -> &mut S {
        check_index((i, 0), (self.n, 1));
        self.values.entry(i).or_insert_with(S::null)
    }

    fn nonzero_mut(&mut self) -> impl Iterator<Item = (usize, &mut S)> + '_ {
        self.values.iter_mut().map(|(&i, s)| (i, s))
    }

    fn set<A>(&mut self, a: &A)
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        check_dims("set", (self.n, 1), (a.dim(), 1));
        self.values.clear();
        for (i, s) in a.nonzero() {
            self.at(i).set(s);
        }
    }

    fn reset(&mut self) {
        self.values.clear();
    }

    fn vadd_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        self.combine_union(OpCode::Add, a, b, "vadd_v");
    }

    fn vsub_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        self.combine_union(OpCode::Sub, a, b, "vsub_v");
    }

    fn vmul_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        check_dims("vmul_v", (self.n, 1), (a.dim(), 1));
        check_dims("vmul_v", (self.n, 1), (b.dim(), 1));
        let ia: BTreeSet<usize> = a.nonzero().map(|(i, _)| i).collect();
        let ib: BTreeSet<usize> = b.nonzero().map(|(i, _)| i).collect();
        // a non-finite entry times an implicit zero is NaN, not zero
        let visited: BTreeSet<usize> = ia
            .intersection(&ib)
            .copied()
            .chain(a.nonzero().filter(|(_, s)| !is_finite(*s)).map(|(i, _)| i))
            .chain(b.nonzero().filter(|(_, s)| !is_finite(*s)).map(|(i, _)| i))
            .collect();
        self.values.clear();
        for i in visited {
            self.at(i).mul(a.const_at(i), b.const_at(i));
        }
    }

    fn vdiv_v<A, B>(&mut self, a: &A, b: &B)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        // 0/0 is NaN, so every entry is visited
        elementwise(self, OpCode::Div, a, b, "vdiv_v");
    }

    fn vmul_s<A>(&mut self, a: &A, s: &DynScalar<'_, ElemOf<Self>>)
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        if !is_finite(s) {
            broadcast(self, OpCode::Mul, a, s, "vmul_s");
            return;
        }
        check_dims("vmul_s", (self.n, 1), (a.dim(), 1));
        self.values.clear();
        for (i, ai) in a.nonzero() {
            self.at(i).mul(ai, s);
        }
    }

    fn vadd_v_assign<B>(&mut self, b: &B)
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        check_dims("vadd_v_assign", (self.n, 1), (b.dim(), 1));
        for (i, bi) in b.nonzero() {
            self.at(i).apply_with(OpCode::Add, bi);
        }
    }

    fn vsub_v_assign<B>(&mut self, b: &B)
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        check_dims("vsub_v_assign", (self.n, 1), (b.dim(), 1));
        for (i, bi) in b.nonzero() {
            self.at(i).apply_with(OpCode::Sub, bi);
        }
    }

    fn vmul_v_assign<B>(&mut self, b: &B)
    where
        B: ConstVector + ?Sized,
        B::Scalar: ConstScalar<Elem = ElemOf<Self>>,
    {
        check_dims("vmul_v_assign", (self.n, 1), (b.dim(), 1));
        for (&i, s) in self.values.iter_mut() {
            s.apply_with(OpCode::Mul, b.const_at(i));
        }
        for (i, bi) in b.nonzero() {
            if !is_finite(bi) && !self.values.contains_key(&i) {
                self.at(i).apply_with(OpCode::Mul, bi);
            }
        }
    }
}

impl<S: Scalar> SparseVector<S> {
    /// `self = op(a, b)` on the union of stored indices, for ops with
    /// `op(0, 0) = 0`.
    fn combine_union<A, B>(&mut self, op: OpCode, a: &A, b: &B, name: &'static str)
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = S::Elem>,
        B::Scalar: ConstScalar<Elem = S::Elem>,
    {
        check_dims(name, (self.n, 1), (a.dim(), 1));
        check_dims(name, (self.n, 1), (b.dim(), 1));
        let union: BTreeSet<usize> = a
            .nonzero()
            .map(|(i, _)| i)
            .chain(b.nonzero().map(|(i, _)| i))
            .collect();
        self.values.clear();
        for i in union {
            self.at(i).binary(op, a.const_at(i).into(), b.const_at(i).into());
        }
    }
}

impl<S: ConstScalar> Display for SparseVector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[", self.n)?;
        for (k, (i, s)) in self.values.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", i, s.value())?;
        }
        write!(f, "]")
    }
}
