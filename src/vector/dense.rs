use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

use crate::error::{check_index, check_permutation, Error, Result};
use crate::float::Float;
use crate::matrix::DenseMatrix;
use crate::real::{self, Real};
use crate::scalar::{ConstScalar, Scalar};

use super::{ConstVector, SparseVector, Vector};

/// Contiguous vector of scalars.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DenseVector<S> {
    values: Vec<S>,
}

impl<S> DenseVector<S> {
    #[inline]
    pub fn new(values: Vec<S>) -> Self {
        DenseVector { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[S] {
        &self.values
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [S] {
        &mut self.values
    }

    #[inline]
    pub fn into_vec(self) -> Vec<S> {
        self.values
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.values.iter()
    }

    /// Exchange elements `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) {
        check_index((i.max(j), 0), (self.len(), 1));
        self.values.swap(i, j);
    }

    /// Reverse the element order.
    pub fn reverse_order(&mut self) {
        self.values.reverse();
    }

    /// Reorder so that the new element `i` is the old element `pi[i]`.
    pub fn permute(&mut self, pi: &[usize]) -> Result<()> {
        check_permutation(pi, self.len())?;
        let mut old: Vec<Option<S>> = self.values.drain(..).map(Some).collect();
        self.values.extend(pi.iter().filter_map(|&k| old[k].take()));
        Ok(())
    }

    /// Append the elements of `a`.
    pub fn append(&mut self, a: &DenseVector<S>)
    where
        S: Clone,
    {
        self.values.extend_from_slice(&a.values);
    }

    /// Copy of the elements `from..to`.
    pub fn slice(&self, from: usize, to: usize) -> DenseVector<S>
    where
        S: Clone,
    {
        if from > to || to > self.len() {
            panic!("invalid slice {from}..{to} of a vector of length {}", self.len());
        }
        DenseVector::new(self.values[from..to].to_vec())
    }

    /// Reshape into a row-major `rows x cols` matrix.
    pub fn into_matrix(self, rows: usize, cols: usize) -> Result<DenseMatrix<S>> {
        DenseMatrix::new(self.values, rows, cols)
    }
}

impl<S: Scalar> DenseVector<S> {
    /// `n` constant zeros.
    pub fn null(n: usize) -> Self {
        DenseVector::new((0..n).map(|_| S::null()).collect())
    }

    /// Constants from plain values.
    pub fn from_f64s(values: &[f64]) -> Self {
        DenseVector::new(values.iter().map(|&v| S::from_f64(v)).collect())
    }

    /// Sort by value, ascending unless `reverse`. Derivatives move with
    /// their values; NaN compares equal to everything.
    pub fn sort(&mut self, reverse: bool) {
        self.values.sort_by(|a, b| {
            let o = a.value().partial_cmp(&b.value()).unwrap_or(Ordering::Equal);
            if reverse {
                o.reverse()
            } else {
                o
            }
        });
    }

    /// Sparse copy holding every element that is not a plain zero.
    pub fn as_sparse_vector(&self) -> SparseVector<S> {
        let mut r = SparseVector::<S>::null(self.len());
        for (i, s) in self.values.iter().enumerate() {
            if s.value() != S::Elem::default() || s.order() > 0 {
                r.at(i).set(s);
            }
        }
        r
    }

    #[inline]
    pub fn as_dense_vector(&self) -> DenseVector<S> {
        self.clone()
    }
}

impl<F: Float> DenseVector<Real<F>> {
    /// Declare every element an independent variable, in index order.
    pub fn variables(&mut self, order: usize) -> Result<()> {
        if order > 2 {
            return Err(Error::InvalidOrder(order));
        }
        real::seed(order, self.values.iter_mut());
        Ok(())
    }
}

impl<S: ConstScalar> ConstVector for DenseVector<S> {
    type Scalar = S;

    #[inline]
    fn dim(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[track_caller]
    fn const_at(&self, i: usize) -> &S {
        check_index((i, 0), (self.len(), 1));
        &self.values[i]
    }

    fn nonzero(&self) -> impl Iterator<Item = (usize, &S)> + '_ {
        self.values.iter().enumerate()
    }
}

impl<S: Scalar> Vector for DenseVector<S> {
    #[inline]
    #[track_caller]
    fn at(&mut self, i: usize) -> &mut S {
        check_index((i, 0), (self.len(), 1));
        &mut self.values[i]
    }

    fn nonzero_mut(&mut self) -> impl Iterator<Item = (usize, &mut S)> + '_ {
        self.values.iter_mut().enumerate()
    }
}

impl<S> Index<usize> for DenseVector<S> {
    type Output = S;

    #[inline]
    #[track_caller]
    fn index(&self, i: usize) -> &S {
        check_index((i, 0), (self.values.len(), 1));
        &self.values[i]
    }
}

impl<S> IndexMut<usize> for DenseVector<S> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, i: usize) -> &mut S {
        check_index((i, 0), (self.values.len(), 1));
        &mut self.values[i]
    }
}

impl<S> From<Vec<S>> for DenseVector<S> {
    #[inline]
    fn from(values: Vec<S>) -> Self {
        DenseVector::new(values)
    }
}

impl<S> FromIterator<S> for DenseVector<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        DenseVector::new(iter.into_iter().collect())
    }
}

impl<S> IntoIterator for DenseVector<S> {
    type Item = S;
    type IntoIter = std::vec::IntoIter<S>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<S: ConstScalar> Display for DenseVector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, s) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", s.value())?;
        }
        write!(f, "]")
    }
}
