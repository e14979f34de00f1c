use std::fmt::{self, Display};

use crate::error::{check_index, Error, Result};
use crate::scalar::{ConstScalar, Scalar};
use crate::vector::{ConstVector, SparseVector, Vector};

use super::{fmt_matrix, ConstMatrix, Matrix};

/// Sparse matrix backed by a [`SparseVector`] in row-major order.
///
/// When `transposed` is set the backing holds the `cols x rows` transpose,
/// so [`transpose`](SparseMatrix::transpose) is O(1).
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix<S> {
    values: SparseVector<S>,
    rows: usize,
    cols: usize,
    transposed: bool,
}

impl<S: Scalar> SparseMatrix<S> {
    /// All-zero `rows x cols` matrix.
    pub fn null(rows: usize, cols: usize) -> Self {
        SparseMatrix {
            values: SparseVector::null(rows * cols),
            rows,
            cols,
            transposed: false,
        }
    }

    /// Matrix with `values[k]` stored at `(row_indices[k], col_indices[k])`.
    pub fn new(
        row_indices: &[usize],
        col_indices: &[usize],
        values: Vec<S>,
        rows: usize,
        cols: usize,
    ) -> Result<Self> {
        if row_indices.len() != col_indices.len() {
            return Err(Error::LengthMismatch {
                what: "column indices",
                expected: row_indices.len(),
                got: col_indices.len(),
            });
        }
        let mut indices = Vec::with_capacity(row_indices.len());
        for (&i, &j) in row_indices.iter().zip(col_indices) {
            if i >= rows || j >= cols {
                return Err(Error::IndexOutOfBounds {
                    index: (i, j),
                    dims: (rows, cols),
                });
            }
            indices.push(i * cols + j);
        }
        let values = SparseVector::new(&indices, values, rows * cols)?;
        SparseMatrix::from_vector(values, rows, cols)
    }

    /// Constants from plain values.
    pub fn from_f64s(
        row_indices: &[usize],
        col_indices: &[usize],
        values: &[f64],
        rows: usize,
        cols: usize,
    ) -> Result<Self> {
        let values = values.iter().map(|&v| S::from_f64(v)).collect();
        SparseMatrix::new(row_indices, col_indices, values, rows, cols)
    }

    /// Reshape a vector of length `rows * cols`, read in row-major order.
    pub fn from_vector(values: SparseVector<S>, rows: usize, cols: usize) -> Result<Self> {
        if values.dim() != rows * cols {
            return Err(Error::LengthMismatch {
                what: "values",
                expected: rows * cols,
                got: values.dim(),
            });
        }
        Ok(SparseMatrix {
            values,
            rows,
            cols,
            transposed: false,
        })
    }

    /// Drop stored entries whose value and derivatives are all zero.
    pub fn compact(&mut self) {
        self.values.compact();
    }

    /// Transpose in place, moving the stored entries.
    pub fn tip(&mut self) {
        if !self.transposed {
            let (rows, cols) = (self.rows, self.cols);
            let old = std::mem::replace(&mut self.values, SparseVector::null(rows * cols));
            for (k, s) in old.into_entries() {
                let (i, j) = (k / cols, k % cols);
                self.values.insert(j * rows + i, s);
            }
            log::debug!("tip: transposed {rows}x{cols} sparse matrix in place");
        }
        self.transposed = false;
        std::mem::swap(&mut self.rows, &mut self.cols);
    }

    /// Copy of rows `rfrom..rto` and columns `cfrom..cto`.
    #[track_caller]
    pub fn slice(&self, rfrom: usize, rto: usize, cfrom: usize, cto: usize) -> SparseMatrix<S> {
        if rfrom > rto || rto > self.rows || cfrom > cto || cto > self.cols {
            panic!(
                "invalid slice [{rfrom}..{rto}, {cfrom}..{cto}] of a {}x{} matrix",
                self.rows, self.cols
            );
        }
        let mut r = SparseMatrix::<S>::null(rto - rfrom, cto - cfrom);
        for ((i, j), s) in self.entries() {
            if (rfrom..rto).contains(&i) && (cfrom..cto).contains(&j) {
                r.at(i - rfrom, j - cfrom).set(s);
            }
        }
        r
    }

    /// The row-major elements as a vector.
    pub fn into_vector(mut self) -> SparseVector<S> {
        if self.transposed {
            let (rows, cols) = (self.rows, self.cols);
            let old = std::mem::replace(&mut self.values, SparseVector::null(rows * cols));
            for (k, s) in old.into_entries() {
                let (i, j) = (k % rows, k / rows);
                self.values.insert(i * cols + j, s);
            }
        }
        self.values
    }
}

impl<S> SparseMatrix<S> {
    /// O(1) transpose.
    pub fn transpose(mut self) -> Self {
        std::mem::swap(&mut self.rows, &mut self.cols);
        self.transposed = !self.transposed;
        self
    }

    #[inline]
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.nnz()
    }

    #[inline]
    fn position(&self, i: usize, j: usize) -> usize {
        if self.transposed {
            j * self.rows + i
        } else {
            i * self.cols + j
        }
    }

    #[inline]
    fn logical(&self, k: usize) -> (usize, usize) {
        if self.transposed {
            (k % self.rows, k / self.rows)
        } else {
            (k / self.cols, k % self.cols)
        }
    }
}

impl<S: ConstScalar> SparseMatrix<S> {
    /// Stored entries as `((i, j), scalar)`, in backing order.
    pub fn entries(&self) -> impl Iterator<Item = ((usize, usize), &S)> + '_ {
        self.values.nonzero().map(|(k, s)| (self.logical(k), s))
    }
}

impl<S: ConstScalar> ConstMatrix for SparseMatrix<S> {
    type Scalar = S;

    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[track_caller]
    fn const_at(&self, i: usize, j: usize) -> &S {
        check_index((i, j), (self.rows, self.cols));
        self.values.const_at(self.position(i, j))
    }

    /// Fold over the stored entries only.
    fn reduce<R, Fun>(&self, init: R, mut f: Fun) -> R
    where
        Fun: FnMut(R, &S) -> R,
    {
        let mut r = init;
        for (_, s) in self.values.nonzero() {
            r = f(r, s);
        }
        r
    }
}

impl<S: Scalar> Matrix for SparseMatrix<S> {
    #[track_caller]
    fn at(&mut self, i: usize, j: usize) -> &mut S {
        check_index((i, j), (self.rows, self.cols));
        let k = self.position(i, j);
        self.values.at(k)
    }

    #[track_caller]
    fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        check_index(a, (self.rows, self.cols));
        check_index(b, (self.rows, self.cols));
        let (k1, k2) = (self.position(a.0, a.1), self.position(b.0, b.1));
        self.values.swap(k1, k2);
    }

    fn reset(&mut self) {
        self.values.reset();
    }

    /// Visit the stored entries only.
    fn map<Fun>(&mut self, f: Fun)
    where
        Fun: FnMut(&mut S),
    {
        self.values.map(f);
    }

    fn map_set<Fun>(&mut self, f: Fun)
    where
        Fun: FnMut(&S) -> S,
    {
        self.values.map_set(f);
    }
}

impl<S: ConstScalar> Display for SparseMatrix<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_matrix(self, f)
    }
}
