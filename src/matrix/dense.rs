use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

use crate::bare::Bare;
use crate::error::{check_index, Error, Result};
use crate::float::Float;
use crate::real::{self, Real};
use crate::scalar::{ConstScalar, Scalar};
use crate::vector::{ConstVector, DenseVector};

use super::{fmt_matrix, ConstMatrix, Matrix};

/// Row-major backing of a dense matrix.
pub trait Storage {
    type Item;

    fn values(&self) -> &[Self::Item];
}

/// Backing that can be written through.
pub trait StorageMut: Storage {
    fn values_mut(&mut self) -> &mut [Self::Item];
}

impl<S> Storage for Vec<S> {
    type Item = S;

    #[inline]
    fn values(&self) -> &[S] {
        self
    }
}

impl<S> StorageMut for Vec<S> {
    #[inline]
    fn values_mut(&mut self) -> &mut [S] {
        self
    }
}

impl<S> Storage for &[S] {
    type Item = S;

    #[inline]
    fn values(&self) -> &[S] {
        self
    }
}

impl<S> Storage for &mut [S] {
    type Item = S;

    #[inline]
    fn values(&self) -> &[S] {
        self
    }
}

impl<S> StorageMut for &mut [S] {
    #[inline]
    fn values_mut(&mut self) -> &mut [S] {
        self
    }
}

/// Dense matrix over a row-major backing array.
///
/// The view fields map logical `(i, j)` into the backing: `row_offset` /
/// `col_offset` shift a slice, `row_max` / `col_max` are the extents of the
/// backing layout, and `transposed` swaps the roles of rows and columns.
/// [`t`](DenseMatrixBase::t) and [`slice`](DenseMatrixBase::slice) only
/// rewrite these fields.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrixBase<B> {
    values: B,
    rows: usize,
    cols: usize,
    row_offset: usize,
    row_max: usize,
    col_offset: usize,
    col_max: usize,
    transposed: bool,
}

/// Owned dense matrix.
pub type DenseMatrix<S> = DenseMatrixBase<Vec<S>>;

/// Borrowed read-only view.
pub type DenseMatrixView<'a, S> = DenseMatrixBase<&'a [S]>;

/// Borrowed mutable view.
pub type DenseMatrixViewMut<'a, S> = DenseMatrixBase<&'a mut [S]>;

impl<S> DenseMatrix<S> {
    /// Matrix over row-major `values`.
    pub fn new(values: Vec<S>, rows: usize, cols: usize) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(Error::LengthMismatch {
                what: "values",
                expected: rows * cols,
                got: values.len(),
            });
        }
        Ok(DenseMatrix::from_parts(values, rows, cols))
    }

    pub(crate) fn from_parts(values: Vec<S>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(values.len(), rows * cols);
        DenseMatrixBase {
            values,
            rows,
            cols,
            row_offset: 0,
            row_max: rows,
            col_offset: 0,
            col_max: cols,
            transposed: false,
        }
    }

    /// The row-major elements as a vector.
    pub fn into_vector(self) -> DenseVector<S> {
        DenseVector::new(self.values)
    }
}

impl<S: Scalar> DenseMatrix<S> {
    /// `rows x cols` constant zeros.
    pub fn null(rows: usize, cols: usize) -> Self {
        DenseMatrix::from_parts((0..rows * cols).map(|_| S::null()).collect(), rows, cols)
    }

    /// Constants from row-major plain values.
    pub fn from_f64s(values: &[f64], rows: usize, cols: usize) -> Result<Self> {
        DenseMatrix::new(values.iter().map(|&v| S::from_f64(v)).collect(), rows, cols)
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Self {
        let mut r = DenseMatrix::<S>::null(n, n);
        r.set_identity();
        r
    }

    /// Jacobian of `f` at `x`: `self[i][j] = ∂fᵢ/∂xⱼ`.
    ///
    /// `x` is copied and declared as first-order variables. `self` is
    /// reallocated when its dimensions do not match the output.
    pub fn jacobian<F, Fun>(&mut self, f: Fun, x: &DenseVector<Real<F>>)
    where
        F: Float,
        S: Scalar<Elem = F>,
        Fun: FnOnce(&DenseVector<Real<F>>) -> DenseVector<Real<F>>,
    {
        let mut x = x.clone();
        real::seed(1, x.as_mut_slice().iter_mut());
        let y = f(&x);
        let dims = (y.dim(), x.dim());
        if self.dims() != dims {
            log::debug!("jacobian: reallocating result from {:?} to {:?}", self.dims(), dims);
            *self = DenseMatrix::null(dims.0, dims.1);
        }
        for (i, yi) in y.iter().enumerate() {
            for j in 0..dims.1 {
                self.at(i, j).set(&Bare::new(yi.derivative(j)));
            }
        }
    }

    /// Hessian of `f` at `x`: `self[i][j] = ∂²f/∂xᵢ∂xⱼ`.
    ///
    /// `x` is copied and declared as second-order variables. `self` is
    /// reallocated unless it is `n x n`.
    pub fn hessian<F, Fun>(&mut self, f: Fun, x: &DenseVector<Real<F>>)
    where
        F: Float,
        S: Scalar<Elem = F>,
        Fun: FnOnce(&DenseVector<Real<F>>) -> Real<F>,
    {
        let n = x.dim();
        if self.dims() != (n, n) {
            log::debug!("hessian: reallocating result from {:?} to {:?}", self.dims(), (n, n));
            *self = DenseMatrix::null(n, n);
        }
        let mut x = x.clone();
        real::seed(2, x.as_mut_slice().iter_mut());
        let y = f(&x);
        for i in 0..n {
            for j in 0..n {
                self.at(i, j).set(&Bare::new(y.hessian_at(i, j)));
            }
        }
    }
}

impl<B: Storage> DenseMatrixBase<B> {
    /// Backing position of `(i, j)`.
    #[inline]
    #[track_caller]
    fn position(&self, i: usize, j: usize) -> usize {
        check_index((i, j), (self.rows, self.cols));
        if self.transposed {
            (self.col_offset + j) * self.row_max + (self.row_offset + i)
        } else {
            (self.row_offset + i) * self.col_max + (self.col_offset + j)
        }
    }

    fn with_values<V>(&self, values: V) -> DenseMatrixBase<V> {
        DenseMatrixBase {
            values,
            rows: self.rows,
            cols: self.cols,
            row_offset: self.row_offset,
            row_max: self.row_max,
            col_offset: self.col_offset,
            col_max: self.col_max,
            transposed: self.transposed,
        }
    }

    #[inline]
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// The view covers its whole backing in plain row-major order.
    fn is_full(&self) -> bool {
        self.row_offset == 0
            && self.col_offset == 0
            && self.row_max == self.rows
            && self.col_max == self.cols
            && self.values.values().len() == self.rows * self.cols
    }

    /// Read-only view of the whole matrix.
    pub fn as_view(&self) -> DenseMatrixView<'_, B::Item> {
        self.with_values(self.values.values())
    }

    /// Transposed view; no data is moved.
    pub fn t(&self) -> DenseMatrixView<'_, B::Item> {
        let mut v = self.as_view();
        v.flip();
        v
    }

    /// View of rows `rfrom..rto` and columns `cfrom..cto`.
    #[track_caller]
    pub fn slice(
        &self,
        rfrom: usize,
        rto: usize,
        cfrom: usize,
        cto: usize,
    ) -> DenseMatrixView<'_, B::Item> {
        let mut v = self.as_view();
        v.narrow(rfrom, rto, cfrom, cto);
        v
    }

    /// Row `i` as a contiguous slice, unless the view is transposed.
    #[track_caller]
    pub fn row_slice(&self, i: usize) -> Option<&[B::Item]> {
        check_index((i, 0), (self.rows, 1));
        if self.transposed {
            return None;
        }
        let start = (self.row_offset + i) * self.col_max + self.col_offset;
        Some(&self.values.values()[start..start + self.cols])
    }

    fn flip(&mut self) {
        std::mem::swap(&mut self.rows, &mut self.cols);
        std::mem::swap(&mut self.row_offset, &mut self.col_offset);
        std::mem::swap(&mut self.row_max, &mut self.col_max);
        self.transposed = !self.transposed;
    }

    #[track_caller]
    fn narrow(&mut self, rfrom: usize, rto: usize, cfrom: usize, cto: usize) {
        if rfrom > rto || rto > self.rows || cfrom > cto || cto > self.cols {
            panic!(
                "invalid slice [{rfrom}..{rto}, {cfrom}..{cto}] of a {}x{} matrix",
                self.rows, self.cols
            );
        }
        self.row_offset += rfrom;
        self.rows = rto - rfrom;
        self.col_offset += cfrom;
        self.cols = cto - cfrom;
    }
}

impl<B: StorageMut> DenseMatrixBase<B> {
    /// Mutable view of the whole matrix.
    pub fn as_view_mut(&mut self) -> DenseMatrixViewMut<'_, B::Item> {
        let DenseMatrixBase {
            values,
            rows,
            cols,
            row_offset,
            row_max,
            col_offset,
            col_max,
            transposed,
        } = self;
        DenseMatrixBase {
            values: values.values_mut(),
            rows: *rows,
            cols: *cols,
            row_offset: *row_offset,
            row_max: *row_max,
            col_offset: *col_offset,
            col_max: *col_max,
            transposed: *transposed,
        }
    }

    /// Mutable transposed view.
    pub fn t_mut(&mut self) -> DenseMatrixViewMut<'_, B::Item> {
        let mut v = self.as_view_mut();
        v.flip();
        v
    }

    /// Mutable view of rows `rfrom..rto` and columns `cfrom..cto`.
    #[track_caller]
    pub fn slice_mut(
        &mut self,
        rfrom: usize,
        rto: usize,
        cfrom: usize,
        cto: usize,
    ) -> DenseMatrixViewMut<'_, B::Item> {
        let mut v = self.as_view_mut();
        v.narrow(rfrom, rto, cfrom, cto);
        v
    }

    /// Transpose in place.
    ///
    /// A transposed view already holds its transpose in the backing, so only
    /// the view fields change. Otherwise the backing is permuted by following
    /// the cycles of `k ↦ rows·k mod (rows·cols − 1)`. Panics on a slice that
    /// does not cover its whole backing.
    #[track_caller]
    pub fn tip(&mut self) {
        if !self.is_full() {
            panic!(
                "tip requires a matrix covering its whole backing, got a {}x{} slice",
                self.rows, self.cols
            );
        }
        if self.transposed {
            self.flip();
            return;
        }
        let rows = self.rows;
        let values = self.values.values_mut();
        let mn = values.len();
        if mn > 1 {
            let mut visited = vec![false; mn];
            for cycle in 1..mn {
                if visited[cycle] {
                    continue;
                }
                let mut k = cycle;
                loop {
                    if k != mn - 1 {
                        k = rows * k % (mn - 1);
                    }
                    visited[k] = true;
                    values.swap(k, cycle);
                    if k == cycle {
                        break;
                    }
                }
            }
        }
        log::debug!("tip: transposed {}x{} matrix in place", self.rows, self.cols);
        std::mem::swap(&mut self.rows, &mut self.cols);
        std::mem::swap(&mut self.row_max, &mut self.col_max);
    }
}

impl<B> ConstMatrix for DenseMatrixBase<B>
where
    B: Storage,
    B::Item: ConstScalar,
{
    type Scalar = B::Item;

    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    #[track_caller]
    fn const_at(&self, i: usize, j: usize) -> &B::Item {
        &self.values.values()[self.position(i, j)]
    }
}

impl<B> Matrix for DenseMatrixBase<B>
where
    B: StorageMut,
    B::Item: Scalar,
{
    #[inline]
    #[track_caller]
    fn at(&mut self, i: usize, j: usize) -> &mut B::Item {
        let k = self.position(i, j);
        &mut self.values.values_mut()[k]
    }

    #[track_caller]
    fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        let k1 = self.position(a.0, a.1);
        let k2 = self.position(b.0, b.1);
        self.values.values_mut().swap(k1, k2);
    }
}

impl<B: Storage> Index<(usize, usize)> for DenseMatrixBase<B> {
    type Output = B::Item;

    #[inline]
    #[track_caller]
    fn index(&self, (i, j): (usize, usize)) -> &B::Item {
        &self.values.values()[self.position(i, j)]
    }
}

impl<B: StorageMut> IndexMut<(usize, usize)> for DenseMatrixBase<B> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut B::Item {
        let k = self.position(i, j);
        &mut self.values.values_mut()[k]
    }
}

impl<B> Display for DenseMatrixBase<B>
where
    B: Storage,
    B::Item: ConstScalar,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_matrix(self, f)
    }
}
