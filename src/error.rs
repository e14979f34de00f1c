//! Error type shared by the fallible parts of numbat.
//!
//! Arithmetic on mismatched operands is a programming error and panics; the
//! panic message is the rendered [`Error`] so the offending sizes and indices
//! are always reported the same way.

use thiserror::Error;

/// Result alias using numbat's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by scalar, vector and matrix operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operand dimensions disagree.
    #[error("dimension mismatch in {op}: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// Operation that detected the mismatch.
        op: &'static str,
        /// Dimensions required by the destination or first operand.
        expected: (usize, usize),
        /// Dimensions that were supplied.
        got: (usize, usize),
    },

    /// An index lies outside the valid range.
    #[error("index {index:?} out of bounds for dimension {dims:?}")]
    IndexOutOfBounds {
        /// Offending `(row, col)`; vectors use `col = 0`.
        index: (usize, usize),
        /// Valid `(rows, cols)`; vectors use `cols = 1`.
        dims: (usize, usize),
    },

    /// Derivative order outside `0..=2`.
    #[error("invalid derivative order {0}; supported orders are 0, 1 and 2")]
    InvalidOrder(usize),

    /// A square matrix was required.
    #[error("{op} requires a square matrix, got {rows}x{cols}")]
    NotSquare {
        /// Operation name.
        op: &'static str,
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// A factorization needs a positive pivot and met a non-positive one.
    #[error("matrix is not positive definite: pivot {0} is not positive")]
    NotPositiveDefinite(usize),

    /// A triangular solve or factorization met a zero pivot.
    #[error("{op}: zero pivot at row {index}")]
    ZeroPivot {
        /// Operation name.
        op: &'static str,
        /// Row of the zero pivot.
        index: usize,
    },

    /// A permutation vector is malformed.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// A sparse index appeared more than once.
    #[error("index {0} appeared multiple times")]
    DuplicateIndex(usize),

    /// Two parallel input sequences differ in length.
    #[error("length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch {
        /// Which input was too short or too long.
        what: &'static str,
        /// Expected number of entries.
        expected: usize,
        /// Actual number of entries.
        got: usize,
    },
}

/// Panic with a dimension mismatch unless `expected == got`.
#[inline]
#[track_caller]
pub(crate) fn check_dims(op: &'static str, expected: (usize, usize), got: (usize, usize)) {
    if expected != got {
        panic!("{}", Error::DimensionMismatch { op, expected, got });
    }
}

/// Panic with an out-of-bounds error unless `index < dims` component-wise.
#[inline]
#[track_caller]
pub(crate) fn check_index(index: (usize, usize), dims: (usize, usize)) {
    if index.0 >= dims.0 || index.1 >= dims.1 {
        panic!("{}", Error::IndexOutOfBounds { index, dims });
    }
}

/// Validate that `pi` is a permutation of `0..n`.
pub(crate) fn check_permutation(pi: &[usize], n: usize) -> Result<()> {
    if pi.len() != n {
        return Err(Error::InvalidPermutation(format!(
            "expected {n} entries, got {}",
            pi.len()
        )));
    }
    let mut seen = vec![false; n];
    for &k in pi {
        if k >= n {
            return Err(Error::InvalidPermutation(format!("index {k} out of range 0..{n}")));
        }
        if std::mem::replace(&mut seen[k], true) {
            return Err(Error::InvalidPermutation(format!("index {k} repeated")));
        }
    }
    Ok(())
}
