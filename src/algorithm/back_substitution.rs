//! Solve `a x = b` for an upper-triangular `a`.

use crate::error::{Error, Result};
use crate::matrix::{ConstMatrix, MElemOf};
use crate::opcode::OpCode;
use crate::scalar::{ConstScalar, Scalar};
use crate::vector::{ConstVector, DenseVector};

use super::square;

/// Solve `a x = b` where `a` is upper triangular; entries below the diagonal
/// are never read.
///
/// Fails when `a` is not square, `b` has the wrong length, or a diagonal
/// entry is exactly zero.
///
/// ```
/// use numbat::algorithm::back_substitution;
/// use numbat::{Bare, DenseMatrix, DenseVector};
///
/// let a = DenseMatrix::<Bare<f64>>::from_f64s(&[2.0, 1.0, 0.0, 4.0], 2, 2).unwrap();
/// let b = DenseVector::<Bare<f64>>::from_f64s(&[5.0, 8.0]);
/// let x = back_substitution(&a, &b).unwrap();
/// assert_eq!(x.to_string(), "[1.5, 2]");
/// ```
pub fn back_substitution<M, V>(a: &M, b: &V) -> Result<DenseVector<M::Scalar>>
where
    M: ConstMatrix + ?Sized,
    M::Scalar: Scalar,
    V: ConstVector + ?Sized,
    V::Scalar: ConstScalar<Elem = MElemOf<M>>,
{
    let n = square("back_substitution", a)?;
    if b.dim() != n {
        return Err(Error::DimensionMismatch {
            op: "back_substitution",
            expected: (n, 1),
            got: (b.dim(), 1),
        });
    }

    let zero = MElemOf::<M>::default();
    let mut x = DenseVector::<M::Scalar>::null(n);
    let mut s = M::Scalar::null();
    let mut t = M::Scalar::null();
    for i in (0..n).rev() {
        let pivot = a.const_at(i, i);
        if pivot.value() == zero {
            return Err(Error::ZeroPivot {
                op: "back_substitution",
                index: i,
            });
        }
        s.set(b.const_at(i));
        for j in i + 1..n {
            t.mul(a.const_at(i, j), &x[j]);
            s.apply_with(OpCode::Sub, &t);
        }
        x[i].div(&s, pivot);
    }
    Ok(x)
}
