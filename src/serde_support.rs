//! JSON-friendly (de)serialization.
//!
//! `Real` serializes as `{ value, gradient, hessian }` with empty derivative
//! arrays omitted; dense vectors as their element sequence; sparse vectors as
//! `{ index, value, length }`; dense matrices as `{ values, rows, cols }` in
//! logical row-major order, so views are written as materialized matrices.
//!
//! JSON has no literal for NaN or the infinities, so non-finite numbers are
//! written as the strings `"NaN"`, `"inf"` and `"-inf"` and read back from
//! them.

use serde::de::Error as _;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bare::Bare;
use crate::element::Element;
use crate::float::Float;
use crate::matrix::{ConstMatrix, DenseMatrix, DenseMatrixBase, SparseMatrix, Storage};
use crate::real::Real;
use crate::scalar::{ConstScalar, Scalar};
use crate::vector::{ConstVector, DenseVector, SparseVector};

/// One element, with non-finite values spelled out as strings.
struct Number<T>(T);

impl<T: Element + Serialize> Serialize for Number<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0.as_f64();
        if v.is_nan() {
            serializer.serialize_str("NaN")
        } else if v == f64::INFINITY {
            serializer.serialize_str("inf")
        } else if v == f64::NEG_INFINITY {
            serializer.serialize_str("-inf")
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de, T: Element + Deserialize<'de>> Deserialize<'de> for Number<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Plain(T),
            Text(String),
        }

        let v = match Repr::<T>::deserialize(deserializer)? {
            Repr::Plain(v) => return Ok(Number(v)),
            Repr::Text(text) => match text.as_str() {
                "NaN" => f64::NAN,
                "inf" => f64::INFINITY,
                "-inf" => f64::NEG_INFINITY,
                other => {
                    return Err(D::Error::custom(format!(
                        "expected a number, \"NaN\", \"inf\" or \"-inf\", got {other:?}"
                    )))
                }
            },
        };
        Ok(Number(T::from_f64_lossy(v)))
    }
}

fn numbers<T: Copy>(values: &[T]) -> Vec<Number<T>> {
    values.iter().map(|&v| Number(v)).collect()
}

impl<F: Float + Serialize> Serialize for Real<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = 1 + usize::from(self.order() >= 1) + usize::from(self.order() >= 2);
        let mut s = serializer.serialize_struct("Real", fields)?;
        s.serialize_field("value", &Number(self.value()))?;
        if self.order() >= 1 {
            s.serialize_field("gradient", &numbers(self.gradient()))?;
        } else {
            s.skip_field("gradient")?;
        }
        if self.order() >= 2 {
            s.serialize_field("hessian", &numbers(self.hessian()))?;
        } else {
            s.skip_field("hessian")?;
        }
        s.end()
    }
}

impl<'de, F: Float + Deserialize<'de>> Deserialize<'de> for Real<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(bound(deserialize = "Number<F>: Deserialize<'de>"))]
        struct RealData<F> {
            value: Number<F>,
            #[serde(default)]
            gradient: Vec<Number<F>>,
            #[serde(default)]
            hessian: Vec<Number<F>>,
        }

        let data = RealData::<F>::deserialize(deserializer)?;
        let plain = |v: Vec<Number<F>>| -> Vec<F> { v.into_iter().map(|n| n.0).collect() };
        Real::from_buffers(data.value.0, plain(data.gradient), plain(data.hessian))
            .map_err(D::Error::custom)
    }
}

impl<T: Element + Serialize> Serialize for Bare<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Number(self.get()).serialize(serializer)
    }
}

impl<'de, T: Element + Deserialize<'de>> Deserialize<'de> for Bare<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Number::<T>::deserialize(deserializer).map(|n| Bare::new(n.0))
    }
}

impl<E: Serialize> Serialize for DenseVector<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for s in self.iter() {
            seq.serialize_element(s)?;
        }
        seq.end()
    }
}

impl<'de, E: Deserialize<'de>> Deserialize<'de> for DenseVector<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<E>::deserialize(deserializer).map(DenseVector::new)
    }
}

impl<E: ConstScalar + Serialize> Serialize for SparseVector<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (index, value): (Vec<usize>, Vec<&E>) = self.nonzero().unzip();
        let mut s = serializer.serialize_struct("SparseVector", 3)?;
        s.serialize_field("index", &index)?;
        s.serialize_field("value", &value)?;
        s.serialize_field("length", &self.dim())?;
        s.end()
    }
}

impl<'de, E: Scalar + Deserialize<'de>> Deserialize<'de> for SparseVector<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct SparseData<E> {
            index: Vec<usize>,
            value: Vec<E>,
            length: usize,
        }

        let data = SparseData::<E>::deserialize(deserializer)?;
        SparseVector::new(&data.index, data.value, data.length).map_err(D::Error::custom)
    }
}

impl<B> Serialize for DenseMatrixBase<B>
where
    B: Storage,
    B::Item: ConstScalar + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (rows, cols) = self.dims();
        let values: Vec<&B::Item> = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .map(|(i, j)| self.const_at(i, j))
            .collect();
        let mut s = serializer.serialize_struct("DenseMatrix", 3)?;
        s.serialize_field("values", &values)?;
        s.serialize_field("rows", &rows)?;
        s.serialize_field("cols", &cols)?;
        s.end()
    }
}

impl<'de, E: Deserialize<'de>> Deserialize<'de> for DenseMatrix<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct MatrixData<E> {
            values: Vec<E>,
            rows: usize,
            cols: usize,
        }

        let data = MatrixData::<E>::deserialize(deserializer)?;
        DenseMatrix::new(data.values, data.rows, data.cols).map_err(D::Error::custom)
    }
}

impl<E: ConstScalar + Serialize> Serialize for SparseMatrix<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (rows, cols) = self.dims();
        let mut entries: Vec<((usize, usize), &E)> = self.entries().collect();
        entries.sort_unstable_by_key(|&(ij, _)| ij);
        let (index, value): (Vec<(usize, usize)>, Vec<&E>) = entries.into_iter().unzip();
        let (row, col): (Vec<usize>, Vec<usize>) = index.into_iter().unzip();
        let mut s = serializer.serialize_struct("SparseMatrix", 5)?;
        s.serialize_field("row", &row)?;
        s.serialize_field("col", &col)?;
        s.serialize_field("value", &value)?;
        s.serialize_field("rows", &rows)?;
        s.serialize_field("cols", &cols)?;
        s.end()
    }
}

impl<'de, E: Scalar + Deserialize<'de>> Deserialize<'de> for SparseMatrix<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct SparseData<E> {
            row: Vec<usize>,
            col: Vec<usize>,
            value: Vec<E>,
            rows: usize,
            cols: usize,
        }

        let data = SparseData::<E>::deserialize(deserializer)?;
        SparseMatrix::new(&data.row, &data.col, data.value, data.rows, data.cols)
            .map_err(D::Error::custom)
    }
}
