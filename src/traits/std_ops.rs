use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::float::Float;
use crate::opcode::OpCode;
use crate::real::Real;
use crate::scalar::{Arg, Scalar};

// ──────────────────────────────────────────────
//  Real<F> operators
// ──────────────────────────────────────────────
//
// Owned left operands reuse their buffers (`self = self op rhs` through
// `Arg::This`); reference operands allocate a fresh result.

macro_rules! impl_real_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:expr) => {
        impl<F: Float> $trait<&Real<F>> for &Real<F> {
            type Output = Real<F>;
            #[inline]
            fn $method(self, rhs: &Real<F>) -> Real<F> {
                let mut r = Real::null();
                r.binary($op, Arg::Other(self), Arg::Other(rhs));
                r
            }
        }

        impl<F: Float> $trait<&Real<F>> for Real<F> {
            type Output = Real<F>;
            #[inline]
            fn $method(mut self, rhs: &Real<F>) -> Real<F> {
                self.binary($op, Arg::This, Arg::Other(rhs));
                self
            }
        }

        impl<F: Float> $trait for Real<F> {
            type Output = Real<F>;
            #[inline]
            fn $method(mut self, rhs: Real<F>) -> Real<F> {
                self.binary($op, Arg::This, Arg::Other(&rhs));
                self
            }
        }

        impl<F: Float> $trait<Real<F>> for &Real<F> {
            type Output = Real<F>;
            #[inline]
            fn $method(self, mut rhs: Real<F>) -> Real<F> {
                rhs.binary($op, Arg::Other(self), Arg::This);
                rhs
            }
        }

        impl<F: Float> $assign_trait<&Real<F>> for Real<F> {
            #[inline]
            fn $assign_method(&mut self, rhs: &Real<F>) {
                self.binary($op, Arg::This, Arg::Other(rhs));
            }
        }

        impl<F: Float> $assign_trait for Real<F> {
            #[inline]
            fn $assign_method(&mut self, rhs: Real<F>) {
                self.binary($op, Arg::This, Arg::Other(&rhs));
            }
        }
    };
}

impl_real_binary_op!(Add, add, AddAssign, add_assign, OpCode::Add);
impl_real_binary_op!(Sub, sub, SubAssign, sub_assign, OpCode::Sub);
impl_real_binary_op!(Mul, mul, MulAssign, mul_assign, OpCode::Mul);
impl_real_binary_op!(Div, div, DivAssign, div_assign, OpCode::Div);

impl<F: Float> Neg for Real<F> {
    type Output = Real<F>;
    #[inline]
    fn neg(mut self) -> Real<F> {
        self.unary(OpCode::Neg, Arg::This);
        self
    }
}

impl<F: Float> Neg for &Real<F> {
    type Output = Real<F>;
    #[inline]
    fn neg(self) -> Real<F> {
        let mut r = Real::null();
        r.unary(OpCode::Neg, Arg::Other(self));
        r
    }
}

impl<F: Float> Sum for Real<F> {
    fn sum<I: Iterator<Item = Real<F>>>(iter: I) -> Self {
        iter.fold(Real::null(), |acc, x| acc + x)
    }
}

impl<'a, F: Float> Sum<&'a Real<F>> for Real<F> {
    fn sum<I: Iterator<Item = &'a Real<F>>>(iter: I) -> Self {
        iter.fold(Real::null(), |acc, x| acc + x)
    }
}

// Mixed ops: Real<F> with primitive floats, generated for f32 and f64.
macro_rules! impl_real_const_op {
    ($f:ty, $trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:expr) => {
        impl $trait<$f> for Real<$f> {
            type Output = Real<$f>;
            #[inline]
            fn $method(mut self, rhs: $f) -> Real<$f> {
                self.binary($op, Arg::This, Arg::Other(&rhs));
                self
            }
        }

        impl $trait<$f> for &Real<$f> {
            type Output = Real<$f>;
            #[inline]
            fn $method(self, rhs: $f) -> Real<$f> {
                let mut r = Real::null();
                r.binary($op, Arg::Other(self), Arg::Other(&rhs));
                r
            }
        }

        impl $trait<Real<$f>> for $f {
            type Output = Real<$f>;
            #[inline]
            fn $method(self, mut rhs: Real<$f>) -> Real<$f> {
                rhs.binary($op, Arg::Other(&self), Arg::This);
                rhs
            }
        }

        impl $trait<&Real<$f>> for $f {
            type Output = Real<$f>;
            #[inline]
            fn $method(self, rhs: &Real<$f>) -> Real<$f> {
                let mut r = Real::null();
                r.binary($op, Arg::Other(&self), Arg::Other(rhs));
                r
            }
        }

        impl $assign_trait<$f> for Real<$f> {
            #[inline]
            fn $assign_method(&mut self, rhs: $f) {
                self.binary($op, Arg::This, Arg::Other(&rhs));
            }
        }
    };
}

macro_rules! impl_real_const_ops {
    ($f:ty) => {
        impl_real_const_op!($f, Add, add, AddAssign, add_assign, OpCode::Add);
        impl_real_const_op!($f, Sub, sub, SubAssign, sub_assign, OpCode::Sub);
        impl_real_const_op!($f, Mul, mul, MulAssign, mul_assign, OpCode::Mul);
        impl_real_const_op!($f, Div, div, DivAssign, div_assign, OpCode::Div);
    };
}

impl_real_const_ops!(f32);
impl_real_const_ops!(f64);
