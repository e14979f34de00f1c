//! Backing numeric types for scalars.
//!
//! [`Element`] maps a primitive Rust number onto the small arithmetic
//! contract the scalar types need. Float elements use IEEE arithmetic;
//! integer elements wrap on overflow and truncate on division, and evaluate
//! transcendental functions in `f64` before converting back.

use std::fmt::{Debug, Display};

use num_traits::{NumCast, One, Zero};

/// A primitive number that can back a scalar.
pub trait Element:
    Copy + PartialOrd + Default + Debug + Display + NumCast + Zero + One + Send + Sync + 'static
{
    /// Gap between one and the next representable value, as `f64`; one for
    /// integers.
    const EPSILON: f64;

    /// Convert to `f64`.
    fn as_f64(self) -> f64;

    /// Convert from `f64`. Integers truncate toward zero and saturate; NaN maps to 0.
    fn from_f64_lossy(v: f64) -> Self;

    fn elem_add(self, rhs: Self) -> Self;
    fn elem_sub(self, rhs: Self) -> Self;
    fn elem_mul(self, rhs: Self) -> Self;
    fn elem_div(self, rhs: Self) -> Self;
    fn elem_neg(self) -> Self;
}

macro_rules! impl_float_element {
    ($t:ty) => {
        impl Element for $t {
            const EPSILON: f64 = <$t>::EPSILON as f64;

            #[inline]
            fn as_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64_lossy(v: f64) -> Self {
                v as $t
            }
            #[inline]
            fn elem_add(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline]
            fn elem_sub(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline]
            fn elem_mul(self, rhs: Self) -> Self {
                self * rhs
            }
            #[inline]
            fn elem_div(self, rhs: Self) -> Self {
                self / rhs
            }
            #[inline]
            fn elem_neg(self) -> Self {
                -self
            }
        }
    };
}

macro_rules! impl_int_element {
    ($t:ty) => {
        impl Element for $t {
            const EPSILON: f64 = 1.0;

            #[inline]
            fn as_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64_lossy(v: f64) -> Self {
                // `as` truncates, saturates and maps NaN to zero
                v as $t
            }
            #[inline]
            fn elem_add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline]
            fn elem_sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline]
            fn elem_mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            #[inline]
            fn elem_div(self, rhs: Self) -> Self {
                self.wrapping_div(rhs)
            }
            #[inline]
            fn elem_neg(self) -> Self {
                self.wrapping_neg()
            }
        }
    };
}

impl_float_element!(f32);
impl_float_element!(f64);
impl_int_element!(i8);
impl_int_element!(i16);
impl_int_element!(i32);
impl_int_element!(i64);
