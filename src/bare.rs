use std::fmt::{self, Display};

use crate::element::Element;
use crate::opcode::{self, OpCode};
use crate::scalar::{Arg, ConstScalar, DynScalar, Parts, Scalar};

/// A plain value without derivatives, over any [`Element`].
///
/// Integer-backed bare scalars use wrapping arithmetic and truncating
/// division; transcendental operations evaluate in `f64` and convert back.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Bare<T: Element> {
    value: T,
}

impl<T: Element> Bare<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Bare { value }
    }

    #[inline]
    pub fn get(self) -> T {
        self.value
    }
}

impl<T: Element> From<T> for Bare<T> {
    #[inline]
    fn from(value: T) -> Self {
        Bare { value }
    }
}

impl<T: Element> Display for Bare<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.value, f)
    }
}

impl<T: Element> ConstScalar for Bare<T> {
    type Elem = T;

    #[inline]
    fn parts(&self) -> Parts<'_, T> {
        Parts::constant(self.value)
    }

    #[inline]
    fn order(&self) -> usize {
        0
    }
}

impl<T: Element> Scalar for Bare<T> {
    #[inline]
    fn from_f64(v: f64) -> Self {
        Bare::new(T::from_f64_lossy(v))
    }

    #[inline]
    fn null() -> Self {
        Bare::new(T::zero())
    }

    #[inline]
    fn set(&mut self, a: &DynScalar<'_, T>) {
        self.value = a.value();
    }

    #[inline]
    fn set_value(&mut self, v: T) {
        self.value = v;
    }

    #[inline]
    fn reset(&mut self) {
        self.value = T::zero();
    }

    fn unary(&mut self, op: OpCode, a: Arg<'_, T>) {
        let a = self.resolve(a);
        self.value = opcode::eval_value(op, a, T::zero());
    }

    fn binary(&mut self, op: OpCode, a: Arg<'_, T>, b: Arg<'_, T>) {
        let a = self.resolve(a);
        let b = self.resolve(b);
        self.value = opcode::eval_value(op, a, b);
    }
}

impl<T: Element> Bare<T> {
    #[inline]
    fn resolve(&self, arg: Arg<'_, T>) -> T {
        match arg {
            Arg::This => self.value,
            Arg::Other(s) => s.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_bare_wraps_and_truncates() {
        let mut r = Bare::<i8>::null();
        r.add(&Bare::new(120i8), &10i8);
        assert_eq!(r.get(), -126);
        r.div(&7i8, &2i8);
        assert_eq!(r.get(), 3);
        r.apply_with(OpCode::Mul, &5i8);
        assert_eq!(r.get(), 15);
    }

    #[test]
    fn transcendental_on_integers_truncates() {
        let mut r = Bare::<i32>::null();
        r.exp(&2i32);
        assert_eq!(r.get(), 7);
        r.log(&-1i32);
        assert_eq!(r.get(), 0);
    }

    #[test]
    fn set_ignores_derivatives() {
        let mut x = crate::Real::new(2.0f64);
        x.alloc(1, 2).unwrap();
        let mut r = Bare::<f64>::null();
        r.set(&x);
        assert_eq!(r.get(), 2.0);
        assert_eq!(r.order(), 0);
    }
}
