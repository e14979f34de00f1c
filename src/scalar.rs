//! Scalar contracts.
//!
//! [`ConstScalar`] is the read-only, object-safe view every operand offers:
//! a value plus optional gradient and Hessian buffers. [`Scalar`] is the
//! mutable destination side. Operations write `self = f(a, b)` where each
//! operand is either another scalar or the destination itself ([`Arg::This`]),
//! so `x = x * y` needs neither a temporary nor a second borrow of `x`.
//!
//! Plain numbers (`f32`, `f64`, `i8` .. `i64`) are constants: they implement
//! [`ConstScalar`] with no derivatives and can be passed anywhere an operand
//! is expected.

use std::fmt::Debug;

use num_traits::{One, Zero};

use crate::bare::Bare;
use crate::element::Element;
use crate::error::check_dims;
use crate::matrix::ConstMatrix;
use crate::opcode::OpCode;
use crate::vector::ConstVector;

/// Borrowed contents of a scalar.
///
/// `gradient` is present for order >= 1, `hessian` (row-major `n * n`) for
/// order 2.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Parts<'a, E> {
    pub value: E,
    pub gradient: Option<&'a [E]>,
    pub hessian: Option<&'a [E]>,
}

impl<E> Parts<'_, E> {
    /// Parts of a constant (no derivative buffers).
    #[inline]
    pub fn constant(value: E) -> Self {
        Parts {
            value,
            gradient: None,
            hessian: None,
        }
    }
}

/// A scalar operand as a trait object.
pub type DynScalar<'a, E> = dyn ConstScalar<Elem = E> + 'a;

/// Read-only view of a scalar.
pub trait ConstScalar: Send + Sync {
    /// Backing numeric type.
    type Elem: Element;

    fn parts(&self) -> Parts<'_, Self::Elem>;

    #[inline]
    fn value(&self) -> Self::Elem {
        self.parts().value
    }

    #[inline]
    fn get_f64(&self) -> f64 {
        self.value().as_f64()
    }

    /// Allocated derivative order: 0, 1 or 2.
    fn order(&self) -> usize {
        let p = self.parts();
        if p.hessian.is_some() {
            2
        } else if p.gradient.is_some() {
            1
        } else {
            0
        }
    }

    /// Number of variables the derivative buffers are sized for.
    fn n_variables(&self) -> usize {
        self.parts().gradient.map_or(0, <[_]>::len)
    }

    /// First derivative with respect to variable `i`; zero when unallocated.
    fn derivative(&self, i: usize) -> Self::Elem {
        self.parts()
            .gradient
            .and_then(|g| g.get(i).copied())
            .unwrap_or_else(Self::Elem::zero)
    }

    /// Second derivative with respect to variables `i` and `j`; zero when unallocated.
    fn hessian_at(&self, i: usize, j: usize) -> Self::Elem {
        let p = self.parts();
        match (p.gradient, p.hessian) {
            (Some(g), Some(h)) if i < g.len() && j < g.len() => h[i * g.len() + j],
            _ => Self::Elem::zero(),
        }
    }

    /// Value equality within `epsilon`; NaN equals NaN and infinities equal
    /// infinities of the same sign.
    fn equals(&self, b: &DynScalar<'_, Self::Elem>, epsilon: f64) -> bool {
        let v1 = self.get_f64();
        let v2 = b.get_f64();
        (v1 - v2).abs() < epsilon
            || (v1.is_nan() && v2.is_nan())
            || (v1 == f64::INFINITY && v2 == f64::INFINITY)
            || (v1 == f64::NEG_INFINITY && v2 == f64::NEG_INFINITY)
    }

    #[inline]
    fn greater(&self, b: &DynScalar<'_, Self::Elem>) -> bool {
        self.value() > b.value()
    }

    #[inline]
    fn smaller(&self, b: &DynScalar<'_, Self::Elem>) -> bool {
        self.value() < b.value()
    }

    /// -1, 0 or 1. NaN has sign 0.
    fn sign(&self) -> i32 {
        let v = self.value();
        let zero = Self::Elem::zero();
        if v < zero {
            -1
        } else if v > zero {
            1
        } else {
            0
        }
    }
}

macro_rules! impl_const_scalar_for_primitive {
    ($($t:ty),*) => {
        $(
            impl ConstScalar for $t {
                type Elem = $t;

                #[inline]
                fn parts(&self) -> Parts<'_, $t> {
                    Parts::constant(*self)
                }
            }
        )*
    };
}

impl_const_scalar_for_primitive!(f32, f64, i8, i16, i32, i64);

/// An operand of a scalar operation.
pub enum Arg<'a, E> {
    /// The destination scalar itself.
    This,
    Other(&'a DynScalar<'a, E>),
}

impl<E> Clone for Arg<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Arg<'_, E> {}

impl<'a, E, S> From<&'a S> for Arg<'a, E>
where
    S: ConstScalar<Elem = E> + 'a,
{
    #[inline]
    fn from(s: &'a S) -> Self {
        Arg::Other(s)
    }
}

/// A mutable scalar: the destination of every operation.
///
/// Implementors provide storage ([`set`](Scalar::set), [`reset`](Scalar::reset))
/// and the two kernels [`unary`](Scalar::unary) and [`binary`](Scalar::binary);
/// every named operation is built on those.
pub trait Scalar: ConstScalar + Clone + Debug + 'static {
    /// A constant with value `v` (converted to the element type).
    fn from_f64(v: f64) -> Self;

    /// A constant zero without derivatives.
    fn null() -> Self;

    /// Copy value and derivatives from `a`, adopting its allocation.
    fn set(&mut self, a: &DynScalar<'_, Self::Elem>);

    /// Overwrite the value, keeping derivatives.
    fn set_value(&mut self, v: Self::Elem);

    /// Zero the value and all derivatives, keeping the allocation.
    fn reset(&mut self);

    /// `self = op(a)`.
    fn unary(&mut self, op: OpCode, a: Arg<'_, Self::Elem>);

    /// `self = op(a, b)`.
    fn binary(&mut self, op: OpCode, a: Arg<'_, Self::Elem>, b: Arg<'_, Self::Elem>);

    #[inline]
    fn set_f64(&mut self, v: f64) {
        self.set_value(Self::Elem::from_f64_lossy(v));
    }

    /// `self = op(self)`.
    #[inline]
    fn apply(&mut self, op: OpCode) -> &mut Self {
        self.unary(op, Arg::This);
        self
    }

    /// `self = op(self, b)`.
    #[inline]
    fn apply_with(&mut self, op: OpCode, b: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(op, Arg::This, Arg::Other(b));
        self
    }

    // ── Arithmetic ──

    fn add(&mut self, a: &DynScalar<'_, Self::Elem>, b: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(OpCode::Add, Arg::Other(a), Arg::Other(b));
        self
    }

    fn sub(&mut self, a: &DynScalar<'_, Self::Elem>, b: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(OpCode::Sub, Arg::Other(a), Arg::Other(b));
        self
    }

    fn mul(&mut self, a: &DynScalar<'_, Self::Elem>, b: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(OpCode::Mul, Arg::Other(a), Arg::Other(b));
        self
    }

    fn div(&mut self, a: &DynScalar<'_, Self::Elem>, b: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(OpCode::Div, Arg::Other(a), Arg::Other(b));
        self
    }

    /// `a^k`. The derivative with respect to `k` is NaN for a negative base.
    fn pow(&mut self, a: &DynScalar<'_, Self::Elem>, k: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(OpCode::Pow, Arg::Other(a), Arg::Other(k));
        self
    }

    /// Strict comparison: ties select `b`.
    fn min(&mut self, a: &DynScalar<'_, Self::Elem>, b: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(OpCode::Min, Arg::Other(a), Arg::Other(b));
        self
    }

    /// Strict comparison: ties select `b`.
    fn max(&mut self, a: &DynScalar<'_, Self::Elem>, b: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.binary(OpCode::Max, Arg::Other(a), Arg::Other(b));
        self
    }

    // ── Unary ──

    fn neg(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Neg, Arg::Other(a));
        self
    }

    fn abs(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Abs, Arg::Other(a));
        self
    }

    fn sqrt(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Sqrt, Arg::Other(a));
        self
    }

    fn exp(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Exp, Arg::Other(a));
        self
    }

    fn log(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Log, Arg::Other(a));
        self
    }

    fn log1p(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Log1p, Arg::Other(a));
        self
    }

    fn sin(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Sin, Arg::Other(a));
        self
    }

    fn cos(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Cos, Arg::Other(a));
        self
    }

    fn tan(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Tan, Arg::Other(a));
        self
    }

    fn sinh(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Sinh, Arg::Other(a));
        self
    }

    fn cosh(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Cosh, Arg::Other(a));
        self
    }

    fn tanh(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Tanh, Arg::Other(a));
        self
    }

    // ── Special functions ──

    fn erf(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Erf, Arg::Other(a));
        self
    }

    fn erfc(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Erfc, Arg::Other(a));
        self
    }

    fn log_erfc(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::LogErfc, Arg::Other(a));
        self
    }

    fn gamma(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Gamma, Arg::Other(a));
        self
    }

    /// `ln Γ(a)`; NaN where `Γ(a) < 0`.
    fn lgamma(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::Lgamma, Arg::Other(a));
        self
    }

    /// Multivariate log-gamma of dimension `k`.
    fn mlgamma(&mut self, a: &DynScalar<'_, Self::Elem>, k: usize) -> &mut Self {
        self.unary(OpCode::Mlgamma(k), Arg::Other(a));
        self
    }

    /// Regularized lower incomplete gamma `P(a, x)`, differentiated in `x`.
    fn gamma_p(&mut self, a: f64, x: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::GammaP(a), Arg::Other(x));
        self
    }

    fn bessel_i(&mut self, v: f64, x: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::BesselI(v), Arg::Other(x));
        self
    }

    fn log_bessel_i(&mut self, v: f64, x: &DynScalar<'_, Self::Elem>) -> &mut Self {
        self.unary(OpCode::LogBesselI(v), Arg::Other(x));
        self
    }

    // ── Composites ──

    /// `ln(exp(a) + exp(b))`.
    fn log_add(
        &mut self,
        a: &DynScalar<'_, Self::Elem>,
        b: &DynScalar<'_, Self::Elem>,
    ) -> &mut Self {
        let (a, b) = if a.greater(b) { (b, a) } else { (a, b) };
        if a.get_f64().is_infinite() {
            // a = -inf, or a = b = +inf
            self.set(b);
            return self;
        }
        let mut t = Self::null();
        t.sub(a, b).apply(OpCode::Exp).apply(OpCode::Log1p);
        self.add(&t, b)
    }

    /// `ln(exp(a) - exp(b))`.
    fn log_sub(
        &mut self,
        a: &DynScalar<'_, Self::Elem>,
        b: &DynScalar<'_, Self::Elem>,
    ) -> &mut Self {
        if b.get_f64() == f64::NEG_INFINITY {
            self.set(a);
            return self;
        }
        let mut t = Self::null();
        t.sub(b, a).apply(OpCode::Exp).apply(OpCode::Neg).apply(OpCode::Log1p);
        self.add(a, &t)
    }

    /// `ln(1 + exp(a))` without overflow.
    fn log1p_exp(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        let v = a.get_f64();
        if v <= -37.0 {
            self.exp(a)
        } else if v <= 18.0 {
            let mut t = Self::null();
            t.exp(a);
            self.log1p(&t)
        } else if v <= 33.3 {
            let mut t = Self::null();
            t.neg(a).apply(OpCode::Exp);
            self.add(a, &t)
        } else {
            self.set(a);
            self
        }
    }

    /// Numerically stable `1 / (1 + exp(-a))`.
    fn sigmoid(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        let one = Bare::new(Self::Elem::one());
        let mut t = Self::null();
        if a.get_f64() >= 0.0 {
            t.neg(a).apply(OpCode::Exp).apply_with(OpCode::Add, &one);
            self.div(&one, &t)
        } else {
            t.exp(a);
            let mut u = Self::null();
            u.add(&one, &t);
            self.div(&t, &u)
        }
    }

    /// `1 / (1 + exp(-a))` without branching.
    fn logistic(&mut self, a: &DynScalar<'_, Self::Elem>) -> &mut Self {
        let one = Bare::new(Self::Elem::one());
        let mut t = Self::null();
        t.neg(a).apply(OpCode::Exp).apply_with(OpCode::Add, &one);
        self.div(&one, &t)
    }

    // ── Reductions ──

    /// Dot product `Σ aᵢ bᵢ`.
    fn vdot_v<A, B>(&mut self, a: &A, b: &B) -> &mut Self
    where
        A: ConstVector + ?Sized,
        B: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = Self::Elem>,
        B::Scalar: ConstScalar<Elem = Self::Elem>,
    {
        check_dims("vdot_v", (a.dim(), 1), (b.dim(), 1));
        self.reset();
        let mut t = Self::null();
        for (i, ai) in a.nonzero() {
            t.mul(ai, b.const_at(i));
            self.apply_with(OpCode::Add, &t);
        }
        self
    }

    /// Euclidean norm.
    fn vnorm<A>(&mut self, a: &A) -> &mut Self
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = Self::Elem>,
    {
        self.reset();
        let mut t = Self::null();
        for (_, ai) in a.nonzero() {
            t.mul(ai, ai);
            self.apply_with(OpCode::Add, &t);
        }
        self.apply(OpCode::Sqrt)
    }

    /// Arithmetic mean over all `dim()` entries, implicit zeros included.
    fn vmean<A>(&mut self, a: &A) -> &mut Self
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = Self::Elem>,
    {
        self.reset();
        for (_, ai) in a.nonzero() {
            self.apply_with(OpCode::Add, ai);
        }
        let n = Bare::new(Self::Elem::from_f64_lossy(a.dim() as f64));
        self.apply_with(OpCode::Div, &n)
    }

    /// `Σ xᵢ exp(α xᵢ) / Σ exp(α xᵢ)`.
    fn smooth_max<A>(&mut self, x: &A, alpha: &DynScalar<'_, Self::Elem>) -> &mut Self
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = Self::Elem>,
    {
        self.reset();
        let mut t = Self::null();
        let mut s = Self::null();
        for i in 0..x.dim() {
            let xi = x.const_at(i);
            t.mul(alpha, xi).apply(OpCode::Exp);
            s.apply_with(OpCode::Add, &t);
            t.apply_with(OpCode::Mul, xi);
            self.apply_with(OpCode::Add, &t);
        }
        self.apply_with(OpCode::Div, &s)
    }

    /// Smooth maximum evaluated in log space:
    /// `exp(logΣ exp(α xᵢ + ln xᵢ) - logΣ exp(α xᵢ))`. Entries must be non-negative.
    fn log_smooth_max<A>(&mut self, x: &A, alpha: &DynScalar<'_, Self::Elem>) -> &mut Self
    where
        A: ConstVector + ?Sized,
        A::Scalar: ConstScalar<Elem = Self::Elem>,
    {
        let mut num = Self::from_f64(f64::NEG_INFINITY);
        let mut den = Self::from_f64(f64::NEG_INFINITY);
        let mut t0 = Self::null();
        let mut t1 = Self::null();
        let mut acc = Self::null();
        for i in 0..x.dim() {
            let xi = x.const_at(i);
            t0.mul(xi, alpha);
            acc.log_add(&den, &t0);
            std::mem::swap(&mut den, &mut acc);
            t1.log(xi);
            t0.apply_with(OpCode::Add, &t1);
            acc.log_add(&num, &t0);
            std::mem::swap(&mut num, &mut acc);
        }
        self.sub(&num, &den).apply(OpCode::Exp)
    }

    /// Sum of the diagonal. Panics unless `a` is square.
    fn mtrace<M>(&mut self, a: &M) -> &mut Self
    where
        M: ConstMatrix + ?Sized,
        M::Scalar: ConstScalar<Elem = Self::Elem>,
    {
        let (n, m) = a.dims();
        check_dims("mtrace", (n, n), (n, m));
        self.reset();
        for i in 0..n {
            self.apply_with(OpCode::Add, a.const_at(i, i));
        }
        self
    }

    /// Frobenius norm.
    fn mnorm<M>(&mut self, a: &M) -> &mut Self
    where
        M: ConstMatrix + ?Sized,
        M::Scalar: ConstScalar<Elem = Self::Elem>,
    {
        let (n, m) = a.dims();
        self.reset();
        let mut t = Self::null();
        for i in 0..n {
            for j in 0..m {
                let aij = a.const_at(i, j);
                t.mul(aij, aij);
                self.apply_with(OpCode::Add, &t);
            }
        }
        self.apply(OpCode::Sqrt)
    }
}
