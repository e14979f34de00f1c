use std::fmt::{self, Display};

use crate::error::{check_index, Error, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode};
use crate::scalar::{Arg, ConstScalar, DynScalar, Parts, Scalar};

/// Differentiable scalar: a value with gradient and Hessian buffers.
///
/// `order` is 0 (constant), 1 (gradient) or 2 (gradient and Hessian), and the
/// buffers are sized for `n` variables: `gradient.len() == n` when
/// `order >= 1`, `hessian.len() == n * n` (row-major, symmetric) when
/// `order == 2`. Unallocated derivatives read as zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Real<F: Float> {
    value: F,
    n: usize,
    order: usize,
    gradient: Vec<F>,
    hessian: Vec<F>,
}

impl<F: Float> Display for Real<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.value, f)
    }
}

impl<F: Float> From<F> for Real<F> {
    #[inline]
    fn from(value: F) -> Self {
        Real::new(value)
    }
}

impl<F: Float> Real<F> {
    /// A constant (order 0).
    #[inline]
    pub fn new(value: F) -> Self {
        Real {
            value,
            n: 0,
            order: 0,
            gradient: Vec::new(),
            hessian: Vec::new(),
        }
    }

    /// Allocate zeroed derivative buffers for `n` variables up to `order`.
    ///
    /// Previous derivatives are discarded; the value is kept.
    pub fn alloc(&mut self, n: usize, order: usize) -> Result<()> {
        if order > 2 {
            return Err(Error::InvalidOrder(order));
        }
        self.realloc(n, order);
        self.gradient.fill(F::zero());
        self.hessian.fill(F::zero());
        Ok(())
    }

    /// Rebuild from raw buffers: order 0 when `gradient` is empty, order 2
    /// when `hessian` holds `n * n` entries, order 1 when it is empty.
    pub fn from_buffers(value: F, gradient: Vec<F>, hessian: Vec<F>) -> Result<Self> {
        let n = gradient.len();
        let order = match (n, hessian.len()) {
            (0, 0) => 0,
            (_, 0) => 1,
            (_, h) if h == n * n => 2,
            (_, h) => {
                return Err(Error::LengthMismatch {
                    what: "hessian",
                    expected: n * n,
                    got: h,
                })
            }
        };
        Ok(Real {
            value,
            n: if order == 0 { 0 } else { n },
            order,
            gradient,
            hessian,
        })
    }

    /// Set `∂self/∂xᵢ`. Panics if `i` is outside the allocation.
    pub fn set_derivative(&mut self, i: usize, v: F) {
        check_index((i, 0), (self.gradient.len(), 1));
        self.gradient[i] = v;
    }

    /// Set `∂²self/∂xᵢ∂xⱼ` and its mirror entry. Panics if outside the allocation.
    pub fn set_hessian(&mut self, i: usize, j: usize, v: F) {
        let n = if self.order >= 2 { self.n } else { 0 };
        check_index((i, j), (n, n));
        self.hessian[i * n + j] = v;
        self.hessian[j * n + i] = v;
    }

    /// Gradient buffer; empty below order 1.
    #[inline]
    pub fn gradient(&self) -> &[F] {
        &self.gradient
    }

    /// Row-major Hessian buffer; empty below order 2.
    #[inline]
    pub fn hessian(&self) -> &[F] {
        &self.hessian
    }

    /// Hessian as nested rows.
    pub fn hessian_rows(&self) -> Vec<Vec<F>> {
        if self.order < 2 {
            return Vec::new();
        }
        self.hessian.chunks(self.n.max(1)).map(<[F]>::to_vec).collect()
    }

    fn clear(&mut self) {
        self.n = 0;
        self.order = 0;
        self.gradient.clear();
        self.hessian.clear();
    }

    /// Resize to `(n, order)` without preserving contents.
    fn realloc(&mut self, n: usize, order: usize) {
        let n = if order == 0 { 0 } else { n };
        self.gradient.clear();
        self.hessian.clear();
        if order >= 1 {
            self.gradient.resize(n, F::zero());
        }
        if order >= 2 {
            self.hessian.resize(n * n, F::zero());
        }
        self.n = n;
        self.order = order;
    }

    /// Grow to `(n, order)` keeping existing derivatives at their indices.
    /// Never shrinks.
    fn grow(&mut self, n: usize, order: usize) {
        let zero = F::zero();
        let (n0, order0) = (self.n, self.order);
        if order >= 1 {
            self.gradient.resize(n, zero);
        }
        if order >= 2 {
            if order0 >= 2 && n0 != n {
                self.hessian.resize(n * n, zero);
                // move rows back to front so no entry is overwritten before it is read
                for i in (0..n0).rev() {
                    for j in (0..n0).rev() {
                        self.hessian[i * n + j] = self.hessian[i * n0 + j];
                    }
                }
                for i in 0..n {
                    for j in 0..n {
                        if i >= n0 || j >= n0 {
                            self.hessian[i * n + j] = zero;
                        }
                    }
                }
            } else if order0 < 2 {
                self.hessian.clear();
                self.hessian.resize(n * n, zero);
            }
        }
        self.n = n;
        self.order = order;
    }

    fn operand<'a>(&self, arg: Arg<'a, F>) -> (F, Operand<'a, F>) {
        match arg {
            Arg::This => (self.value, Operand::This { order: self.order }),
            Arg::Other(s) => {
                let p = s.parts();
                let op = match p.gradient {
                    None => Operand::Constant,
                    Some(grad) => Operand::Other {
                        grad,
                        hess: p.hessian,
                    },
                };
                (p.value, op)
            }
        }
    }

    /// `self = op(a, b)` with first- and second-order propagation.
    ///
    /// The Hessian is written before the gradient, and each entry of an
    /// aliased operand is read before it is overwritten, so either operand
    /// may be `self`.
    fn kernel(&mut self, op: OpCode, a: Arg<'_, F>, b: Option<Arg<'_, F>>) {
        let (va, oa) = self.operand(a);
        let (vb, ob) = match b {
            Some(b) => self.operand(b),
            None => (F::zero(), Operand::Constant),
        };
        let (na, order_a) = oa.alloc(self);
        let (nb, order_b) = ob.alloc(self);
        let order = order_a.max(order_b);
        let n = na.max(nb);

        let p = opcode::eval(op, va.as_f64(), vb.as_f64(), order);
        self.value = F::from_f64_lossy(p.value);
        if order == 0 {
            self.clear();
            return;
        }
        if oa.is_this() || ob.is_this() {
            self.grow(n, order);
        } else {
            self.realloc(n, order);
        }

        let fa = F::from_f64_lossy(p.fa);
        let fb = F::from_f64_lossy(p.fb);

        if order >= 2 {
            let faa = F::from_f64_lossy(p.faa);
            let fab = F::from_f64_lossy(p.fab);
            let fbb = F::from_f64_lossy(p.fbb);
            let g: &[F] = &self.gradient;
            let h: &mut [F] = &mut self.hessian;
            for i in 0..n {
                for j in i..n {
                    let sa = oa.sample(g, h, n, i, j);
                    let sb = ob.sample(g, h, n, i, j);
                    let mut v = F::zero();
                    if let Some((ai, aj, aij)) = sa {
                        v = v + mul_nz(fa, aij) + mul_nz(faa, ai * aj);
                    }
                    if let Some((bi, bj, bij)) = sb {
                        v = v + mul_nz(fb, bij) + mul_nz(fbb, bi * bj);
                    }
                    if let (Some((ai, aj, _)), Some((bi, bj, _))) = (sa, sb) {
                        v = v + mul_nz(fab, ai * bj + aj * bi);
                    }
                    h[i * n + j] = v;
                    h[j * n + i] = v;
                }
            }
        }

        let g: &mut [F] = &mut self.gradient;
        for i in 0..n {
            let mut d = F::zero();
            if let Some(ai) = oa.grad_at(g, i) {
                d = d + mul_nz(fa, ai);
            }
            if let Some(bi) = ob.grad_at(g, i) {
                d = d + mul_nz(fb, bi);
            }
            g[i] = d;
        }
    }
}

/// `partial * sensitivity`, exactly zero when the sensitivity is zero even if
/// the partial is not finite.
#[inline]
fn mul_nz<F: Float>(partial: F, sensitivity: F) -> F {
    if sensitivity == F::zero() {
        F::zero()
    } else {
        partial * sensitivity
    }
}

/// Derivative source of one kernel operand.
#[derive(Clone, Copy)]
enum Operand<'a, F> {
    /// No derivative buffers: contributes no terms.
    Constant,
    /// The destination itself, with its order before the operation.
    This { order: usize },
    Other {
        grad: &'a [F],
        hess: Option<&'a [F]>,
    },
}

impl<F: Float> Operand<'_, F> {
    #[inline]
    fn is_this(&self) -> bool {
        matches!(self, Operand::This { .. })
    }

    fn alloc(&self, this: &Real<F>) -> (usize, usize) {
        match *self {
            Operand::Constant => (0, 0),
            Operand::This { .. } => (this.n, this.order),
            Operand::Other { grad, hess } => (grad.len(), if hess.is_some() { 2 } else { 1 }),
        }
    }

    /// `∂/∂xᵢ`, or `None` when the operand carries no derivatives.
    #[inline]
    fn grad_at(&self, own: &[F], i: usize) -> Option<F> {
        match *self {
            Operand::Constant | Operand::This { order: 0 } => None,
            Operand::This { .. } => Some(own[i]),
            Operand::Other { grad, .. } => Some(grad.get(i).copied().unwrap_or_else(F::zero)),
        }
    }

    /// `(∂ᵢ, ∂ⱼ, ∂ᵢ∂ⱼ)` in an `n`-variable layout.
    #[inline]
    fn sample(&self, own_g: &[F], own_h: &[F], n: usize, i: usize, j: usize) -> Option<(F, F, F)> {
        let zero = F::zero();
        match *self {
            Operand::Constant | Operand::This { order: 0 } => None,
            Operand::This { .. } => Some((own_g[i], own_g[j], own_h[i * n + j])),
            Operand::Other { grad, hess } => {
                let m = grad.len();
                let gi = grad.get(i).copied().unwrap_or(zero);
                let gj = grad.get(j).copied().unwrap_or(zero);
                let hij = match hess {
                    Some(h) if i < m && j < m => h[i * m + j],
                    _ => zero,
                };
                Some((gi, gj, hij))
            }
        }
    }
}

impl<F: Float> ConstScalar for Real<F> {
    type Elem = F;

    #[inline]
    fn parts(&self) -> Parts<'_, F> {
        Parts {
            value: self.value,
            gradient: (self.order >= 1).then_some(self.gradient.as_slice()),
            hessian: (self.order >= 2).then_some(self.hessian.as_slice()),
        }
    }

    #[inline]
    fn order(&self) -> usize {
        self.order
    }

    #[inline]
    fn n_variables(&self) -> usize {
        self.n
    }
}

impl<F: Float> Scalar for Real<F> {
    #[inline]
    fn from_f64(v: f64) -> Self {
        Real::new(F::from_f64_lossy(v))
    }

    #[inline]
    fn null() -> Self {
        Real::new(F::zero())
    }

    fn set(&mut self, a: &DynScalar<'_, F>) {
        let p = a.parts();
        self.value = p.value;
        match p.gradient {
            None => self.clear(),
            Some(g) => {
                self.n = g.len();
                self.gradient.clear();
                self.gradient.extend_from_slice(g);
                self.hessian.clear();
                match p.hessian {
                    Some(h) => {
                        self.order = 2;
                        self.hessian.extend_from_slice(h);
                    }
                    None => self.order = 1,
                }
            }
        }
    }

    #[inline]
    fn set_value(&mut self, v: F) {
        self.value = v;
    }

    fn reset(&mut self) {
        self.value = F::zero();
        self.gradient.fill(F::zero());
        self.hessian.fill(F::zero());
    }

    #[inline]
    fn unary(&mut self, op: OpCode, a: Arg<'_, F>) {
        self.kernel(op, a, None);
    }

    #[inline]
    fn binary(&mut self, op: OpCode, a: Arg<'_, F>, b: Arg<'_, F>) {
        self.kernel(op, a, Some(b));
    }
}

/// Declare `vars` as the independent variables `0..vars.len()`.
///
/// Each scalar gets buffers for `vars.len()` variables up to `order`, a
/// one-hot gradient and a zero Hessian; values are untouched.
pub fn variables<F: Float>(order: usize, vars: &mut [&mut Real<F>]) -> Result<()> {
    if order > 2 {
        return Err(Error::InvalidOrder(order));
    }
    seed(order, vars.iter_mut().map(|v| &mut **v));
    Ok(())
}

/// [`variables`] for an order already known to be valid.
pub(crate) fn seed<'a, F: Float + 'a>(
    order: usize,
    vars: impl ExactSizeIterator<Item = &'a mut Real<F>>,
) {
    debug_assert!(order <= 2);
    let n = vars.len();
    for (i, v) in vars.enumerate() {
        v.realloc(n, order);
        if order >= 1 {
            v.gradient[i] = F::one();
        }
    }
    log::trace!("declared {n} variables of order {order}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grow_keeps_hessian_entries_in_place() {
        let mut a = Real::new(1.0f64);
        a.alloc(2, 2).unwrap();
        a.set_hessian(0, 1, 3.0);
        a.set_hessian(1, 1, 5.0);
        a.grow(3, 2);
        assert_eq!(a.hessian_at(0, 1), 3.0);
        assert_eq!(a.hessian_at(1, 0), 3.0);
        assert_eq!(a.hessian_at(1, 1), 5.0);
        assert_eq!(a.hessian_at(2, 2), 0.0);
        assert_eq!(a.hessian_at(0, 2), 0.0);
        assert_eq!(a.hessian().len(), 9);
    }

    #[test]
    fn aliased_square_matches_fresh_destination() {
        let mut x = Real::new(1.7f64);
        let mut y = Real::new(-0.4f64);
        variables(2, &mut [&mut x, &mut y]).unwrap();
        let mut a = Real::<f64>::null();
        a.mul(&x, &y).apply(OpCode::Sin);

        let mut fresh = Real::<f64>::null();
        fresh.mul(&a, &a);
        a.binary(OpCode::Mul, Arg::This, Arg::This);

        assert_eq!(a, fresh);
    }

    #[test]
    fn mixed_allocations_take_the_superset() {
        let mut x = Real::new(2.0f64);
        x.alloc(1, 1).unwrap();
        x.set_derivative(0, 1.0);
        let mut y = Real::new(3.0f64);
        y.alloc(3, 2).unwrap();
        y.set_derivative(2, 1.0);

        let mut z = Real::<f64>::null();
        z.mul(&x, &y);
        assert_eq!(z.order(), 2);
        assert_eq!(z.n_variables(), 3);
        assert_relative_eq!(z.derivative(0), 3.0);
        assert_relative_eq!(z.derivative(2), 2.0);
        assert_relative_eq!(z.hessian_at(0, 2), 1.0);
        assert_relative_eq!(z.hessian_at(0, 0), 0.0);
    }

    #[test]
    fn constants_only_drop_the_allocation() {
        let mut z = Real::new(1.0f64);
        z.alloc(4, 2).unwrap();
        z.add(&2.0f64, &3.0f64);
        assert_eq!(z.order(), 0);
        assert!(z.gradient().is_empty());
        assert_eq!(z.value(), 5.0);
    }

    #[test]
    fn invalid_order_is_rejected() {
        let mut x = Real::new(0.0f32);
        assert_eq!(variables(3, &mut [&mut x]), Err(Error::InvalidOrder(3)));
        assert_eq!(x.alloc(7, 3), Err(Error::InvalidOrder(3)));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn set_derivative_out_of_range_panics() {
        let mut x = Real::new(0.0f64);
        x.alloc(2, 1).unwrap();
        x.set_derivative(2, 1.0);
    }
}
