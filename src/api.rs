use crate::float::Float;
use crate::real::{self, Real};
use crate::scalar::ConstScalar;

/// Inputs `x` declared as variables `0..x.len()` of the given order.
fn inputs<F: Float>(x: &[F], order: usize) -> Vec<Real<F>> {
    let mut vars: Vec<Real<F>> = x.iter().map(|&v| Real::new(v)).collect();
    real::seed(order, vars.iter_mut());
    vars
}

/// Value and gradient of a scalar function `f : R^n → R`.
///
/// ```
/// let f = |x: &[numbat::Real64]| &x[0] * &x[0] + &x[1] * &x[1];
/// let (v, g) = numbat::gradient(f, &[3.0, 4.0]);
/// assert_eq!(v, 25.0);
/// assert!((g[0] - 6.0).abs() < 1e-12);
/// assert!((g[1] - 8.0).abs() < 1e-12);
/// ```
pub fn gradient<F: Float>(f: impl FnOnce(&[Real<F>]) -> Real<F>, x: &[F]) -> (F, Vec<F>) {
    let vars = inputs(x, 1);
    let y = f(&vars);
    let g = (0..x.len()).map(|j| y.derivative(j)).collect();
    (y.value(), g)
}

/// Values and Jacobian of `f : R^n → R^m`; row `i` holds `∂fᵢ/∂x`.
///
/// ```
/// let (v, j) = numbat::jacobian(
///     |x: &[numbat::Real64]| vec![&x[0] * &x[1], &x[0] + 2.0],
///     &[3.0, 5.0],
/// );
/// assert_eq!(v, vec![15.0, 5.0]);
/// assert_eq!(j, vec![vec![5.0, 3.0], vec![1.0, 0.0]]);
/// ```
pub fn jacobian<F: Float>(
    f: impl FnOnce(&[Real<F>]) -> Vec<Real<F>>,
    x: &[F],
) -> (Vec<F>, Vec<Vec<F>>) {
    let vars = inputs(x, 1);
    let ys = f(&vars);
    let values = ys.iter().map(ConstScalar::value).collect();
    let rows = ys
        .iter()
        .map(|y| (0..x.len()).map(|j| y.derivative(j)).collect())
        .collect();
    (values, rows)
}

/// Value, gradient and Hessian of a scalar function `f : R^n → R`.
///
/// ```
/// let (_, _, h) = numbat::hessian(
///     |x: &[numbat::Real64]| &x[0] * &x[0] * &x[1],
///     &[2.0, 3.0],
/// );
/// assert_eq!(h, vec![vec![6.0, 4.0], vec![4.0, 0.0]]);
/// ```
pub fn hessian<F: Float>(
    f: impl FnOnce(&[Real<F>]) -> Real<F>,
    x: &[F],
) -> (F, Vec<F>, Vec<Vec<F>>) {
    let n = x.len();
    let vars = inputs(x, 2);
    let y = f(&vars);
    let g = (0..n).map(|j| y.derivative(j)).collect();
    let h = (0..n)
        .map(|i| (0..n).map(|j| y.hessian_at(i, j)).collect())
        .collect();
    (y.value(), g, h)
}
