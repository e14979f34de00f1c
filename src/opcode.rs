//! Operation codes and their local partial derivatives.
//!
//! Each [`OpCode`] is an elementary operation `c = f(a)` or `c = f(a, b)`.
//! [`eval`] returns the value together with the first and second partials of
//! `f` at the operand values; the scalar kernels combine these with the
//! operands' own derivative buffers (chain rule and second-order chain rule).
//!
//! Every scalar type shares this one table. Partials are evaluated in `f64`
//! and converted back by the caller.

use crate::element::Element;
use crate::special;

/// 2/sqrt(pi)
const FRAC_2_SQRT_PI: f64 = 1.1283791670955126;

/// Elementary operations understood by the scalar kernels.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpCode {
    // ── Binary arithmetic ──
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,

    // ── Unary ──
    Neg,
    Abs,
    Sqrt,

    // ── Exp / Log ──
    Exp,
    Log,
    Log1p,

    // ── Trig / hyperbolic ──
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,

    // ── Special ──
    Erf,
    Erfc,
    LogErfc,
    Gamma,
    Lgamma,
    /// Multivariate log-gamma of dimension `p`.
    Mlgamma(usize),
    /// Regularized lower incomplete gamma `P(a, x)` with fixed shape `a`.
    GammaP(f64),
    /// Modified Bessel function `I_v(x)` with fixed order `v`.
    BesselI(f64),
    /// `ln I_v(x)` with fixed order `v`.
    LogBesselI(f64),
}

/// Value and partials of one operation at a point.
///
/// Unary operations leave every `b` partial at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Partials {
    pub value: f64,
    pub fa: f64,
    pub fb: f64,
    pub faa: f64,
    pub fab: f64,
    pub fbb: f64,
}

impl Partials {
    #[inline]
    fn value(value: f64) -> Self {
        Partials {
            value,
            ..Default::default()
        }
    }

    #[inline]
    fn unary(value: f64, fa: f64, faa: f64) -> Self {
        Partials {
            value,
            fa,
            faa,
            ..Default::default()
        }
    }
}

/// Evaluate `op` at `(a, b)` and its partials up to `order`.
///
/// For unary ops `b` is ignored. With `order == 0` only `value` is filled in,
/// with `order == 1` the second partials stay zero; costly second partials
/// (trigamma sums, Bessel ratios) are skipped accordingly.
pub fn eval(op: OpCode, a: f64, b: f64, order: usize) -> Partials {
    let first = order >= 1;
    let second = order >= 2;
    match op {
        // Binary
        OpCode::Add => Partials {
            value: a + b,
            fa: 1.0,
            fb: 1.0,
            ..Default::default()
        },
        OpCode::Sub => Partials {
            value: a - b,
            fa: 1.0,
            fb: -1.0,
            ..Default::default()
        },
        OpCode::Mul => Partials {
            value: a * b,
            fa: b,
            fb: a,
            fab: 1.0,
            ..Default::default()
        },
        OpCode::Div => {
            let inv = 1.0 / b;
            Partials {
                value: a * inv,
                fa: inv,
                fb: -a * inv * inv,
                faa: 0.0,
                fab: -inv * inv,
                fbb: 2.0 * a * inv * inv * inv,
            }
        }
        OpCode::Pow => {
            let value = a.powf(b);
            if !first {
                return Partials::value(value);
            }
            // d/da a^b = b a^(b-1), d/db a^b = a^b ln a
            let pm1 = a.powf(b - 1.0);
            let ln_a = a.ln();
            let mut p = Partials {
                value,
                fa: b * pm1,
                fb: value * ln_a,
                ..Default::default()
            };
            if second {
                p.faa = b * (b - 1.0) * a.powf(b - 2.0);
                p.fab = pm1 * (1.0 + b * ln_a);
                p.fbb = value * ln_a * ln_a;
            }
            p
        }
        // strict comparison: ties select b
        OpCode::Min => {
            if a < b {
                Partials {
                    value: a,
                    fa: 1.0,
                    ..Default::default()
                }
            } else {
                Partials {
                    value: b,
                    fb: 1.0,
                    ..Default::default()
                }
            }
        }
        OpCode::Max => {
            if a > b {
                Partials {
                    value: a,
                    fa: 1.0,
                    ..Default::default()
                }
            } else {
                Partials {
                    value: b,
                    fb: 1.0,
                    ..Default::default()
                }
            }
        }

        // Unary
        OpCode::Neg => Partials::unary(-a, -1.0, 0.0),
        OpCode::Abs => {
            let s = sign(a);
            // sign 0 resets to an exact zero
            let value = if s == 0.0 && !a.is_nan() { 0.0 } else { a.abs() };
            Partials::unary(value, s, 0.0)
        }
        OpCode::Sqrt => {
            // same derivatives as a^0.5
            Partials::unary(a.sqrt(), 0.5 * a.powf(-0.5), -0.25 * a.powf(-1.5))
        }

        // Exp / Log
        OpCode::Exp => {
            let e = a.exp();
            Partials::unary(e, e, e)
        }
        OpCode::Log => {
            let inv = 1.0 / a;
            Partials::unary(a.ln(), inv, -inv * inv)
        }
        OpCode::Log1p => {
            let inv = 1.0 / (1.0 + a);
            Partials::unary(a.ln_1p(), inv, -inv * inv)
        }

        // Trig / hyperbolic
        OpCode::Sin => {
            let (s, c) = a.sin_cos();
            Partials::unary(s, c, -s)
        }
        OpCode::Cos => {
            let (s, c) = a.sin_cos();
            Partials::unary(c, -s, -c)
        }
        OpCode::Tan => {
            let t = a.tan();
            let sec2 = 1.0 + t * t;
            Partials::unary(t, sec2, 2.0 * t * sec2)
        }
        OpCode::Sinh => Partials::unary(a.sinh(), a.cosh(), a.sinh()),
        OpCode::Cosh => Partials::unary(a.cosh(), a.sinh(), a.cosh()),
        OpCode::Tanh => {
            let t = a.tanh();
            let sech2 = 1.0 - t * t;
            Partials::unary(t, sech2, -2.0 * t * sech2)
        }

        // Special
        OpCode::Erf => {
            let d = FRAC_2_SQRT_PI * (-a * a).exp();
            Partials::unary(special::erf(a), d, -2.0 * a * d)
        }
        OpCode::Erfc => {
            let d = -FRAC_2_SQRT_PI * (-a * a).exp();
            Partials::unary(special::erfc(a), d, -2.0 * a * d)
        }
        OpCode::LogErfc => {
            let v = special::log_erfc(a);
            let d = -FRAC_2_SQRT_PI * (-a * a - v).exp();
            Partials::unary(v, d, -2.0 * a * d - d * d)
        }
        OpCode::Gamma => {
            let v = special::gamma(a);
            if !first {
                return Partials::value(v);
            }
            let psi = special::digamma(a);
            let faa = if second {
                v * (psi * psi + special::trigamma(a))
            } else {
                0.0
            };
            Partials::unary(v, v * psi, faa)
        }
        OpCode::Lgamma => {
            let v = special::lgamma(a);
            if !first {
                return Partials::value(v);
            }
            let faa = if second { special::trigamma(a) } else { 0.0 };
            Partials::unary(v, special::digamma(a), faa)
        }
        OpCode::Mlgamma(p) => {
            let v = special::mlgamma(a, p);
            if !first {
                return Partials::value(v);
            }
            let mut fa = 0.0;
            let mut faa = 0.0;
            for j in 1..=p {
                let x = a + (1.0 - j as f64) / 2.0;
                fa += special::digamma(x);
                if second {
                    faa += special::trigamma(x);
                }
            }
            Partials::unary(v, fa, faa)
        }
        OpCode::GammaP(s) => {
            let v = special::gamma_p(s, a);
            if !first {
                return Partials::value(v);
            }
            // d/dx P(s, x) = x^(s-1) e^(-x) / Γ(s)
            let d = ((s - 1.0) * a.ln() - a - special::lgamma_sign(s).0).exp();
            Partials::unary(v, d, d * ((s - 1.0) / a - 1.0))
        }
        OpCode::BesselI(nu) => {
            let log_i = special::log_bessel_i(nu, a);
            let v = log_i.exp();
            if !first {
                return Partials::value(v);
            }
            let d = bessel_log_derivative(nu, a, log_i);
            let faa = if second {
                v * (1.0 + nu * nu / (a * a) - d / a)
            } else {
                0.0
            };
            Partials::unary(v, v * d, faa)
        }
        OpCode::LogBesselI(nu) => {
            let v = special::log_bessel_i(nu, a);
            if !first {
                return Partials::value(v);
            }
            let d = bessel_log_derivative(nu, a, v);
            let faa = if second {
                1.0 + nu * nu / (a * a) - d / a - d * d
            } else {
                0.0
            };
            Partials::unary(v, d, faa)
        }
    }
}

/// `d/dx ln I_v(x) = I_{v+1}(x) / I_v(x) + v / x`, given `ln I_v(x)`.
#[inline]
fn bessel_log_derivative(nu: f64, x: f64, log_i: f64) -> f64 {
    (special::log_bessel_i(nu + 1.0, x) - log_i).exp() + nu / x
}

/// Sign as -1, 0 or 1; NaN maps to 0.
#[inline]
pub(crate) fn sign(a: f64) -> f64 {
    if a < 0.0 {
        -1.0
    } else if a > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Evaluate `op` on plain element values, without derivatives.
///
/// Arithmetic, comparisons and `abs` stay in the element's own arithmetic, so
/// integers wrap and truncate; everything else goes through `f64`.
pub fn eval_value<E: Element>(op: OpCode, a: E, b: E) -> E {
    match op {
        OpCode::Add => a.elem_add(b),
        OpCode::Sub => a.elem_sub(b),
        OpCode::Mul => a.elem_mul(b),
        OpCode::Div => a.elem_div(b),
        OpCode::Neg => a.elem_neg(),
        OpCode::Min => {
            if a < b {
                a
            } else {
                b
            }
        }
        OpCode::Max => {
            if a > b {
                a
            } else {
                b
            }
        }
        OpCode::Abs => {
            if a < E::zero() {
                a.elem_neg()
            } else if a > E::zero() {
                a
            } else {
                E::zero()
            }
        }
        _ => E::from_f64_lossy(eval(op, a.as_f64(), b.as_f64(), 0).value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fd(op: OpCode, a: f64) -> (f64, f64) {
        let h = 1e-4;
        let p = eval(op, a + h, 0.0, 1);
        let m = eval(op, a - h, 0.0, 1);
        let c = eval(op, a, 0.0, 0);
        (
            (p.value - m.value) / (2.0 * h),
            (p.value - 2.0 * c.value + m.value) / (h * h),
        )
    }

    #[test]
    fn unary_partials_match_finite_differences() {
        let ops = [
            (OpCode::Exp, 0.7),
            (OpCode::Log, 1.3),
            (OpCode::Log1p, 0.4),
            (OpCode::Sqrt, 2.2),
            (OpCode::Sin, 0.9),
            (OpCode::Cos, 0.9),
            (OpCode::Tan, 0.3),
            (OpCode::Sinh, 0.5),
            (OpCode::Cosh, 0.5),
            (OpCode::Tanh, 0.5),
            (OpCode::Erf, 0.23),
            (OpCode::Erfc, 0.23),
            (OpCode::LogErfc, 1.7),
            (OpCode::Gamma, 2.5),
            (OpCode::Lgamma, 2.5),
            (OpCode::Mlgamma(3), 2.5),
            (OpCode::GammaP(2.5), 1.5),
            (OpCode::BesselI(1.5), 2.0),
            (OpCode::LogBesselI(10.0), 20.0),
        ];
        for (op, a) in ops {
            let p = eval(op, a, 0.0, 2);
            let (d, h) = fd(op, a);
            assert_relative_eq!(p.fa, d, max_relative = 1e-6, epsilon = 1e-8);
            assert_relative_eq!(p.faa, h, max_relative = 1e-3, epsilon = 1e-4);
        }
    }

    #[test]
    fn pow_negative_base() {
        let p = eval(OpCode::Pow, -3.4, 4.0, 2);
        assert_relative_eq!(p.fa, -157.216, epsilon = 1e-9);
        assert_relative_eq!(p.faa, 138.72, epsilon = 1e-9);
        assert!(p.fb.is_nan());
    }

    #[test]
    fn min_max_ties_select_second() {
        let p = eval(OpCode::Min, 2.0, 2.0, 1);
        assert_eq!((p.fa, p.fb), (0.0, 1.0));
        let p = eval(OpCode::Max, 2.0, 2.0, 1);
        assert_eq!((p.fa, p.fb), (0.0, 1.0));
    }

    #[test]
    fn order_zero_skips_partials() {
        let p = eval(OpCode::Gamma, 4.321, 0.0, 0);
        assert_eq!(p.fa, 0.0);
        assert_eq!(p.faa, 0.0);
    }

    #[test]
    fn integer_values_use_element_arithmetic() {
        assert_eq!(eval_value(OpCode::Div, 7i8, 2), 3);
        assert_eq!(eval_value(OpCode::Add, 100i8, 100), -56);
        assert_eq!(eval_value(OpCode::Sqrt, 17i32, 0), 4);
        assert_eq!(eval_value(OpCode::Abs, -5i64, 0), 5);
    }
}
