use approx::assert_relative_eq;
use numbat::algorithm::{
    back_substitution, cholesky, cholesky_ldl, cholesky_ldl_force_pd, hessenberg,
    hessenberg_with_transform,
};
use numbat::{
    gradient, hessian, Bare, ConstMatrix, ConstVector, DenseMatrix, DenseVector, Error, Matrix,
    Real64, Scalar, Vector,
};

type B = Bare<f64>;

fn dense(values: &[f64], rows: usize, cols: usize) -> DenseMatrix<B> {
    DenseMatrix::from_f64s(values, rows, cols).unwrap()
}

fn assert_matrix_eq<M: ConstMatrix<Scalar = B>>(m: &M, expected: &[f64], epsilon: f64) {
    let (rows, cols) = m.dims();
    assert_eq!(rows * cols, expected.len());
    for i in 0..rows {
        for j in 0..cols {
            assert_relative_eq!(
                m.const_at(i, j).get(),
                expected[i * cols + j],
                epsilon = epsilon,
                max_relative = 1e-5
            );
        }
    }
}

const SPD: [f64; 9] = [4.0, 12.0, -16.0, 12.0, 37.0, -43.0, -16.0, -43.0, 98.0];

// ── Back-substitution ──

#[test]
fn back_substitution_solves_upper_triangular_system() {
    let a = dense(&[1.0, -2.0, 1.0, 0.0, 1.0, 6.0, 0.0, 0.0, 1.0], 3, 3);
    let b = DenseVector::<B>::from_f64s(&[4.0, -1.0, 2.0]);
    let x = back_substitution(&a, &b).unwrap();

    let mut r = DenseVector::<B>::null(3);
    r.vsub_v(&x, &DenseVector::<B>::from_f64s(&[-24.0, -13.0, 2.0]));
    let mut norm = B::null();
    norm.vnorm(&r);
    assert!(norm.get() < 1e-8);
}

#[test]
fn back_substitution_ignores_the_lower_triangle() {
    let a = dense(&[2.0, 1.0, 99.0, 4.0], 2, 2);
    let b = DenseVector::<B>::from_f64s(&[5.0, 8.0]);
    let x = back_substitution(&a, &b).unwrap();
    assert_eq!(x.to_string(), "[1.5, 2]");
}

#[test]
fn back_substitution_rejects_bad_input() {
    let b = DenseVector::<B>::from_f64s(&[1.0, 1.0]);
    assert!(matches!(
        back_substitution(&dense(&[1.0; 6], 2, 3), &b),
        Err(Error::NotSquare { .. })
    ));
    assert!(matches!(
        back_substitution(&dense(&[1.0; 9], 3, 3), &b),
        Err(Error::DimensionMismatch { .. })
    ));
    assert_eq!(
        back_substitution(&dense(&[1.0, 2.0, 0.0, 0.0], 2, 2), &b),
        Err(Error::ZeroPivot {
            op: "back_substitution",
            index: 1
        })
    );
}

#[test]
fn back_substitution_gradient() {
    // x0 = (b0 - a01 b1 / a11) / a00
    let p = [2.0, 3.0, 4.0, 5.0, 6.0];
    let (value, g) = gradient(
        |p| {
            let a = DenseMatrix::new(
                vec![p[0].clone(), p[1].clone(), Real64::null(), p[2].clone()],
                2,
                2,
            )
            .unwrap();
            let b = DenseVector::new(vec![p[3].clone(), p[4].clone()]);
            back_substitution(&a, &b).unwrap()[0].clone()
        },
        &p,
    );
    let [a00, a01, a11, b0, b1] = p;
    let x0 = (b0 - a01 * b1 / a11) / a00;
    assert_relative_eq!(value, x0, max_relative = 1e-12);
    let expected = [
        -x0 / a00,
        -b1 / (a11 * a00),
        a01 * b1 / (a11 * a11 * a00),
        1.0 / a00,
        -a01 / (a11 * a00),
    ];
    for (gi, ei) in g.iter().zip(expected) {
        assert_relative_eq!(*gi, ei, max_relative = 1e-12);
    }
}

// ── Cholesky ──

#[test]
fn cholesky_of_a_known_matrix() {
    let a = dense(&SPD, 3, 3);
    let l = cholesky(&a).unwrap();
    assert_matrix_eq(&l, &[2.0, 0.0, 0.0, 6.0, 1.0, 0.0, -8.0, 5.0, 3.0], 1e-12);

    let mut llt = DenseMatrix::<B>::null(3, 3);
    llt.mdot_m(&l, &l.t());
    assert!(llt.equals(&a, 1e-10));
}

#[test]
fn cholesky_rejects_indefinite_and_rectangular_input() {
    assert_eq!(
        cholesky(&dense(&[1.0, 2.0, 2.0, 1.0], 2, 2)),
        Err(Error::NotPositiveDefinite(1))
    );
    assert!(matches!(cholesky(&dense(&[1.0; 6], 3, 2)), Err(Error::NotSquare { .. })));
}

#[test]
fn ldl_of_a_known_matrix() {
    let f = cholesky_ldl(&dense(&SPD, 3, 3)).unwrap();
    assert_matrix_eq(&f.l, &[1.0, 0.0, 0.0, 3.0, 1.0, 0.0, -4.0, 5.0, 1.0], 1e-12);
    assert_eq!(f.d.to_string(), "[4, 1, 9]");
    assert!(f.reconstruct().equals(&dense(&SPD, 3, 3), 1e-10));
}

#[test]
fn ldl_factors_indefinite_matrices() {
    let a = dense(&[1.0, 2.0, 2.0, 1.0], 2, 2);
    let f = cholesky_ldl(&a).unwrap();
    assert_eq!(f.d.to_string(), "[1, -3]");
    assert!(f.reconstruct().equals(&a, 1e-12));

    assert!(matches!(
        cholesky_ldl(&dense(&[0.0, 1.0, 1.0, 0.0], 2, 2)),
        Err(Error::ZeroPivot { index: 0, .. })
    ));
}

#[test]
fn forced_ldl_leaves_positive_definite_matrices_alone() {
    let a = dense(&SPD, 3, 3);
    let forced = cholesky_ldl_force_pd(&a).unwrap();
    let plain = cholesky_ldl(&a).unwrap();
    assert!(forced.l.equals(&plain.l, 1e-12));
    assert!(forced.d.equals(&plain.d, 1e-12));
}

#[test]
fn forced_ldl_adds_a_non_negative_diagonal() {
    let a = dense(&[1.0, 2.0, 0.5, 2.0, 1.0, -1.0, 0.5, -1.0, -3.0], 3, 3);
    let f = cholesky_ldl_force_pd(&a).unwrap();
    assert!(f.d.iter().all(|d| d.get() > 0.0));

    let r = f.reconstruct();
    for i in 0..3 {
        for j in 0..3 {
            let e = r.const_at(i, j).get() - a.const_at(i, j).get();
            if i == j {
                assert!(e >= -1e-12, "e[{i}] = {e}");
            } else {
                assert_relative_eq!(e, 0.0, epsilon = 1e-12);
            }
        }
    }
    // the modified matrix has an ordinary Cholesky factor
    assert!(cholesky(&r).is_ok());
}

#[test]
fn cholesky_derivatives() {
    // l11 = sqrt(p2 - p1² / p0) for a = [[p0, p1], [p1, p2]]
    let p = [4.0, 2.0, 3.0];
    let (value, g, h) = hessian(
        |p| {
            let a = DenseMatrix::new(
                vec![p[0].clone(), p[1].clone(), p[1].clone(), p[2].clone()],
                2,
                2,
            )
            .unwrap();
            cholesky(&a).unwrap().const_at(1, 1).clone()
        },
        &p,
    );
    let q: f64 = p[2] - p[1] * p[1] / p[0];
    assert_relative_eq!(value, q.sqrt(), max_relative = 1e-12);
    let s = 2.0 * q.sqrt();
    assert_relative_eq!(g[0], p[1] * p[1] / (p[0] * p[0]) / s, max_relative = 1e-12);
    assert_relative_eq!(g[1], -2.0 * p[1] / p[0] / s, max_relative = 1e-12);
    assert_relative_eq!(g[2], 1.0 / s, max_relative = 1e-12);
    assert_relative_eq!(h[2][2], -0.25 * q.powf(-1.5), max_relative = 1e-12);
    assert_relative_eq!(h[0][2], h[2][0], max_relative = 1e-12);
}

// ── Hessenberg ──

const SYMMETRIC: [f64; 25] = [
    3.5, 3.0, 4.0, 32.5, 0.4, //
    3.0, 8.6, 0.4, 25.4, 2.5, //
    4.0, 0.4, 6.4, 38.0, 0.4, //
    32.5, 25.4, 38.0, 304.0, 1.3, //
    0.4, 2.5, 0.4, 1.3, 3.6,
];

#[test]
fn symmetric_input_reduces_to_tridiagonal() {
    let a = dense(&SYMMETRIC, 5, 5);
    let (h, u) = hessenberg_with_transform(&a).unwrap();
    #[rustfmt::skip]
    let expected = [
        3.5,     32.8848, 0.0,     0.0,       0.0,
        32.8848, 310.857, 3.2874,  0.0,       0.0,
        0.0,     3.2874,  8.03978, 1.73313,   0.0,
        0.0,     0.0,     1.73313, 3.73586,   -0.400312,
        0.0,     0.0,     0.0,     -0.400312, -0.0328116,
    ];
    assert_matrix_eq(&h, &expected, 1e-4);

    // similarity transform
    let mut c = DenseMatrix::<B>::null(5, 5);
    c.mdot_m(&u.t(), &a);
    c.mdot_m_assign(&u);
    assert!(c.equals(&h, 1e-9));

    let mut utu = DenseMatrix::<B>::null(5, 5);
    utu.mdot_m(&u.t(), &u);
    assert!(utu.equals(&DenseMatrix::<B>::identity(5), 1e-12));
}

#[test]
fn general_input_is_upper_hessenberg() {
    let values: Vec<f64> = (0..16).map(|k| ((k * 7) % 11) as f64 - 4.0).collect();
    let a = dense(&values, 4, 4);
    let h = hessenberg(&a).unwrap();
    for i in 0..4usize {
        for j in 0..i.saturating_sub(1) {
            assert_eq!(h.const_at(i, j).get(), 0.0);
        }
    }
    let (h2, u) = hessenberg_with_transform(&a).unwrap();
    assert_eq!(h2, h);
    let mut c = DenseMatrix::<B>::null(4, 4);
    c.mdot_m(&u.t(), &a);
    c.mdot_m_assign(&u);
    assert!(c.equals(&h, 1e-9));
}

#[test]
fn hessenberg_keeps_derivatives() {
    // the trace is invariant under similarity, so d(trace h)/d(a_ij) = δ_ij
    let x: Vec<f64> = SYMMETRIC[..9].to_vec();
    let (value, g) = gradient(
        |p| {
            let a = DenseMatrix::new(p.to_vec(), 3, 3).unwrap();
            let h = hessenberg(&a).unwrap();
            let mut t = Real64::null();
            t.mtrace(&h);
            t
        },
        &x,
    );
    assert_relative_eq!(value, x[0] + x[4] + x[8], max_relative = 1e-12);
    for (k, gk) in g.iter().enumerate() {
        let expected = if k % 4 == 0 { 1.0 } else { 0.0 };
        assert_relative_eq!(*gk, expected, epsilon = 1e-10);
    }
}

#[test]
fn small_matrices_are_already_reduced() {
    let a = dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
    assert!(hessenberg(&a).unwrap().equals(&a, 1e-15));
    assert!(matches!(hessenberg(&dense(&[1.0; 6], 2, 3)), Err(Error::NotSquare { .. })));
}
