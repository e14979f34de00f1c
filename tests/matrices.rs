use approx::assert_relative_eq;
use numbat::{
    Bare, ConstMatrix, ConstScalar, ConstVector, DenseMatrix, DenseVector, Error, Matrix, Real64,
    Scalar, SparseMatrix,
};
use proptest::prelude::*;

type B = Bare<f64>;

fn dense(values: &[f64], rows: usize, cols: usize) -> DenseMatrix<B> {
    DenseMatrix::from_f64s(values, rows, cols).unwrap()
}

/// Matrix with entry `(i, j) = 10 i + j`.
fn indexed(rows: usize, cols: usize) -> DenseMatrix<B> {
    let values: Vec<f64> = (0..rows * cols).map(|k| (10 * (k / cols) + k % cols) as f64).collect();
    dense(&values, rows, cols)
}

#[test]
fn product_and_aliasing_variants() {
    let a = dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
    let b = dense(&[0.0, 1.0, 1.0, 0.0], 2, 2);

    let mut r = DenseMatrix::<B>::null(2, 2);
    r.mdot_m(&a, &b);
    assert_eq!(r.to_string(), "[[2, 1],\n [4, 3]]");

    // a · b in place
    let mut c = a.clone();
    c.mdot_m_assign(&b);
    assert!(c.equals(&r, 1e-12));

    // b · a in place
    let mut c = a.clone();
    c.pre_mdot_m_assign(&b);
    assert_eq!(c.to_string(), "[[3, 4],\n [1, 2]]");
}

#[test]
fn products_through_views_and_sparse_operands() {
    let a = indexed(2, 3);
    let s = a.as_sparse_matrix();

    let mut dd = DenseMatrix::<B>::null(2, 2);
    dd.mdot_m(&a, &a.t());
    let mut ss = SparseMatrix::<B>::null(2, 2);
    ss.mdot_m(&s, &s.clone().transpose());
    assert!(ss.equals(&dd, 1e-12));

    // (0, 1, 2) · (0, 1, 2) and (0, 1, 2) · (10, 11, 12)
    assert_relative_eq!(dd.const_at(0, 0).get(), 5.0);
    assert_relative_eq!(dd.const_at(0, 1).get(), 35.0);
}

#[test]
fn elementwise_and_scalar_operations() {
    let a = dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
    let mut r = DenseMatrix::<B>::null(2, 2);

    r.madd_m(&a, &DenseMatrix::<B>::identity(2));
    assert_eq!(r.to_string(), "[[2, 2],\n [3, 5]]");
    r.mmul_m(&a, &a);
    assert_eq!(r.to_string(), "[[1, 4],\n [9, 16]]");
    r.mdiv_s(&a, &2.0);
    assert_eq!(r.to_string(), "[[0.5, 1],\n [1.5, 2]]");
    r.msub_s(&a, &1.0);
    assert_eq!(r.to_string(), "[[0, 1],\n [2, 3]]");

    let mut t = Real64::null();
    t.mtrace(&a);
    assert_relative_eq!(t.value(), 5.0);
    t.mnorm(&a);
    assert_relative_eq!(t.value(), 30f64.sqrt(), max_relative = 1e-12);
}

#[test]
fn outer_product() {
    let mut r = DenseMatrix::<B>::null(2, 3);
    r.outer(
        &DenseVector::<B>::from_f64s(&[1.0, 2.0]),
        &DenseVector::<B>::from_f64s(&[3.0, 4.0, 5.0]),
    );
    assert_eq!(r.to_string(), "[[3, 4, 5],\n [6, 8, 10]]");
}

#[test]
fn rows_columns_and_diagonal() {
    let a = indexed(3, 3);
    assert_eq!(a.row(1).to_string(), "[10, 11, 12]");
    assert_eq!(a.col(2).to_string(), "[2, 12, 22]");
    assert_eq!(a.diag().to_string(), "[0, 11, 22]");
    assert_eq!(a.t().row(1).to_string(), "[1, 11, 21]");
    assert!(!a.is_symmetric(1e-12));

    let mut s = a.clone();
    s.madd_m(&a, &a.t());
    assert!(s.is_symmetric(1e-12));
}

#[test]
fn permutations() {
    let mut a = indexed(3, 2);
    a.permute_rows(&[2, 0, 1]).unwrap();
    assert_eq!(a.col(0).to_string(), "[20, 0, 10]");

    a.permute_columns(&[1, 0]).unwrap();
    assert_eq!(a.row(0).to_string(), "[21, 20]");

    assert!(matches!(a.permute_rows(&[0, 0, 1]), Err(Error::InvalidPermutation(_))));
    assert!(matches!(a.symmetric_permutation(&[0, 1]), Err(Error::NotSquare { .. })));

    let mut s = indexed(3, 3);
    s.symmetric_permutation(&[2, 0, 1]).unwrap();
    assert_eq!(s.diag().to_string(), "[22, 0, 11]");
    assert_relative_eq!(s.const_at(0, 1).get(), 20.0);
}

#[test]
fn sparse_permutations_match_dense() {
    let d = indexed(3, 3);
    let mut s = d.as_sparse_matrix();
    let mut d = d;
    d.swap_rows(0, 2);
    s.swap_rows(0, 2);
    d.swap_columns(1, 2);
    s.swap_columns(1, 2);
    assert!(s.equals(&d, 1e-12));
}

#[test]
fn set_identity_resets_off_diagonal() {
    let mut a = indexed(2, 3);
    a.set_identity();
    assert_eq!(a.to_string(), "[[1, 0, 0],\n [0, 1, 0]]");
}

#[test]
fn jacobian_of_vector_function() {
    // f(x, y) = (x y, sin x, x + y²)
    let x: DenseVector<Real64> = [0.5, 2.0].iter().map(|&v| Real64::new(v)).collect();
    let mut j = DenseMatrix::<Real64>::null(1, 1);
    j.jacobian(
        |x| {
            let mut s = Real64::null();
            s.sin(&x[0]);
            vec![&x[0] * &x[1], s, &x[0] + &(&x[1] * &x[1])].into()
        },
        &x,
    );
    assert_eq!(j.dims(), (3, 2));
    let expected = [[2.0, 0.5], [0.5f64.cos(), 0.0], [1.0, 4.0]];
    for (i, row) in expected.iter().enumerate() {
        for (k, &e) in row.iter().enumerate() {
            assert_relative_eq!(j.const_at(i, k).value(), e, max_relative = 1e-12);
        }
    }
    // the input is copied, not seeded
    assert_eq!(x[0].order(), 0);
}

#[test]
fn reused_destination_holds_plain_constants() {
    let mut v = Real64::new(1.0);
    numbat::variables(2, &mut [&mut v]).unwrap();
    let mut j = DenseMatrix::<Real64>::null(1, 2);
    j.at(0, 0).set(&v);
    j.at(0, 1).set(&v);

    let x: DenseVector<Real64> = [2.0, 3.0].iter().map(|&v| Real64::new(v)).collect();
    j.jacobian(|x| vec![&x[0] * &x[1]].into(), &x);
    assert_eq!(j.dims(), (1, 2));
    assert_relative_eq!(j.const_at(0, 0).value(), 3.0);
    assert_eq!(j.const_at(0, 0).order(), 0);
    assert_eq!(j.const_at(0, 1).order(), 0);

    let mut h = DenseMatrix::<Real64>::null(2, 2);
    h.map(|s| s.set(&v));
    h.hessian(|x| &x[0] * &x[1], &x);
    assert_relative_eq!(h.const_at(0, 1).value(), 1.0);
    assert!(h.reduce(true, |acc, s| acc && s.order() == 0));
}

#[test]
fn hessian_of_scalar_function() {
    let x: DenseVector<Real64> = [1.5, 2.5].iter().map(|&v| Real64::new(v)).collect();
    let mut h = DenseMatrix::<Real64>::null(2, 2);
    h.hessian(
        |x| &(&x[0] * &x[0]) * &x[0] + &(&(&x[1] * &x[1]) * &x[1]) - &(&x[0] * &x[1]) * 3.0,
        &x,
    );
    let expected = DenseMatrix::<Real64>::from_f64s(&[9.0, -3.0, -3.0, 15.0], 2, 2).unwrap();
    assert!(h.equals(&expected, 1e-6));
    assert!(h.is_symmetric(1e-12));
}

#[test]
fn dense_construction_checks_length() {
    assert!(matches!(
        DenseMatrix::<B>::from_f64s(&[1.0, 2.0, 3.0], 2, 2),
        Err(Error::LengthMismatch { .. })
    ));
}

proptest! {
    #[test]
    fn transposed_views_read_swapped_indices(rows in 1usize..6, cols in 1usize..6) {
        let a = indexed(rows, cols);
        let t = a.t();
        prop_assert_eq!(t.dims(), (cols, rows));
        for i in 0..rows {
            for j in 0..cols {
                prop_assert_eq!(t.const_at(j, i).get(), a.const_at(i, j).get());
            }
        }
        prop_assert!(t.t().equals(&a, 1e-12));
    }

    #[test]
    fn tip_matches_materialized_transpose(rows in 1usize..6, cols in 1usize..6) {
        let a = indexed(rows, cols);
        let expected = a.t().as_dense_matrix();
        let mut tipped = a.clone();
        tipped.tip();
        prop_assert!(!tipped.is_transposed());
        prop_assert!(tipped.equals(&expected, 1e-12));
        prop_assert_eq!(tipped.row_slice(0).map(<[B]>::len), Some(rows));

        let mut s = a.as_sparse_matrix();
        s.tip();
        prop_assert!(s.equals(&expected, 1e-12));
    }

    #[test]
    fn slices_read_the_window(
        rows in 2usize..7,
        cols in 2usize..7,
        r0 in 0usize..2,
        c0 in 0usize..2,
    ) {
        let a = indexed(rows, cols);
        let s = a.slice(r0, rows, c0, cols);
        prop_assert_eq!(s.dims(), (rows - r0, cols - c0));
        for i in 0..rows - r0 {
            for j in 0..cols - c0 {
                prop_assert_eq!(s.const_at(i, j).get(), a.const_at(i + r0, j + c0).get());
            }
        }

        let sparse = a.as_sparse_matrix().slice(r0, rows, c0, cols);
        prop_assert!(sparse.equals(&s, 1e-12));

        let t = a.t();
        let ts = t.slice(c0, cols, r0, rows);
        prop_assert!(ts.equals(&s.t(), 1e-12));
    }

    #[test]
    fn permute_rows_moves_whole_rows(seed in 0usize..24) {
        // one of the 24 permutations of four elements
        let mut pool = vec![0usize, 1, 2, 3];
        let mut pi = Vec::with_capacity(4);
        let mut k = seed;
        for m in (1..=4).rev() {
            pi.push(pool.remove(k % m));
            k /= m;
        }
        let a = indexed(4, 3);
        let mut p = a.clone();
        p.permute_rows(&pi).unwrap();
        for (i, &src) in pi.iter().enumerate() {
            prop_assert!(p.row(i).equals(&a.row(src), 1e-12));
        }
    }
}
