#![cfg(feature = "serde")]

use numbat::{
    variables, Bare, ConstMatrix, ConstScalar, ConstVector, DenseMatrix, DenseVector, Real64,
    Scalar, SparseMatrix, SparseVector,
};

#[test]
fn real_roundtrip_keeps_derivatives() {
    let mut x = Real64::new(1.5);
    let mut y = Real64::new(-0.5);
    variables(2, &mut [&mut x, &mut y]).unwrap();
    let z = &(&x * &y) * &x;

    let json = serde_json::to_string(&z).unwrap();
    let back: Real64 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, z);
    assert_eq!(back.order(), 2);
    assert_eq!(back.hessian_at(0, 1), z.hessian_at(0, 1));
}

#[test]
fn composed_reals_roundtrip_bit_exactly() {
    let mut x = Real64::new(0.7);
    let mut y = Real64::new(-1.3);
    variables(2, &mut [&mut x, &mut y]).unwrap();
    let mut e = Real64::null();
    e.exp(&(&x * &y));
    let mut z = Real64::null();
    z.sin(&e);

    let json = serde_json::to_string(&z).unwrap();
    let back: Real64 = serde_json::from_str(&json).unwrap();
    let bits = |v: &[f64]| v.iter().map(|d| d.to_bits()).collect::<Vec<_>>();
    assert_eq!(back.value().to_bits(), z.value().to_bits());
    assert_eq!(bits(back.gradient()), bits(z.gradient()));
    assert_eq!(bits(back.hessian()), bits(z.hessian()));
}

#[test]
fn non_finite_derivatives_survive_json() {
    // d/dk x^k is NaN for a negative base
    let mut x = Real64::new(-3.4);
    let mut k = Real64::new(4.0);
    variables(2, &mut [&mut x, &mut k]).unwrap();
    let mut r = Real64::null();
    r.pow(&x, &k);
    assert!(r.derivative(1).is_nan());

    let json = serde_json::to_string(&r).unwrap();
    assert!(json.contains(r#""NaN""#));
    let back: Real64 = serde_json::from_str(&json).unwrap();
    assert!(back.derivative(1).is_nan());
    assert!(back.hessian_at(1, 1).is_nan());
    assert_eq!(back.derivative(0).to_bits(), r.derivative(0).to_bits());
    assert_eq!(back.value().to_bits(), r.value().to_bits());

    assert_eq!(serde_json::to_string(&Bare::new(f64::INFINITY)).unwrap(), r#""inf""#);
    let b: Bare<f64> = serde_json::from_str(r#""-inf""#).unwrap();
    assert_eq!(b.get(), f64::NEG_INFINITY);
    assert!(serde_json::from_str::<Bare<f64>>(r#""infinity""#).is_err());
}

#[test]
fn constants_omit_derivative_fields() {
    let c = Real64::new(3.0);
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, r#"{"value":3.0}"#);
    let back: Real64 = serde_json::from_str(r#"{"value":3.0}"#).unwrap();
    assert_eq!(back.order(), 0);
}

#[test]
fn first_order_reals_have_no_hessian() {
    let back: Real64 = serde_json::from_str(r#"{"value":1.0,"gradient":[2.0,3.0]}"#).unwrap();
    assert_eq!(back.order(), 1);
    assert_eq!(back.derivative(1), 3.0);
}

#[test]
fn malformed_hessian_is_rejected() {
    let json = r#"{"value":1.0,"gradient":[1.0,0.0],"hessian":[1.0]}"#;
    let r: Result<Real64, _> = serde_json::from_str(json);
    assert!(r.is_err());
}

#[test]
fn bare_scalars_are_transparent() {
    let json = serde_json::to_string(&Bare::new(7i32)).unwrap();
    assert_eq!(json, "7");
    let back: Bare<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.get(), 7);
}

#[test]
fn vectors_roundtrip() {
    let d = DenseVector::<Bare<f64>>::from_f64s(&[1.0, 2.5]);
    let json = serde_json::to_string(&d).unwrap();
    assert_eq!(json, "[1.0,2.5]");
    let back: DenseVector<Bare<f64>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, d);

    let s = SparseVector::<Bare<f64>>::from_f64s(&[4, 1], &[2.0, -1.0], 6).unwrap();
    let json = serde_json::to_string(&s).unwrap();
    assert_eq!(json, r#"{"index":[1,4],"value":[-1.0,2.0],"length":6}"#);
    let back: SparseVector<Bare<f64>> = serde_json::from_str(&json).unwrap();
    assert!(back.equals(&s, 1e-12));
    assert_eq!(back.nnz(), 2);

    let json = r#"{"index":[7],"value":[1.0],"length":6}"#;
    let bad = serde_json::from_str::<SparseVector<Bare<f64>>>(json);
    assert!(bad.is_err());
}

#[test]
fn matrix_views_serialize_as_materialized_matrices() {
    let m = DenseMatrix::<Bare<f64>>::from_f64s(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
    let json = serde_json::to_string(&m.t()).unwrap();
    assert_eq!(json, r#"{"values":[1.0,4.0,2.0,5.0,3.0,6.0],"rows":3,"cols":2}"#);

    let back: DenseMatrix<Bare<f64>> = serde_json::from_str(&json).unwrap();
    assert!(back.equals(&m.t(), 1e-12));
    assert!(!back.is_transposed());
}

#[test]
fn sparse_matrix_roundtrip_through_transpose() {
    let s = SparseMatrix::<Bare<f64>>::from_f64s(&[0, 1], &[2, 0], &[5.0, 7.0], 2, 3)
        .unwrap()
        .transpose();
    let json = serde_json::to_string(&s).unwrap();
    assert_eq!(json, r#"{"row":[0,2],"col":[1,0],"value":[7.0,5.0],"rows":3,"cols":2}"#);

    let back: SparseMatrix<Bare<f64>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.dims(), (3, 2));
    assert!(back.equals(&s, 1e-12));
}

#[test]
fn real_matrices_keep_gradients() {
    let mut x = Real64::new(2.0);
    variables(1, &mut [&mut x]).unwrap();
    let m = DenseMatrix::new(vec![x.clone(), &x * &x], 1, 2).unwrap();
    let json = serde_json::to_string(&m).unwrap();
    let back: DenseMatrix<Real64> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.const_at(0, 1).derivative(0), 4.0);
}
