use numbat::{gradient, hessian, Real64, Scalar};
use rayon::prelude::*;

fn trig_mix(x: &[Real64]) -> Real64 {
    let mut s = Real64::null();
    s.sin(&x[0]);
    let mut c = Real64::null();
    c.cos(&x[1]);
    let mut e = Real64::null();
    e.exp(&x[2]);
    s * &c + &e
}

#[test]
fn independent_evaluations_run_concurrently() {
    let points: Vec<[f64; 3]> = (0..64).map(|k| {
        let t = k as f64 * 0.1;
        [t, 1.0 - t, 0.5 * t]
    }).collect();

    let parallel: Vec<(f64, Vec<f64>)> = points.par_iter().map(|p| gradient(trig_mix, p)).collect();
    let serial: Vec<(f64, Vec<f64>)> = points.iter().map(|p| gradient(trig_mix, p)).collect();
    assert_eq!(parallel, serial);
}

#[test]
fn hessians_in_parallel_match_serial() {
    let points: Vec<[f64; 3]> = (0..16).map(|k| [k as f64, 0.3, -0.2 * k as f64]).collect();
    let parallel: Vec<_> = points.par_iter().map(|p| hessian(trig_mix, p).2).collect();
    for (p, h) in points.iter().zip(&parallel) {
        assert_eq!(&hessian(trig_mix, p).2, h);
    }
}

#[test]
fn scalars_are_send_and_sync() {
    fn check<T: Send + Sync>() {}
    check::<Real64>();
    check::<numbat::DenseVector<Real64>>();
    check::<numbat::SparseMatrix<numbat::Bare<i32>>>();
}
