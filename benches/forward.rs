use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use numbat::{gradient, hessian, Real64, Scalar};

mod common;
use common::{points, rosenbrock, rosenbrock_f64};

fn finite_diff_gradient(x: &[f64]) -> Vec<f64> {
    let h = 1e-7;
    (0..x.len())
        .map(|i| {
            let mut xp = x.to_vec();
            let mut xm = x.to_vec();
            xp[i] += h;
            xm[i] -= h;
            (rosenbrock_f64(&xp) - rosenbrock_f64(&xm)) / (2.0 * h)
        })
        .collect()
}

fn bench_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient");
    for n in [2, 10, 100] {
        let x = points(n);

        group.bench_with_input(BenchmarkId::new("f64_eval", n), &x, |b, x| {
            b.iter(|| black_box(rosenbrock_f64(black_box(x))))
        });

        group.bench_with_input(BenchmarkId::new("real", n), &x, |b, x| {
            b.iter(|| black_box(gradient(rosenbrock, black_box(x))))
        });

        group.bench_with_input(BenchmarkId::new("finite_diff", n), &x, |b, x| {
            b.iter(|| black_box(finite_diff_gradient(black_box(x))))
        });
    }
    group.finish();
}

fn bench_hessian(c: &mut Criterion) {
    let mut group = c.benchmark_group("hessian");
    for n in [2, 10, 50] {
        let x = points(n);
        group.bench_with_input(BenchmarkId::new("real", n), &x, |b, x| {
            b.iter(|| black_box(hessian(rosenbrock, black_box(x))))
        });
    }
    group.finish();
}

fn bench_in_place(c: &mut Criterion) {
    // one destination reused across the chain
    c.bench_function("in_place_chain", |b| {
        let mut x = Real64::new(0.7);
        numbat::variables(2, &mut [&mut x]).unwrap();
        let mut r = Real64::null();
        b.iter(|| {
            r.mul(&x, &x).apply(numbat::OpCode::Sin).apply(numbat::OpCode::Exp);
            black_box(&r);
        })
    });
}

criterion_group!(benches, bench_gradient, bench_hessian, bench_in_place);
criterion_main!(benches);
