use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nalgebra::DMatrix;
use nd_inference::{Device, FitConfig, Likelihood, ModelKind, Observations, fit_model};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::hint::black_box;

fn synthetic(n: usize, d: usize, k: usize, seed: u64) -> (DMatrix<f64>, DMatrix<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let x = DMatrix::from_fn(n, d, |_, _| normal.sample(&mut rng));
    let y = DMatrix::from_fn(n, k, |i, j| x[(i, j % d)] + 0.5 * normal.sample(&mut rng));
    (x, y)
}

fn bench_normal_fits(c: &mut Criterion) {
    let config = FitConfig::default();
    let mut group = c.benchmark_group("fit_normal");
    group.sample_size(10);

    for n in [100usize, 1000] {
        let (x, y) = synthetic(n, 4, 3, 0);
        for kind in [ModelKind::Null, ModelKind::Linear, ModelKind::Nonlinear] {
            for device in [Device::Cpu, Device::Parallel] {
                let id = BenchmarkId::new(format!("{}_{}", kind.name(), device.name()), n);
                group.bench_with_input(id, &n, |b, _| {
                    b.iter(|| {
                        black_box(
                            fit_model(
                                Observations::new(&x, &y),
                                Likelihood::normal(),
                                kind,
                                &config,
                                device,
                            )
                            .unwrap(),
                        )
                    })
                });
            }
        }
    }
    group.finish();
}

fn bench_multinomial_linear(c: &mut Criterion) {
    let (x, y) = synthetic(500, 4, 4, 1);
    let counts = y.map(|v| (v.abs() * 3.0).round());
    let config = FitConfig::default();
    c.bench_function("fit_multinomial_linear_500", |b| {
        b.iter(|| {
            black_box(
                fit_model(
                    Observations::new(&x, &counts),
                    Likelihood::Multinomial,
                    ModelKind::Linear,
                    &config,
                    Device::Cpu,
                )
                .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_normal_fits, bench_multinomial_linear);
criterion_main!(benches);
