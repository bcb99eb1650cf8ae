use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::{Array1, Array2};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::{rand_distr::Normal, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
use srombox_optim::{Gradient, SromParams};
use srombox_srom::Srom;
use srombox_target::{RandomVector, SampleRandomVector};

fn criterion_objective(c: &mut Criterion) {
    let dims = [1, 3];
    let sizes = [10, 50];

    let mut group = c.benchmark_group("srom");
    group.sample_size(10);
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    for dim in dims {
        let samples = Array2::random_using((1000, dim), Normal::new(0., 1.).unwrap(), &mut rng);
        let target = SampleRandomVector::new(&samples).unwrap();
        for size in sizes {
            let srom = Srom::new(size, dim).unwrap();
            let params = SromParams::default();
            let gradient = Gradient::new(&srom, &target, params).unwrap();
            let x = target.draw_random_sample(size, &mut rng).unwrap();
            let p = Array1::from_elem(size, 1. / size as f64);
            group.bench_function(format!("objective-{dim}-dim-{size}-size"), |b| {
                b.iter(|| {
                    std::hint::black_box(gradient.objective().evaluate(&x.view(), &p.view()))
                });
            });
            group.bench_function(format!("gradient-{dim}-dim-{size}-size"), |b| {
                b.iter(|| {
                    std::hint::black_box(gradient.evaluate(&x.view(), &p.view()))
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, criterion_objective);
criterion_main!(benches);
