use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{Matrix3, Vector3};
use spot_predict::geometry::axis_angle_matrix;
use spot_predict::reeke::{ReekeIndexGenerator, ReekeModel};
use std::hint::black_box;

/// Benchmark model construction and full index generation for a
/// protein-scale cubic cell at a range of resolution limits.
fn bench_reeke_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reeke");

    let axis = Vector3::new(1.0, 0.0, 0.0);
    let s0 = Vector3::new(0.0, 0.0, 1.0);
    let ub_beg = Matrix3::identity() / 80.0;
    let ub_end = axis_angle_matrix(&axis, 0.1_f64.to_radians()) * ub_beg;

    group.bench_function("model_construction", |b| {
        b.iter(|| {
            ReekeModel::new(
                black_box(&ub_beg),
                black_box(&ub_end),
                &axis,
                &-s0,
                2.0,
                1,
            )
            .unwrap()
        })
    });

    for dmin in [4.0, 2.0, 1.5] {
        group.bench_function(format!("generate_dmin_{dmin}"), |b| {
            b.iter(|| {
                ReekeIndexGenerator::new(
                    black_box(&ub_beg),
                    black_box(&ub_end),
                    &axis,
                    &s0,
                    dmin,
                    1,
                )
                .unwrap()
                .count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reeke_generation);
criterion_main!(benches);
