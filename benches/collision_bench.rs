//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};

use phys_core::bodies::Material;
use phys_core::collision::{xeno_collide, Gjk};
use phys_core::math::{Matrix3, Vector3};
use phys_core::{RigidBody, Shape, World};

fn bench_convex_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("convex_queries");

    let cube = Shape::cuboid(Vector3::one()).unwrap();
    let cone = Shape::cone(1.0, 0.5).unwrap();
    let tilt = Matrix3::from_axis_angle(Vector3::new(1.0, 1.0, 0.0).normalize(), 0.6);
    let id = Matrix3::identity();
    let gjk = Gjk::new();

    group.bench_function("xeno_collide_box_cone", |b| {
        b.iter(|| {
            xeno_collide::detect(
                black_box(&cube),
                black_box(&cone),
                &id,
                &tilt,
                Vector3::ZERO,
                black_box(Vector3::new(0.3, 0.7, 0.1)),
            )
        });
    });

    group.bench_function("gjk_closest_points_box_cone", |b| {
        b.iter(|| {
            gjk.closest_points(
                black_box(&cube),
                black_box(&cone),
                &id,
                &tilt,
                Vector3::ZERO,
                black_box(Vector3::new(2.0, 1.5, 0.0)),
            )
        });
    });

    group.bench_function("gjk_raycast_box", |b| {
        b.iter(|| {
            gjk.raycast(
                black_box(&cube),
                &tilt,
                Vector3::ZERO,
                black_box(Vector3::new(-5.0, 0.1, 0.2)),
                Vector3::unit_x(),
            )
        });
    });

    group.finish();
}

fn pile(count: usize) -> World {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut world = World::new();

    let mut ground = RigidBody::new(
        Shape::cuboid(Vector3::new(40.0, 1.0, 40.0)).unwrap().into_shared(),
        Material::default(),
    );
    ground.set_position(Vector3::new(0.0, -0.5, 0.0));
    ground.set_static(true);
    world.add_body(ground);

    let cube = Shape::cuboid(Vector3::one()).unwrap().into_shared();
    for _ in 0..count {
        let mut body = RigidBody::new(cube.clone(), Material::default());
        body.set_position(Vector3::new(
            rng.gen_range(-6.0..6.0),
            rng.gen_range(0.5..12.0),
            rng.gen_range(-6.0..6.0),
        ));
        world.add_body(body);
    }
    world
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");
    group.sample_size(20);

    for count in [50, 200] {
        group.bench_function(format!("{count}_boxes_60_steps"), |b| {
            b.iter(|| {
                let mut world = pile(count);
                for _ in 0..60 {
                    world.step(black_box(1.0 / 60.0));
                }
                world.time()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_convex_queries, bench_world_step);
criterion_main!(benches);
