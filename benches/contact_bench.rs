use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use stiction::*;

const DT: f32 = 1.0 / 60.0;

fn prepare_world(body_count: usize) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(DT);

    let mut floor = RigidBody::new_fixed(EntityId::default());
    floor.transform.position = Vec3::new(0.0, -0.5, 0.0);
    let floor_id = world.add_body(floor);
    world
        .add_geometry(floor_id, Geometry::cuboid(Vec3::new(200.0, 0.5, 200.0)))
        .expect("floor registers");

    let side = (body_count as f32).sqrt().ceil() as usize;
    for i in 0..body_count {
        let x = (i % side) as f32 * 1.2;
        let z = (i / side) as f32 * 1.2;
        let mut body = RigidBody::default();
        body.transform.position = Vec3::new(x, 0.55, z);
        body.set_mass_properties(MassProperties {
            mass: 1.0,
            inertia: Mat3::for_solid_sphere(0.5, 1.0),
        });
        let id = world.add_body(body);
        world
            .add_geometry(id, Geometry::sphere(0.5))
            .expect("sphere registers");
    }
    world
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    for &count in &[64usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("resting", count), &count, |b, &count| {
            let mut world = prepare_world(count);
            // settle once so the bench measures the coherent steady state
            for _ in 0..5 {
                world.tick().expect("tick succeeds");
            }
            b.iter(|| {
                world.tick().expect("tick succeeds");
                black_box(world.constraint_graph().edge_count());
            })
        });
    }
    group.finish();
}

fn bench_broadphase_coherent(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadphase_run");
    for &count in &[256usize, 1024] {
        group.bench_with_input(BenchmarkId::new("coherent", count), &count, |b, &count| {
            let mut world = prepare_world(count);
            world.tick().expect("tick succeeds");
            b.iter(|| {
                // nearly-sorted axes: the insertion sort should be cheap
                world.tick().expect("tick succeeds");
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tick, bench_broadphase_coherent);
criterion_main!(benches);
