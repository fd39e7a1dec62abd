//! A sphere dropped onto a fixed floor.

use stiction::*;

fn main() {
    let mut world = PhysicsWorld::default();

    let mut floor = RigidBody::new_fixed(EntityId::default());
    floor.transform.position = Vec3::new(0.0, -0.5, 0.0);
    let floor_id = world.add_body(floor);
    world
        .add_geometry(floor_id, Geometry::cuboid(Vec3::new(20.0, 0.5, 20.0)))
        .expect("floor registers");

    let mut sphere = RigidBody::default();
    sphere.transform.position = Vec3::new(0.0, 5.0, 0.0);
    sphere.set_mass_properties(MassProperties {
        mass: 1.0,
        inertia: Mat3::for_solid_sphere(0.5, 1.0),
    });
    let sphere_id = world.add_body(sphere);
    world
        .add_geometry(
            sphere_id,
            Geometry::sphere(0.5).with_material(Material::rubber()),
        )
        .expect("sphere registers");

    for frame in 0..240 {
        world.tick().expect("simulation step failed");
        if frame % 20 == 0 {
            let body = world.body(sphere_id).unwrap();
            println!(
                "t = {:>5.2}s  y = {:>6.3}  vy = {:>7.3}  contacts = {}",
                frame as f32 / 60.0,
                body.transform.position.y,
                body.velocity.linear.y,
                world.constraint_graph().edge_count(),
            );
        }
    }
}
