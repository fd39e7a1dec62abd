//! A small tower of boxes settling on a fixed floor.

use stiction::*;

fn main() {
    let mut world = PhysicsWorld::default();

    let mut floor = RigidBody::new_fixed(EntityId::default());
    floor.transform.position = Vec3::new(0.0, -0.5, 0.0);
    let floor_id = world.add_body(floor);
    world
        .add_geometry(floor_id, Geometry::cuboid(Vec3::new(20.0, 0.5, 20.0)))
        .expect("floor registers");

    let mut boxes = Vec::new();
    for level in 0..4 {
        let mut body = RigidBody::default();
        body.transform.position = Vec3::new(0.0, 0.55 + level as f32 * 1.05, 0.0);
        body.set_mass_properties(MassProperties {
            mass: 1.0,
            inertia: Mat3::for_solid_box(Vec3::splat(0.5), 1.0),
        });
        let id = world.add_body(body);
        world
            .add_geometry(id, Geometry::cuboid(Vec3::splat(0.5)))
            .expect("box registers");
        boxes.push(id);
    }

    for frame in 0..300 {
        world.tick().expect("simulation step failed");
        if frame % 60 == 59 {
            print!("t = {:>4.1}s  heights:", (frame + 1) as f32 / 60.0);
            for id in &boxes {
                print!(" {:>6.3}", world.body(*id).unwrap().transform.position.y);
            }
            println!("  constraints = {}", world.constraint_graph().edge_count());
        }
    }
}
