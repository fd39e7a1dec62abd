use stiction::*;

fn world_with_floor() -> (PhysicsWorld, EntityId) {
    let mut world = PhysicsWorld::default();
    let mut floor = RigidBody::new_fixed(EntityId::default());
    floor.transform.position = Vec3::new(0.0, -0.5, 0.0);
    let floor_id = world.add_body(floor);
    world
        .add_geometry(floor_id, Geometry::cuboid(Vec3::new(20.0, 0.5, 20.0)))
        .expect("floor registers");
    (world, floor_id)
}

fn resting_box(world: &mut PhysicsWorld, position: Vec3) -> EntityId {
    let mut body = RigidBody::default();
    body.transform.position = position;
    body.set_mass_properties(MassProperties {
        mass: 1.0,
        inertia: Mat3::for_solid_box(Vec3::splat(0.5), 1.0),
    });
    let id = world.add_body(body);
    world
        .add_geometry(id, Geometry::cuboid(Vec3::splat(0.5)))
        .expect("box registers");
    id
}

#[test]
fn coupled_friction_rows_stay_inside_the_cone() {
    let (mut world, floor_id) = world_with_floor();
    let box_id = resting_box(&mut world, Vec3::new(0.0, 0.55, 0.0));
    // sideways shove so friction has something to resist
    world
        .body_mut(box_id)
        .unwrap()
        .set_velocity(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);

    for _ in 0..90 {
        world.tick().expect("tick succeeds");

        let pair = Pair::new(box_id, floor_id);
        let Some(constraint) = world.contact_constraint(&pair) else {
            continue;
        };
        let friction = world
            .geometry(world.body(box_id).unwrap().geometries[0])
            .unwrap()
            .material
            .friction;
        let slots = constraint.row_slots();
        for point in slots.chunks_exact(3) {
            let normal_lambda = point[0].lambda;
            for tangential in &point[1..] {
                assert!(
                    tangential.lambda.abs() <= normal_lambda.abs() * friction + 1e-3,
                    "friction impulse {} escapes cone {}",
                    tangential.lambda,
                    normal_lambda.abs() * friction
                );
            }
        }
    }
}

#[test]
fn friction_brings_a_sliding_box_to_rest() {
    let (mut world, _) = world_with_floor();
    let box_id = resting_box(&mut world, Vec3::new(0.0, 0.55, 0.0));
    world
        .body_mut(box_id)
        .unwrap()
        .set_velocity(Vec3::new(1.5, 0.0, 0.0), Vec3::ZERO);

    for _ in 0..240 {
        world.tick().expect("tick succeeds");
    }

    let speed = world.body(box_id).unwrap().velocity.linear.length();
    assert!(speed < 0.05, "box still sliding at {speed} m/s");
}

#[test]
fn resting_contact_does_not_oscillate_between_stick_states() {
    let (mut world, floor_id) = world_with_floor();
    let box_id = resting_box(&mut world, Vec3::new(0.0, 0.55, 0.0));

    // settle first
    for _ in 0..90 {
        world.tick().expect("tick succeeds");
    }

    let pair = Pair::new(box_id, floor_id);
    let initial: Vec<bool> = world
        .contact_constraint(&pair)
        .expect("box rests on floor")
        .row_slots()
        .iter()
        .map(|slot| slot.sticking)
        .collect();
    assert!(
        initial.iter().skip(1).step_by(3).all(|sticking| *sticking),
        "settled friction rows should stick"
    );

    for _ in 0..60 {
        world.tick().expect("tick succeeds");
        let states: Vec<bool> = world
            .contact_constraint(&pair)
            .expect("contact persists at rest")
            .row_slots()
            .iter()
            .map(|slot| slot.sticking)
            .collect();
        assert_eq!(states, initial, "stick/slip state flapped at rest");
    }
}

#[test]
fn disabling_coupling_uses_the_fixed_friction_bound() {
    struct FixedBoundCreator;
    impl ContactConstraintCreator for FixedBoundCreator {
        fn create(&self, first: &RigidBody, second: &RigidBody) -> Option<ContactConstraint> {
            let mut constraint = ContactConstraint::new(first.id, second.id);
            constraint.set_coupling_enabled(false);
            constraint.set_fixed_friction_bound(0.01);
            Some(constraint)
        }
    }

    let (mut world, floor_id) = world_with_floor();
    world
        .contact_manager_mut()
        .add_creator(Box::new(FixedBoundCreator));
    let box_id = resting_box(&mut world, Vec3::new(0.0, 0.55, 0.0));
    world
        .body_mut(box_id)
        .unwrap()
        .set_velocity(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);

    for _ in 0..30 {
        world.tick().expect("tick succeeds");
        let pair = Pair::new(box_id, floor_id);
        if let Some(constraint) = world.contact_constraint(&pair) {
            for point in constraint.row_slots().chunks_exact(3) {
                for tangential in &point[1..] {
                    assert!(tangential.lambda.abs() <= 0.01 + 1e-5);
                }
            }
        }
    }
}
