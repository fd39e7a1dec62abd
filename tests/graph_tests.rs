use stiction::*;

fn fixed_floor(world: &mut PhysicsWorld, position: Vec3, half_extents: Vec3) -> EntityId {
    let mut floor = RigidBody::new_fixed(EntityId::default());
    floor.transform.position = position;
    let floor_id = world.add_body(floor);
    world
        .add_geometry(floor_id, Geometry::cuboid(half_extents))
        .expect("floor registers");
    floor_id
}

fn unit_box(world: &mut PhysicsWorld, position: Vec3) -> EntityId {
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
fn bodies_sharing_only_a_fixed_floor_stay_in_separate_components() {
    let mut world = PhysicsWorld::default();
    fixed_floor(&mut world, Vec3::new(0.0, -0.5, 0.0), Vec3::new(20.0, 0.5, 20.0));

    // far apart on the same floor: each contacts only the delimiter
    let left = unit_box(&mut world, Vec3::new(-5.0, 0.55, 0.0));
    let right = unit_box(&mut world, Vec3::new(5.0, 0.55, 0.0));

    world.tick().expect("tick succeeds");

    let graph = world.constraint_graph();
    assert_eq!(graph.component_count(), 2);
    let left_component = graph.component_of(left).expect("left has contacts");
    let right_component = graph.component_of(right).expect("right has contacts");
    assert_ne!(left_component, right_component);
}

#[test]
fn directly_touching_bodies_share_a_component() {
    let mut world = PhysicsWorld::default();
    fixed_floor(&mut world, Vec3::new(0.0, -0.5, 0.0), Vec3::new(20.0, 0.5, 20.0));

    // adjacent with a gap inside the contact envelope
    let left = unit_box(&mut world, Vec3::new(0.0, 0.55, 0.0));
    let right = unit_box(&mut world, Vec3::new(1.05, 0.55, 0.0));

    world.tick().expect("tick succeeds");

    let graph = world.constraint_graph();
    let left_component = graph.component_of(left).expect("left has contacts");
    let right_component = graph.component_of(right).expect("right has contacts");
    assert_eq!(left_component, right_component);
}

#[test]
fn a_joint_occupied_pair_refuses_contact_constraints() {
    let mut world = PhysicsWorld::default();
    world.gravity = Vec3::ZERO;

    let a = unit_box(&mut world, Vec3::ZERO);
    let b = unit_box(&mut world, Vec3::new(0.8, 0.0, 0.0));

    let joint = Joint::ball_socket(
        world.body(a).unwrap(),
        world.body(b).unwrap(),
        Vec3::new(0.4, 0.0, 0.0),
    );
    world.add_joint(joint).expect("pair is free");

    // the boxes overlap, but the pair already holds a joint
    world.tick().expect("tick succeeds");

    let pair = Pair::new(a, b);
    let graph = world.constraint_graph();
    assert!(graph.contains_edge(&pair));
    assert!(matches!(graph.edge(&pair), Some(Constraint::Joint(_))));
    assert!(world.contact_constraint(&pair).is_none());
}

#[test]
fn adding_a_second_joint_on_an_occupied_pair_fails() {
    let mut world = PhysicsWorld::default();
    let a = unit_box(&mut world, Vec3::ZERO);
    let b = unit_box(&mut world, Vec3::new(3.0, 0.0, 0.0));

    let make_joint = |world: &PhysicsWorld| {
        Joint::ball_socket(
            world.body(a).unwrap(),
            world.body(b).unwrap(),
            Vec3::new(1.5, 0.0, 0.0),
        )
    };
    world.add_joint(make_joint(&world)).expect("pair is free");
    assert!(world.add_joint(make_joint(&world)).is_err());
}

#[test]
fn ball_socket_joint_keeps_anchors_together_under_gravity() {
    let mut world = PhysicsWorld::default();

    let mut anchor_body = RigidBody::new_fixed(EntityId::default());
    anchor_body.transform.position = Vec3::ZERO;
    let anchor = world.add_body(anchor_body);

    let mut bob = RigidBody::default();
    bob.transform.position = Vec3::new(1.0, 0.0, 0.0);
    let bob_id = world.add_body(bob);

    let joint = Joint::ball_socket(
        world.body(anchor).unwrap(),
        world.body(bob_id).unwrap(),
        Vec3::ZERO,
    );
    world.add_joint(joint).expect("pair is free");

    for _ in 0..60 {
        world.tick().expect("tick succeeds");
    }

    // the bob swings but its anchor point stays near the pivot
    let bob_body = world.body(bob_id).unwrap();
    let anchor_world = bob_body.transform.to_world(Vec3::new(-1.0, 0.0, 0.0));
    assert!(
        anchor_world.length() < 0.3,
        "anchor drifted to {anchor_world:?}"
    );
}
