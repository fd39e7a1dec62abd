//! Contact point generation: the generator trait, the concrete generators
//! for the supported shape pairs, and the classifier chain that picks one
//! for a geometry pair.

use glam::Vec3;

use crate::{
    collision::{
        broadphase::GeometryPair,
        narrowphase::{self, NarrowContact},
    },
    core::{
        geometry::{Geometry, Shape},
        rigidbody::RigidBody,
        types::Material,
    },
    utils::math::Pair,
};

/// One contact point between two geometries, with combined material data.
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    pub point: Vec3,
    /// Unit normal pointing from the second body toward the first.
    pub normal: Vec3,
    /// Signed surface gap; negative while penetrating.
    pub distance: f32,
    /// Penetration depth, zero while separated.
    pub depth: f32,
    pub envelope: f32,
    pub restitution: f32,
    pub friction: f32,
}

/// Produces contact points for one geometry pair, re-run every step.
///
/// The pair order returned by [`geometry_pair`](Self::geometry_pair) is the
/// order `run` expects its arguments in; it matches the body order of the
/// owning contact constraint, which keeps normal signs stable.
pub trait ContactGenerator {
    fn geometry_pair(&self) -> GeometryPair;

    fn run(
        &mut self,
        first: &Geometry,
        first_body: &RigidBody,
        second: &Geometry,
        second_body: &RigidBody,
        dt: f32,
    );

    fn contacts(&self) -> &[ContactPoint];

    /// Called once when the generator is discarded, for cleanup.
    fn removed(&mut self) {}
}

/// One link of the classifier chain: inspects a geometry pair and either
/// produces a matching generator or passes.
pub trait ContactGeneratorClassifier {
    fn classify(&self, first: &Geometry, second: &Geometry) -> Option<Box<dyn ContactGenerator>>;
}

/// The classifier chain installed by default: specialized sphere pairs
/// first, then the general convex support-map pair.
pub fn default_classifier_chain() -> Vec<Box<dyn ContactGeneratorClassifier>> {
    vec![
        Box::new(SphereSphereClassifier),
        Box::new(SphereBoxClassifier),
        Box::new(BoxBoxClassifier),
        Box::new(SupportMapClassifier),
    ]
}

fn combined(first: &Geometry, second: &Geometry) -> (f32, f32, f32) {
    let (restitution, friction) = Material::combine_pair(&first.material, &second.material);
    (restitution, friction, first.envelope.max(second.envelope))
}

fn to_contact_point(
    raw: NarrowContact,
    restitution: f32,
    friction: f32,
    envelope: f32,
) -> ContactPoint {
    ContactPoint {
        point: raw.point,
        normal: raw.normal,
        distance: raw.distance,
        depth: (-raw.distance).max(0.0),
        envelope,
        restitution,
        friction,
    }
}

pub struct SphereSphereGenerator {
    pair: GeometryPair,
    points: Vec<ContactPoint>,
}

impl ContactGenerator for SphereSphereGenerator {
    fn geometry_pair(&self) -> GeometryPair {
        self.pair
    }

    fn run(
        &mut self,
        first: &Geometry,
        first_body: &RigidBody,
        second: &Geometry,
        second_body: &RigidBody,
        _dt: f32,
    ) {
        self.points.clear();
        let (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) =
            (&first.shape, &second.shape)
        else {
            return;
        };
        let ta = first.world_transform(&first_body.transform);
        let tb = second.world_transform(&second_body.transform);
        let (restitution, friction, envelope) = combined(first, second);

        if let Some(raw) =
            narrowphase::sphere_sphere(ta.position, *ra, tb.position, *rb, envelope)
        {
            self.points
                .push(to_contact_point(raw, restitution, friction, envelope));
        }
    }

    fn contacts(&self) -> &[ContactPoint] {
        &self.points
    }
}

pub struct SphereBoxGenerator {
    pair: GeometryPair,
    /// Whether the pair's first geometry is the sphere.
    sphere_first: bool,
    points: Vec<ContactPoint>,
}

impl ContactGenerator for SphereBoxGenerator {
    fn geometry_pair(&self) -> GeometryPair {
        self.pair
    }

    fn run(
        &mut self,
        first: &Geometry,
        first_body: &RigidBody,
        second: &Geometry,
        second_body: &RigidBody,
        _dt: f32,
    ) {
        self.points.clear();
        let (sphere, sphere_body, cuboid, cuboid_body) = if self.sphere_first {
            (first, first_body, second, second_body)
        } else {
            (second, second_body, first, first_body)
        };
        let (Shape::Sphere { radius }, Shape::Box { half_extents }) =
            (&sphere.shape, &cuboid.shape)
        else {
            return;
        };

        let sphere_transform = sphere.world_transform(&sphere_body.transform);
        let cuboid_transform = cuboid.world_transform(&cuboid_body.transform);
        let (restitution, friction, envelope) = combined(first, second);

        if let Some(mut raw) = narrowphase::sphere_box(
            sphere_transform.position,
            *radius,
            &cuboid_transform,
            *half_extents,
            envelope,
        ) {
            // the narrow phase points box-to-sphere; flip when the box is
            // the pair's first geometry
            if !self.sphere_first {
                raw.normal = -raw.normal;
            }
            self.points
                .push(to_contact_point(raw, restitution, friction, envelope));
        }
    }

    fn contacts(&self) -> &[ContactPoint] {
        &self.points
    }
}

pub struct BoxBoxGenerator {
    pair: GeometryPair,
    points: Vec<ContactPoint>,
}

impl ContactGenerator for BoxBoxGenerator {
    fn geometry_pair(&self) -> GeometryPair {
        self.pair
    }

    fn run(
        &mut self,
        first: &Geometry,
        first_body: &RigidBody,
        second: &Geometry,
        second_body: &RigidBody,
        _dt: f32,
    ) {
        self.points.clear();
        let (Shape::Box { half_extents: ha }, Shape::Box { half_extents: hb }) =
            (&first.shape, &second.shape)
        else {
            return;
        };
        let ta = first.world_transform(&first_body.transform);
        let tb = second.world_transform(&second_body.transform);
        let (restitution, friction, envelope) = combined(first, second);

        for raw in narrowphase::box_box(&ta, *ha, &tb, *hb, envelope) {
            self.points
                .push(to_contact_point(raw, restitution, friction, envelope));
        }
    }

    fn contacts(&self) -> &[ContactPoint] {
        &self.points
    }
}

pub struct SupportMapGenerator {
    pair: GeometryPair,
    points: Vec<ContactPoint>,
}

impl ContactGenerator for SupportMapGenerator {
    fn geometry_pair(&self) -> GeometryPair {
        self.pair
    }

    fn run(
        &mut self,
        first: &Geometry,
        first_body: &RigidBody,
        second: &Geometry,
        second_body: &RigidBody,
        _dt: f32,
    ) {
        self.points.clear();
        let ta = first.world_transform(&first_body.transform);
        let tb = second.world_transform(&second_body.transform);
        let (restitution, friction, envelope) = combined(first, second);

        if let Some(raw) = narrowphase::support_map_contact(first, &ta, second, &tb) {
            self.points
                .push(to_contact_point(raw, restitution, friction, envelope));
        }
    }

    fn contacts(&self) -> &[ContactPoint] {
        &self.points
    }
}

pub struct SphereSphereClassifier;

impl ContactGeneratorClassifier for SphereSphereClassifier {
    fn classify(&self, first: &Geometry, second: &Geometry) -> Option<Box<dyn ContactGenerator>> {
        match (&first.shape, &second.shape) {
            (Shape::Sphere { .. }, Shape::Sphere { .. }) => Some(Box::new(SphereSphereGenerator {
                pair: Pair::new(first.id, second.id),
                points: Vec::new(),
            })),
            _ => None,
        }
    }
}

pub struct SphereBoxClassifier;

impl ContactGeneratorClassifier for SphereBoxClassifier {
    fn classify(&self, first: &Geometry, second: &Geometry) -> Option<Box<dyn ContactGenerator>> {
        let sphere_first = match (&first.shape, &second.shape) {
            (Shape::Sphere { .. }, Shape::Box { .. }) => true,
            (Shape::Box { .. }, Shape::Sphere { .. }) => false,
            _ => return None,
        };
        Some(Box::new(SphereBoxGenerator {
            pair: Pair::new(first.id, second.id),
            sphere_first,
            points: Vec::new(),
        }))
    }
}

pub struct BoxBoxClassifier;

impl ContactGeneratorClassifier for BoxBoxClassifier {
    fn classify(&self, first: &Geometry, second: &Geometry) -> Option<Box<dyn ContactGenerator>> {
        match (&first.shape, &second.shape) {
            (Shape::Box { .. }, Shape::Box { .. }) => Some(Box::new(BoxBoxGenerator {
                pair: Pair::new(first.id, second.id),
                points: Vec::new(),
            })),
            _ => None,
        }
    }
}

/// Catch-all for convex support-mapped pairs.
pub struct SupportMapClassifier;

impl ContactGeneratorClassifier for SupportMapClassifier {
    fn classify(&self, first: &Geometry, second: &Geometry) -> Option<Box<dyn ContactGenerator>> {
        Some(Box::new(SupportMapGenerator {
            pair: Pair::new(first.id, second.id),
            points: Vec::new(),
        }))
    }
}
