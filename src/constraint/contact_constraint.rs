use glam::Vec3;

use crate::{
    collision::{broadphase::BodyPair, contact::ContactGenerator, contact::ContactPoint},
    config::SolverConfig,
    core::{geometry::Geometry, rigidbody::RigidBody},
    dynamics::solver::NcpRow,
    utils::{
        allocator::{Arena, EntityId},
        math::{tangent_basis, Pair},
    },
};

/// Persistent per-row state carried across frames.
///
/// Slots are reused positionally for a given contact slot: only appended or
/// truncated when the contact point count changes, never reset wholesale,
/// since resetting would lose the stick anchors every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowSlot {
    /// Impulse solved in the previous step.
    pub lambda: f32,
    pub sticking: bool,
    /// Contact anchor in the first body's local frame, captured on stick.
    pub stick_first: Vec3,
    /// Contact anchor in the second body's local frame, captured on stick.
    pub stick_second: Vec3,
}

/// Frictional contact constraint between one ordered body pair.
///
/// Aggregates one contact generator per interacting geometry pair (compound
/// bodies touch through several patches at once) and re-runs them every step
/// to produce contact points. Each point yields one normal row and two
/// tangential friction rows; the friction rows run a two-state stick/slip
/// machine against the previous step's impulses.
pub struct ContactConstraint {
    first: EntityId,
    second: EntityId,
    generators: Vec<(u64, Box<dyn ContactGenerator>)>,
    slots: Vec<RowSlot>,
    points: Vec<ContactPoint>,
    coupling_enabled: bool,
    friction_bound: f32,
}

impl ContactConstraint {
    pub fn new(first: EntityId, second: EntityId) -> Self {
        Self {
            first,
            second,
            generators: Vec::new(),
            slots: Vec::new(),
            points: Vec::new(),
            coupling_enabled: true,
            friction_bound: f32::INFINITY,
        }
    }

    pub fn bodies(&self) -> BodyPair {
        Pair::new(self.first, self.second)
    }

    pub fn first_body(&self) -> EntityId {
        self.first
    }

    pub fn second_body(&self) -> EntityId {
        self.second
    }

    pub fn add_generator(&mut self, id: u64, generator: Box<dyn ContactGenerator>) {
        self.generators.push((id, generator));
    }

    /// Removes a generator by id, invoking its cleanup hook.
    pub fn remove_generator(&mut self, id: u64) -> bool {
        if let Some(position) = self.generators.iter().position(|(gid, _)| *gid == id) {
            let (_, mut generator) = self.generators.remove(position);
            generator.removed();
            true
        } else {
            false
        }
    }

    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    /// Whether friction bounds follow the live normal impulse (Coulomb cone
    /// approximation). When disabled the bounds stay fixed.
    pub fn set_coupling_enabled(&mut self, enabled: bool) {
        self.coupling_enabled = enabled;
    }

    pub fn set_fixed_friction_bound(&mut self, magnitude: f32) {
        self.friction_bound = magnitude;
    }

    pub fn row_slots(&self) -> &[RowSlot] {
        &self.slots
    }

    pub fn contact_count(&self) -> usize {
        self.points.len()
    }

    /// Summed normal impulse of the previous solve, for threshold triggers.
    pub fn total_normal_impulse(&self) -> f32 {
        self.slots.iter().step_by(3).map(|slot| slot.lambda).sum()
    }

    /// Re-runs the generators and appends this constraint's rows for the
    /// current step.
    pub fn apply_constraints(
        &mut self,
        bodies: &Arena<RigidBody>,
        geometries: &Arena<Geometry>,
        dt: f32,
        config: &SolverConfig,
        rows: &mut Vec<NcpRow>,
    ) {
        self.points.clear();
        for (_, generator) in &mut self.generators {
            let pair = generator.geometry_pair();
            let (Some(first_geom), Some(second_geom)) =
                (geometries.get(pair.first), geometries.get(pair.second))
            else {
                continue;
            };
            let (Some(first_body), Some(second_body)) =
                (bodies.get(first_geom.body), bodies.get(second_geom.body))
            else {
                continue;
            };
            generator.run(first_geom, first_body, second_geom, second_body, dt);
            self.points.extend_from_slice(generator.contacts());
        }

        // resize slot storage only when the contact count changes, so the
        // surviving slots keep their impulses and stick anchors
        let needed = self.points.len() * 3;
        if self.slots.len() > needed {
            self.slots.truncate(needed);
        }
        while self.slots.len() < needed {
            self.slots.push(RowSlot::default());
        }

        let (Some(body1), Some(body2)) = (bodies.get(self.first), bodies.get(self.second)) else {
            return;
        };

        for (index, contact) in self.points.iter().enumerate() {
            build_contact_rows(
                contact,
                body1,
                body2,
                &mut self.slots[index * 3..index * 3 + 3],
                dt,
                config,
                self.coupling_enabled,
                self.friction_bound,
                rows,
            );
        }
    }

    /// Copies solved impulses back into the persistent slots; `rows` is this
    /// constraint's span of the flattened row list.
    pub fn store_impulses(&mut self, rows: &[NcpRow]) {
        for (slot, row) in self.slots.iter_mut().zip(rows.iter()) {
            slot.lambda = row.lambda;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_contact_rows(
    contact: &ContactPoint,
    body1: &RigidBody,
    body2: &RigidBody,
    slots: &mut [RowSlot],
    dt: f32,
    config: &SolverConfig,
    coupling_enabled: bool,
    friction_bound: f32,
    rows: &mut Vec<NcpRow>,
) {
    let normal = contact.normal;
    let (_, t2, t3) = tangent_basis(normal);
    let r1 = contact.point - body1.transform.position;
    let r2 = contact.point - body2.transform.position;

    // normal row
    let j1 = normal;
    let j2 = r1.cross(normal);
    let j3 = -normal;
    let j4 = -(r2.cross(normal));
    let b1 = j1 * body1.inverse_mass;
    let b2 = body1.inverse_inertia * j2;
    let b3 = j3 * body2.inverse_mass;
    let b4 = body2.inverse_inertia * j4;

    let uni = j1.dot(body1.velocity.linear)
        + j2.dot(body1.velocity.angular)
        + j3.dot(body2.velocity.linear)
        + j4.dot(body2.velocity.angular);
    let unf = if uni < 0.0 {
        -contact.restitution * uni
    } else {
        0.0
    };

    // position correction: reach zero penetration next step, unless the
    // bounce velocity alone already carries the contact out of the envelope
    let mut correction = contact.depth / dt;
    let escape = (contact.envelope - contact.distance) / dt;
    if unf > escape {
        correction = 0.0;
    } else if correction > 0.0 {
        if unf > correction {
            correction = 0.0;
        } else {
            correction -= unf;
        }
    }
    correction = correction.clamp(
        -config.max_correction_velocity,
        config.max_correction_velocity,
    );
    correction *= config.normal_stabilisation;

    let previous_normal = slots[0].lambda;
    rows.push(NcpRow {
        first: body1.id,
        second: body2.id,
        j1,
        j2,
        j3,
        j4,
        b1,
        b2,
        b3,
        b4,
        lower: 0.0,
        upper: f32::INFINITY,
        rhs: -(unf - uni) - correction,
        diagonal: j1.dot(b1) + j2.dot(b2) + j3.dot(b3) + j4.dot(b4),
        mu: contact.friction,
        coupling: None,
        lambda: 0.0,
    });
    let normal_index = rows.len() - 1;

    for (offset, tangent) in [t2, t3].into_iter().enumerate() {
        let slot = &mut slots[1 + offset];

        let j1 = tangent;
        let j2 = r1.cross(tangent);
        let j3 = -tangent;
        let j4 = -(r2.cross(tangent));
        let b1 = j1 * body1.inverse_mass;
        let b2 = body1.inverse_inertia * j2;
        let b3 = j3 * body2.inverse_mass;
        let b4 = body2.inverse_inertia * j4;

        let uti = j1.dot(body1.velocity.linear)
            + j2.dot(body1.velocity.angular)
            + j3.dot(body2.velocity.linear)
            + j4.dot(body2.velocity.angular);

        // while sticking, drive the tangential velocity against the drift
        // between the remembered anchors, re-projected through the current
        // body transforms
        let utf = if slot.sticking {
            let drift = body1.transform.to_world(slot.stick_first)
                - body2.transform.to_world(slot.stick_second);
            -tangent.dot(drift) * config.friction_stabilisation
        } else {
            0.0
        };

        if slot.sticking {
            // release once the bound is nearly saturated
            if previous_normal * contact.friction - slot.lambda.abs() < config.release_limit {
                slot.sticking = false;
            }
        } else if slot.lambda.abs() < previous_normal * contact.friction * config.kickin_factor {
            slot.sticking = true;
            slot.stick_first = body1.transform.to_local(contact.point);
            slot.stick_second = body2.transform.to_local(contact.point);
        }

        rows.push(NcpRow {
            first: body1.id,
            second: body2.id,
            j1,
            j2,
            j3,
            j4,
            b1,
            b2,
            b3,
            b4,
            lower: -friction_bound,
            upper: friction_bound,
            rhs: -(utf - uti),
            diagonal: j1.dot(b1) + j2.dot(b2) + j3.dot(b3) + j4.dot(b4),
            mu: contact.friction,
            coupling: coupling_enabled.then_some(normal_index),
            lambda: 0.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact::{ContactGeneratorClassifier, SphereBoxClassifier};

    #[test]
    fn slots_survive_while_contact_count_is_stable() {
        let mut bodies = Arena::new();
        let a = bodies.insert(RigidBody::default());
        let mut fixed = RigidBody::new_fixed(EntityId::default());
        fixed.transform.position.y = -1.0;
        let b = bodies.insert(fixed);
        bodies.get_mut(a).unwrap().id = a;
        bodies.get_mut(b).unwrap().id = b;

        let mut geometries: Arena<Geometry> = Arena::new();
        let ga = geometries.insert(Geometry::sphere(0.5));
        let gb = geometries.insert(Geometry::cuboid(glam::Vec3::new(4.0, 0.5, 4.0)));
        geometries.get_mut(ga).unwrap().id = ga;
        geometries.get_mut(ga).unwrap().body = a;
        geometries.get_mut(gb).unwrap().id = gb;
        geometries.get_mut(gb).unwrap().body = b;

        let mut constraint = ContactConstraint::new(a, b);
        let classifier = SphereBoxClassifier;
        let generator = classifier
            .classify(geometries.get(ga).unwrap(), geometries.get(gb).unwrap())
            .expect("sphere-box pair is classifiable");
        constraint.add_generator(1, generator);

        let config = SolverConfig::default();
        let mut rows = Vec::new();
        constraint.apply_constraints(&bodies, &geometries, 1.0 / 60.0, &config, &mut rows);
        assert_eq!(rows.len(), 3);
        assert_eq!(constraint.row_slots().len(), 3);

        // fake a solve and verify persistence across a second application
        rows[0].lambda = 2.0;
        constraint.store_impulses(&rows);
        assert_eq!(constraint.total_normal_impulse(), 2.0);

        let mut rows2 = Vec::new();
        constraint.apply_constraints(&bodies, &geometries, 1.0 / 60.0, &config, &mut rows2);
        assert_eq!(constraint.row_slots().len(), 3);
        // friction slots saw a positive previous normal impulse and stick
        assert!(constraint.row_slots()[1].sticking);
        assert!(constraint.row_slots()[2].sticking);
    }
}
