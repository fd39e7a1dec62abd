use glam::Vec3;

use crate::{core::rigidbody::RigidBody, utils::allocator::Arena};

/// An external force generator applied to every body each step.
pub trait ForceGenerator {
    fn apply(&self, body: &mut RigidBody, dt: f32);
}

/// Constant gravity scaled per body.
pub struct GravityForce {
    pub gravity: Vec3,
}

impl GravityForce {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl ForceGenerator for GravityForce {
    fn apply(&self, body: &mut RigidBody, _dt: f32) {
        if body.fixed {
            return;
        }
        let force = self.gravity * body.mass_properties.mass * body.gravity_scale;
        body.apply_force(force);
    }
}

/// Quadratic drag resisting the direction of motion.
pub struct DragForce {
    pub drag_coefficient: f32,
}

impl ForceGenerator for DragForce {
    fn apply(&self, body: &mut RigidBody, _dt: f32) {
        if body.fixed {
            return;
        }
        let speed = body.velocity.linear.length();
        if speed < 1e-6 {
            return;
        }
        let drag = -body.velocity.linear.normalize() * speed * speed * self.drag_coefficient;
        body.apply_force(drag);
    }
}

/// Collection of forces applied every step, before the broadphase runs.
#[derive(Default)]
pub struct ForceRegistry {
    forces: Vec<Box<dyn ForceGenerator>>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_force<F: ForceGenerator + 'static>(&mut self, force: F) {
        self.forces.push(Box::new(force));
    }

    pub fn apply_all(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for force in &self.forces {
            for body in bodies.iter_mut() {
                force.apply(body, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gravity_accelerates_dynamic_bodies_only() {
        let mut bodies = Arena::new();
        let falling = bodies.insert(RigidBody::default());
        let anchored = bodies.insert(RigidBody::new_fixed(Default::default()));

        let mut registry = ForceRegistry::new();
        registry.add_force(GravityForce::new(Vec3::new(0.0, -9.81, 0.0)));
        registry.apply_all(&mut bodies, 1.0 / 60.0);

        assert_relative_eq!(bodies.get(falling).unwrap().acceleration.y, -9.81);
        assert_eq!(bodies.get(anchored).unwrap().acceleration, Vec3::ZERO);
    }

    #[test]
    fn drag_opposes_the_direction_of_motion() {
        let mut bodies = Arena::new();
        let id = bodies.insert(RigidBody::default());
        bodies
            .get_mut(id)
            .unwrap()
            .set_velocity(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);

        let drag = DragForce {
            drag_coefficient: 0.5,
        };
        drag.apply(bodies.get_mut(id).unwrap(), 1.0 / 60.0);

        let acceleration = bodies.get(id).unwrap().acceleration;
        assert!(acceleration.x < 0.0);
        assert_relative_eq!(acceleration.x, -4.5, epsilon = 1e-5);
        assert_eq!(acceleration.y, 0.0);
    }
}
