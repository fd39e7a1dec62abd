use glam::{Quat, Vec3};

use crate::{core::rigidbody::RigidBody, utils::allocator::Arena};

/// Steps rigid bodies forward in time.
///
/// External forces enter the solve as delta-velocities; after the solver has
/// accumulated constraint impulses on top, `advance` folds the deltas into
/// the real velocities and integrates positions.
#[derive(Debug, Clone, Default)]
pub struct Integrator;

impl Integrator {
    /// Converts the force accumulators into pre-solve delta-velocities.
    pub fn apply_forces(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for body in bodies.iter_mut() {
            if body.fixed {
                continue;
            }
            body.delta_velocity += body.acceleration * dt;
            body.acceleration = Vec3::ZERO;
        }
    }

    /// Applies solved delta-velocities and integrates positions.
    pub fn advance(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for body in bodies.iter_mut() {
            if body.fixed {
                continue;
            }

            body.velocity.linear += body.delta_velocity;
            body.velocity.angular += body.delta_omega;

            body.velocity.linear *= (1.0 - body.linear_damping * dt).max(0.0);
            body.velocity.angular *= (1.0 - body.angular_damping * dt).max(0.0);

            body.transform.position += body.velocity.linear * dt;

            let omega = body.velocity.angular.length();
            if omega > 1e-6 {
                let axis = body.velocity.angular / omega;
                let delta = Quat::from_axis_angle(axis, omega * dt);
                body.transform.rotation = (delta * body.transform.rotation).normalize();
            }
        }
    }
}
