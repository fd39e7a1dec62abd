use crate::utils::allocator::EntityId;

use super::types::{MassProperties, Transform, Velocity};
use glam::{Mat3, Vec3};

/// Core rigid body description storing kinematic state and properties.
///
/// A body owns its geometries (as ids into the geometry arena); each geometry
/// keeps a non-owning back-reference. `delta_velocity`/`delta_omega` are the
/// solver's per-step accumulators: constraint impulses land there and are
/// folded into the real velocities at the end of the tick.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub id: EntityId,
    pub transform: Transform,
    pub velocity: Velocity,
    pub acceleration: Vec3,
    pub delta_velocity: Vec3,
    pub delta_omega: Vec3,
    pub mass_properties: MassProperties,
    pub gravity_scale: f32,
    pub fixed: bool,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub inverse_mass: f32,
    pub inverse_inertia: Mat3,
    pub geometries: Vec<EntityId>,
}

impl Default for RigidBody {
    fn default() -> Self {
        let mut body = Self {
            id: EntityId::default(),
            transform: Transform::default(),
            velocity: Velocity::default(),
            acceleration: Vec3::ZERO,
            delta_velocity: Vec3::ZERO,
            delta_omega: Vec3::ZERO,
            mass_properties: MassProperties::default(),
            gravity_scale: 1.0,
            fixed: false,
            linear_damping: 0.02,
            angular_damping: 0.02,
            inverse_mass: 1.0,
            inverse_inertia: Mat3::IDENTITY,
            geometries: Vec::new(),
        };
        body.recompute_inverses();
        body
    }
}

impl RigidBody {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// A body with infinite mass: it never moves and delimits constraint
    /// components.
    pub fn new_fixed(id: EntityId) -> Self {
        let mut body = Self::new(id);
        body.set_fixed(true);
        body
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
        self.recompute_inverses();
    }

    pub fn set_velocity(&mut self, linear: Vec3, angular: Vec3) {
        self.velocity.linear = linear;
        self.velocity.angular = angular;
    }

    pub fn apply_force(&mut self, force: Vec3) {
        if self.fixed {
            return;
        }
        self.acceleration += force * self.inverse_mass;
    }

    pub fn apply_impulse(&mut self, impulse: Vec3, position: Vec3) {
        if self.fixed {
            return;
        }
        self.velocity.linear += impulse * self.inverse_mass;
        let torque = (position - self.transform.position).cross(impulse);
        self.velocity.angular += self.inverse_inertia * torque;
    }

    pub fn set_mass_properties(&mut self, props: MassProperties) {
        self.mass_properties = props;
        self.recompute_inverses();
    }

    pub(crate) fn clear_accumulators(&mut self) {
        self.acceleration = Vec3::ZERO;
        self.delta_velocity = Vec3::ZERO;
        self.delta_omega = Vec3::ZERO;
    }

    fn recompute_inverses(&mut self) {
        if self.fixed {
            self.inverse_mass = 0.0;
            self.inverse_inertia = Mat3::ZERO;
            return;
        }
        self.inverse_mass = if self.mass_properties.mass.abs() < f32::EPSILON {
            0.0
        } else {
            1.0 / self.mass_properties.mass
        };
        if self.mass_properties.inertia.determinant().abs() < f32::EPSILON {
            self.inverse_inertia = Mat3::IDENTITY;
        } else {
            self.inverse_inertia = self.mass_properties.inertia.inverse();
        }
    }
}
