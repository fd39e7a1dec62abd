use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of an entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Builds a homogeneous matrix representation of the transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Applies another transform on top of this one, returning the composition.
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * other.position,
            rotation: (self.rotation * other.rotation).normalize(),
        }
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.conjugate() * (world - self.position)
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

/// Mass and inertia tensor data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub inertia: Mat3,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Mat3::IDENTITY,
        }
    }
}

/// Surface coefficients consumed by the contact model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.1,
            friction: 0.5,
        }
    }
}

impl Material {
    pub fn rubber() -> Self {
        Self {
            restitution: 0.8,
            friction: 1.1,
        }
    }

    pub fn steel() -> Self {
        Self {
            restitution: 0.4,
            friction: 0.5,
        }
    }

    pub fn ice() -> Self {
        Self {
            restitution: 0.05,
            friction: 0.04,
        }
    }

    /// Combined coefficients for a contact between two materials,
    /// returned as (restitution, friction).
    pub fn combine_pair(a: &Self, b: &Self) -> (f32, f32) {
        (
            0.5 * (a.restitution + b.restitution),
            0.5 * (a.friction + b.friction),
        )
    }
}

/// Helper constructors for inertia tensors of common solids.
pub trait InertiaTensorExt {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3;
    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3;
}

impl InertiaTensorExt for Mat3 {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3 {
        let lx = half_extents.x * 2.0;
        let ly = half_extents.y * 2.0;
        let lz = half_extents.z * 2.0;
        let factor = mass / 12.0;
        Mat3::from_diagonal(Vec3::new(
            factor * (ly * ly + lz * lz),
            factor * (lx * lx + lz * lz),
            factor * (lx * lx + ly * ly),
        ))
    }

    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3 {
        let value = 0.4 * mass * radius * radius;
        Mat3::from_diagonal(Vec3::splat(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn materials_combine_by_averaging() {
        let (restitution, friction) = Material::combine_pair(
            &Material {
                restitution: 1.0,
                friction: 0.8,
            },
            &Material {
                restitution: 0.0,
                friction: 0.4,
            },
        );
        assert_relative_eq!(restitution, 0.5);
        assert_relative_eq!(friction, 0.6);
    }

    #[test]
    fn transform_roundtrips_points() {
        let transform = Transform::from_position_rotation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
        );
        let local = Vec3::new(-0.3, 0.5, 0.1);
        let back = transform.to_local(transform.to_world(local));
        assert_relative_eq!(back.x, local.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, local.y, epsilon = 1e-6);
        assert_relative_eq!(back.z, local.z, epsilon = 1e-6);
    }
}
