use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use super::types::{Material, Transform};
use crate::config::DEFAULT_CONTACT_ENVELOPE;
use crate::utils::allocator::EntityId;

/// Convex shapes supported by the default contact generator chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    ConvexHull { vertices: Vec<Vec3> },
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.overlaps_on_axis(other, axis))
    }

    pub fn overlaps_on_axis(&self, other: &Aabb, axis: usize) -> bool {
        self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis]
    }
}

/// A convex shape owned by exactly one rigid body.
///
/// The back-reference to the owning body is a non-owning id; a null id marks
/// a free-floating geometry which never takes part in contact resolution.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub id: EntityId,
    pub body: EntityId,
    pub shape: Shape,
    /// Placement relative to the owning body frame.
    pub offset: Transform,
    pub material: Material,
    pub envelope: f32,
}

impl Geometry {
    pub fn new(shape: Shape) -> Self {
        Self {
            id: EntityId::default(),
            body: EntityId::default(),
            shape,
            offset: Transform::default(),
            material: Material::default(),
            envelope: DEFAULT_CONTACT_ENVELOPE,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(Shape::Sphere { radius })
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::new(Shape::Box { half_extents })
    }

    pub fn convex_hull(vertices: Vec<Vec3>) -> Self {
        Self::new(Shape::ConvexHull { vertices })
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_offset(mut self, offset: Transform) -> Self {
        self.offset = offset;
        self
    }

    pub fn world_transform(&self, body_transform: &Transform) -> Transform {
        body_transform.combine(&self.offset)
    }

    /// World-space bounds, grown by the contact envelope so the broadphase
    /// reports pairs slightly before their surfaces touch.
    pub fn world_bounds(&self, body_transform: &Transform) -> Aabb {
        let transform = self.world_transform(body_transform);
        let margin = Vec3::splat(self.envelope);

        let (min, max) = match &self.shape {
            Shape::Sphere { radius } => {
                let r = Vec3::splat(*radius);
                (transform.position - r, transform.position + r)
            }
            Shape::Box { half_extents } => {
                // world extent per axis is the absolute rotation matrix
                // applied to the half extents
                let rotation = Mat3::from_quat(transform.rotation);
                let extent = Vec3::new(
                    rotation.row(0).abs().dot(*half_extents),
                    rotation.row(1).abs().dot(*half_extents),
                    rotation.row(2).abs().dot(*half_extents),
                );
                (transform.position - extent, transform.position + extent)
            }
            Shape::ConvexHull { vertices } => {
                let mut min = Vec3::splat(f32::INFINITY);
                let mut max = Vec3::splat(f32::NEG_INFINITY);
                for vertex in vertices {
                    let world = transform.to_world(*vertex);
                    min = min.min(world);
                    max = max.max(world);
                }
                if vertices.is_empty() {
                    (transform.position, transform.position)
                } else {
                    (min, max)
                }
            }
        };

        Aabb {
            min: min - margin,
            max: max + margin,
        }
    }

    /// Support mapping: the point of the shape farthest along `direction`
    /// (world space), given the shape's world transform.
    pub fn support(&self, transform: &Transform, direction: Vec3) -> Vec3 {
        match &self.shape {
            Shape::Sphere { radius } => {
                transform.position + direction.normalize_or_zero() * *radius
            }
            Shape::Box { half_extents } => {
                let dir_local = transform.rotation.conjugate() * direction;
                let local = Vec3::new(
                    half_extents.x.copysign(dir_local.x),
                    half_extents.y.copysign(dir_local.y),
                    half_extents.z.copysign(dir_local.z),
                );
                transform.to_world(local)
            }
            Shape::ConvexHull { vertices } => {
                let mut best_point = transform.position;
                let mut best_dot = f32::MIN;
                for vertex in vertices {
                    let world = transform.to_world(*vertex);
                    let dot = world.dot(direction);
                    if dot > best_dot {
                        best_dot = dot;
                        best_point = world;
                    }
                }
                best_point
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Quat;

    #[test]
    fn sphere_bounds_include_envelope_margin() {
        let geometry = Geometry::sphere(1.0);
        let bounds = geometry.world_bounds(&Transform::default());
        assert_relative_eq!(bounds.max.x, 1.0 + geometry.envelope);
        assert_relative_eq!(bounds.min.y, -1.0 - geometry.envelope);
    }

    #[test]
    fn rotated_box_bounds_cover_the_diagonal() {
        let geometry = Geometry::cuboid(Vec3::splat(1.0));
        let transform = Transform::from_position_rotation(
            Vec3::ZERO,
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
        );
        let bounds = geometry.world_bounds(&transform);
        // a 45 degree rotation stretches the x extent to sqrt(2)
        assert!(bounds.max.x > 1.3);
    }

    #[test]
    fn box_support_picks_the_right_corner() {
        let geometry = Geometry::cuboid(Vec3::new(1.0, 2.0, 3.0));
        let support = geometry.support(&Transform::default(), Vec3::new(1.0, -1.0, 1.0));
        assert_relative_eq!(support.x, 1.0);
        assert_relative_eq!(support.y, -2.0);
        assert_relative_eq!(support.z, 3.0);
    }
}
