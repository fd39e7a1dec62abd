use glam::Vec3;

const EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy)]
pub struct Plane {
    normal: Vec3,
    distance: f32,
}

impl Plane {
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalize_or_zero();
        Self {
            normal: n,
            distance: n.dot(point),
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// Clips a polygon against a set of planes (Sutherland-Hodgman). Points on
/// the negative side of every plane survive.
pub fn clip_polygon(vertices: &[Vec3], planes: &[Plane]) -> Vec<Vec3> {
    let mut output = vertices.to_vec();
    for plane in planes {
        output = clip_against_plane(&output, *plane);
        if output.is_empty() {
            break;
        }
    }
    output
}

fn clip_against_plane(vertices: &[Vec3], plane: Plane) -> Vec<Vec3> {
    if vertices.is_empty() {
        return Vec::new();
    }

    let mut clipped = Vec::new();
    for i in 0..vertices.len() {
        let current = vertices[i];
        let next = vertices[(i + 1) % vertices.len()];

        let current_dist = plane.signed_distance(current);
        let next_dist = plane.signed_distance(next);

        let current_inside = current_dist <= EPSILON;
        let next_inside = next_dist <= EPSILON;

        if current_inside && next_inside {
            clipped.push(next);
        } else if current_inside && !next_inside {
            if let Some(point) = edge_plane_intersection(current, next, current_dist, next_dist) {
                clipped.push(point);
            }
        } else if !current_inside && next_inside {
            if let Some(point) = edge_plane_intersection(current, next, current_dist, next_dist) {
                clipped.push(point);
            }
            clipped.push(next);
        }
    }

    clipped
}

fn edge_plane_intersection(
    start: Vec3,
    end: Vec3,
    start_dist: f32,
    end_dist: f32,
) -> Option<Vec3> {
    let denom = start_dist - end_dist;
    if denom.abs() <= EPSILON {
        return None;
    }
    let t = start_dist / denom;
    Some(start + (end - start) * t)
}

/// The four side planes bounding a rectangular face, facing outward.
pub fn rectangle_planes(
    center: Vec3,
    tangent_u: Vec3,
    tangent_v: Vec3,
    half_u: f32,
    half_v: f32,
) -> [Plane; 4] {
    [
        Plane::from_point_normal(center + tangent_u * half_u, tangent_u),
        Plane::from_point_normal(center - tangent_u * half_u, -tangent_u),
        Plane::from_point_normal(center + tangent_v * half_v, tangent_v),
        Plane::from_point_normal(center - tangent_v * half_v, -tangent_v),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipping_a_contained_quad_is_identity() {
        let quad = [
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(-0.5, 0.0, 0.5),
        ];
        let planes = rectangle_planes(Vec3::ZERO, Vec3::X, Vec3::Z, 1.0, 1.0);
        let clipped = clip_polygon(&quad, &planes);
        assert_eq!(clipped.len(), 4);
    }

    #[test]
    fn clipping_cuts_overhanging_vertices() {
        let quad = [
            Vec3::new(-2.0, 0.0, -0.5),
            Vec3::new(2.0, 0.0, -0.5),
            Vec3::new(2.0, 0.0, 0.5),
            Vec3::new(-2.0, 0.0, 0.5),
        ];
        let planes = rectangle_planes(Vec3::ZERO, Vec3::X, Vec3::Z, 1.0, 1.0);
        let clipped = clip_polygon(&quad, &planes);
        assert!(!clipped.is_empty());
        for point in clipped {
            assert!(point.x.abs() <= 1.0 + 1e-3);
        }
    }
}
