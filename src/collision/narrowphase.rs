//! Contact point computation for the supported convex shape pairs.
//!
//! Every routine reports normals pointing from the second shape toward the
//! first, so a nonnegative normal impulse pushes the first body along `+n`.
//! `distance` is the signed surface gap: negative while penetrating.

use glam::{Mat3, Vec3};

use crate::{
    collision::clipping::{clip_polygon, rectangle_planes, Plane},
    core::{geometry::Geometry, types::Transform},
};

/// A raw contact produced by the narrow phase, before material data is mixed
/// in.
#[derive(Debug, Clone, Copy)]
pub struct NarrowContact {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Sphere-sphere contact, closed form.
pub fn sphere_sphere(
    center_first: Vec3,
    radius_first: f32,
    center_second: Vec3,
    radius_second: f32,
    envelope: f32,
) -> Option<NarrowContact> {
    let delta = center_first - center_second;
    let length = delta.length();
    let normal = if length > 1e-9 { delta / length } else { Vec3::X };

    let distance = length - radius_first - radius_second;
    if distance >= envelope {
        return None;
    }

    Some(NarrowContact {
        point: center_second + normal * (radius_second + distance * 0.5),
        normal,
        distance,
    })
}

/// Sphere against box; the returned normal points from the box toward the
/// sphere.
pub fn sphere_box(
    sphere_center: Vec3,
    radius: f32,
    box_transform: &Transform,
    half_extents: Vec3,
    envelope: f32,
) -> Option<NarrowContact> {
    let local = box_transform.to_local(sphere_center);
    let clamped = local.clamp(-half_extents, half_extents);

    let (surface_local, normal_local, distance) = if clamped == local {
        // center inside the box: push out along the least-buried face
        let margins = half_extents - local.abs();
        let axis = if margins.x <= margins.y && margins.x <= margins.z {
            0
        } else if margins.y <= margins.z {
            1
        } else {
            2
        };
        let mut normal = Vec3::ZERO;
        normal[axis] = 1.0f32.copysign(local[axis]);
        let mut surface = local;
        surface[axis] = half_extents[axis].copysign(local[axis]);
        (surface, normal, -(margins[axis] + radius))
    } else {
        let delta = local - clamped;
        let length = delta.length();
        (clamped, delta / length, length - radius)
    };

    if distance >= envelope {
        return None;
    }

    let normal = box_transform.rotation * normal_local;
    let surface = box_transform.to_world(surface_local);
    Some(NarrowContact {
        point: surface + normal * (distance * 0.5),
        normal,
        distance,
    })
}

/// Box-box manifold: separating-axis test over the 15 candidate axes, then a
/// reference-face clip producing up to four contact points.
pub fn box_box(
    transform_first: &Transform,
    half_first: Vec3,
    transform_second: &Transform,
    half_second: Vec3,
    envelope: f32,
) -> Vec<NarrowContact> {
    let axes_first = basis_axes(transform_first);
    let axes_second = basis_axes(transform_second);
    let relative = transform_first.position - transform_second.position;

    let mut candidates: Vec<Vec3> = Vec::with_capacity(15);
    candidates.extend_from_slice(&axes_first);
    candidates.extend_from_slice(&axes_second);
    for a in &axes_first {
        for b in &axes_second {
            let cross = a.cross(*b);
            if cross.length_squared() > 1e-6 {
                candidates.push(cross.normalize());
            }
        }
    }

    // the contact axis is the one with the largest separation (least overlap)
    let mut best_separation = f32::NEG_INFINITY;
    let mut best_axis = Vec3::Y;
    for axis in candidates {
        let extent_first = projected_extent(&axes_first, half_first, axis);
        let extent_second = projected_extent(&axes_second, half_second, axis);
        let separation = relative.dot(axis).abs() - extent_first - extent_second;
        if separation >= envelope {
            return Vec::new();
        }
        if separation > best_separation {
            best_separation = separation;
            best_axis = if relative.dot(axis) < 0.0 { -axis } else { axis };
        }
    }

    // reference face: the second box's face pointing toward the first
    let (reference_normal, ref_u, ref_v, ref_half_u, ref_half_v, ref_center) =
        face_toward(transform_second, half_second, best_axis);
    // incident face: the first box's face pointing back at the second
    let incident = face_corners(transform_first, half_first, -best_axis);

    let planes: [Plane; 4] = rectangle_planes(ref_center, ref_u, ref_v, ref_half_u, ref_half_v);
    let clipped = clip_polygon(&incident, &planes);

    let mut contacts: Vec<NarrowContact> = clipped
        .into_iter()
        .filter_map(|vertex| {
            let distance = reference_normal.dot(vertex - ref_center);
            if distance >= envelope {
                return None;
            }
            Some(NarrowContact {
                point: vertex - reference_normal * (distance * 0.5),
                normal: reference_normal,
                distance,
            })
        })
        .collect();

    if contacts.is_empty() {
        // edge-edge or degenerate clip: fall back to a single midpoint contact
        let support_first = support_box(transform_first, half_first, -best_axis);
        let support_second = support_box(transform_second, half_second, best_axis);
        return vec![NarrowContact {
            point: (support_first + support_second) * 0.5,
            normal: best_axis,
            distance: best_separation,
        }];
    }

    if contacts.len() > 4 {
        contacts.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        contacts.truncate(4);
    }
    contacts
}

/// General convex support-map pair via GJK with EPA penetration recovery.
/// Only detects actual penetration; shallowly separated hulls produce no
/// contact.
pub fn support_map_contact(
    first: &Geometry,
    transform_first: &Transform,
    second: &Geometry,
    transform_second: &Transform,
) -> Option<NarrowContact> {
    const MAX_ITERATIONS: usize = 20;
    const EPSILON: f32 = 1e-6;

    let mut simplex: Vec<Vec3> = Vec::new();
    let mut direction = transform_second.position - transform_first.position;
    if direction.length_squared() < EPSILON {
        direction = Vec3::X;
    }

    for _ in 0..MAX_ITERATIONS {
        let support = first.support(transform_first, direction)
            - second.support(transform_second, -direction);
        if support.dot(direction) < 0.0 {
            return None;
        }

        simplex.push(support);
        if evolve_simplex(&mut simplex, &mut direction) {
            let (depth, mut axis) = epa_penetration(
                &simplex,
                first,
                transform_first,
                second,
                transform_second,
            );

            // axis points from the first shape toward the second here
            let relative = transform_second.position - transform_first.position;
            if axis.dot(relative) < 0.0 {
                axis = -axis;
            }

            let point = first.support(transform_first, axis) - axis * (depth * 0.5);
            return Some(NarrowContact {
                point,
                normal: -axis,
                distance: -depth,
            });
        }
    }

    None
}

fn basis_axes(transform: &Transform) -> [Vec3; 3] {
    let rotation = Mat3::from_quat(transform.rotation);
    [rotation.col(0), rotation.col(1), rotation.col(2)]
}

fn projected_extent(axes: &[Vec3; 3], half: Vec3, direction: Vec3) -> f32 {
    axes[0].dot(direction).abs() * half.x
        + axes[1].dot(direction).abs() * half.y
        + axes[2].dot(direction).abs() * half.z
}

fn support_box(transform: &Transform, half: Vec3, direction: Vec3) -> Vec3 {
    let local = transform.rotation.conjugate() * direction;
    transform.to_world(Vec3::new(
        half.x.copysign(local.x),
        half.y.copysign(local.y),
        half.z.copysign(local.z),
    ))
}

/// The face of a box whose outward normal is closest to `direction`:
/// returns (outward normal, in-face tangents, tangent half extents, center).
fn face_toward(
    transform: &Transform,
    half: Vec3,
    direction: Vec3,
) -> (Vec3, Vec3, Vec3, f32, f32, Vec3) {
    let axes = basis_axes(transform);
    let mut best = 0;
    let mut best_dot = f32::NEG_INFINITY;
    for (index, axis) in axes.iter().enumerate() {
        let dot = axis.dot(direction).abs();
        if dot > best_dot {
            best_dot = dot;
            best = index;
        }
    }
    let sign = 1.0f32.copysign(axes[best].dot(direction));
    let normal = axes[best] * sign;
    let u = (best + 1) % 3;
    let v = (best + 2) % 3;
    let center = transform.position + normal * half[best];
    (normal, axes[u], axes[v], half[u], half[v], center)
}

/// The four corners of the face whose outward normal is closest to
/// `direction`, in winding order.
fn face_corners(transform: &Transform, half: Vec3, direction: Vec3) -> Vec<Vec3> {
    let (_normal, u, v, half_u, half_v, center) = face_toward(transform, half, direction);
    vec![
        center + u * half_u + v * half_v,
        center - u * half_u + v * half_v,
        center - u * half_u - v * half_v,
        center + u * half_u - v * half_v,
    ]
}

fn evolve_simplex(simplex: &mut Vec<Vec3>, direction: &mut Vec3) -> bool {
    const EPSILON: f32 = 1e-6;
    match simplex.len() {
        1 => {
            *direction = -simplex[0];
            false
        }
        2 => {
            let a = simplex[1];
            let b = simplex[0];
            let ab = b - a;
            let ao = -a;
            let perp = ab.cross(ao).cross(ab);
            if perp.length_squared() < EPSILON {
                let seed = if ab.x.abs() < 0.1 { Vec3::X } else { Vec3::Y };
                *direction = ab.cross(seed);
            } else {
                *direction = perp;
            }
            false
        }
        3 => {
            let a = simplex[2];
            let b = simplex[1];
            let c = simplex[0];
            let ab = b - a;
            let ac = c - a;
            let ao = -a;
            let abc = ab.cross(ac);

            if abc.cross(ac).dot(ao) > 0.0 {
                simplex.remove(1);
                *direction = ac.cross(ao).cross(ac);
            } else if ab.cross(abc).dot(ao) > 0.0 {
                simplex.remove(0);
                *direction = ab.cross(ao).cross(ab);
            } else if abc.length_squared() < EPSILON {
                *direction = Vec3::Y;
            } else if abc.dot(ao) > 0.0 {
                *direction = abc;
            } else {
                *direction = -abc;
            }
            false
        }
        4 => {
            let a = simplex[3];
            let b = simplex[2];
            let c = simplex[1];
            let d = simplex[0];
            let ab = b - a;
            let ac = c - a;
            let ad = d - a;
            let ao = -a;
            let abc = ab.cross(ac);
            let acd = ac.cross(ad);
            let adb = ad.cross(ab);

            if abc.dot(ao) > 0.0 {
                simplex.remove(0);
                *direction = abc;
                false
            } else if acd.dot(ao) > 0.0 {
                simplex.remove(2);
                *direction = acd;
                false
            } else if adb.dot(ao) > 0.0 {
                simplex.remove(1);
                *direction = adb;
                false
            } else {
                true
            }
        }
        _ => false,
    }
}

fn epa_penetration(
    simplex: &[Vec3],
    first: &Geometry,
    transform_first: &Transform,
    second: &Geometry,
    transform_second: &Transform,
) -> (f32, Vec3) {
    const MAX_ITERATIONS: usize = 32;
    const EPSILON: f32 = 1e-6;

    let fallback = || {
        let axis =
            (transform_second.position - transform_first.position).normalize_or_zero();
        if axis == Vec3::ZERO {
            Vec3::X
        } else {
            axis
        }
    };

    if simplex.len() < 4 {
        let depth = simplex
            .iter()
            .map(|p| p.length())
            .fold(f32::INFINITY, f32::min)
            .min(0.01);
        return (depth.max(EPSILON), fallback());
    }

    let mut polytope = simplex.to_vec();
    let mut faces = initial_faces(&polytope);

    for _ in 0..MAX_ITERATIONS {
        let (min_dist, normal) = closest_face(&polytope, &faces);
        if min_dist >= f32::MAX * 0.5 {
            return (0.01, fallback());
        }
        if min_dist < EPSILON {
            return (EPSILON, normal);
        }

        let support = first.support(transform_first, normal)
            - second.support(transform_second, -normal);
        let distance = support.dot(normal);
        if distance - min_dist < EPSILON {
            return (min_dist, normal);
        }
        expand_polytope(&mut polytope, &mut faces, support);
    }

    let (min_dist, normal) = closest_face(&polytope, &faces);
    if min_dist >= f32::MAX * 0.5 {
        (0.01, fallback())
    } else {
        (min_dist, normal)
    }
}

fn initial_faces(polytope: &[Vec3]) -> Vec<(usize, usize, usize)> {
    let mut faces = vec![(0, 1, 2), (0, 2, 3), (0, 3, 1), (1, 3, 2)];
    for face in &mut faces {
        let ab = polytope[face.1] - polytope[face.0];
        let ac = polytope[face.2] - polytope[face.0];
        let normal = ab.cross(ac);
        if polytope[face.0].dot(normal) < 0.0 {
            std::mem::swap(&mut face.1, &mut face.2);
        }
    }
    faces
}

fn closest_face(polytope: &[Vec3], faces: &[(usize, usize, usize)]) -> (f32, Vec3) {
    let mut min_dist = f32::MAX;
    let mut min_normal = Vec3::ZERO;
    for &(a, b, c) in faces {
        let ab = polytope[b] - polytope[a];
        let ac = polytope[c] - polytope[a];
        let normal = ab.cross(ac).normalize_or_zero();
        if normal == Vec3::ZERO {
            continue;
        }
        let dist = polytope[a].dot(normal);
        if dist < min_dist {
            min_dist = dist;
            min_normal = normal;
        }
    }
    (min_dist, min_normal)
}

fn expand_polytope(
    polytope: &mut Vec<Vec3>,
    faces: &mut Vec<(usize, usize, usize)>,
    support: Vec3,
) {
    let new_index = polytope.len();
    polytope.push(support);

    let mut edges = Vec::new();
    let mut i = 0;
    while i < faces.len() {
        let (a, b, c) = faces[i];
        let ab = polytope[b] - polytope[a];
        let ac = polytope[c] - polytope[a];
        let normal = ab.cross(ac).normalize_or_zero();
        if normal.dot(support - polytope[a]) > 0.0 {
            edges.push((a, b));
            edges.push((b, c));
            edges.push((c, a));
            faces.swap_remove(i);
        } else {
            i += 1;
        }
    }

    let mut boundary: Vec<(usize, usize)> = Vec::new();
    for (u, v) in edges {
        if let Some(position) = boundary.iter().position(|&edge| edge == (v, u)) {
            boundary.remove(position);
        } else {
            boundary.push((u, v));
        }
    }

    for (u, v) in boundary {
        faces.push((u, v, new_index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn overlapping_spheres_report_depth_and_axis() {
        let contact = sphere_sphere(Vec3::new(1.5, 0.0, 0.0), 1.0, Vec3::ZERO, 1.0, 0.125)
            .expect("spheres overlap");
        assert_relative_eq!(contact.distance, -0.5, epsilon = 1e-5);
        assert_relative_eq!(contact.normal.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn separated_spheres_outside_envelope_report_nothing() {
        assert!(sphere_sphere(Vec3::new(3.0, 0.0, 0.0), 1.0, Vec3::ZERO, 1.0, 0.125).is_none());
    }

    #[test]
    fn sphere_resting_on_box_points_up() {
        let contact = sphere_box(
            Vec3::new(0.0, 1.45, 0.0),
            0.5,
            &Transform::default(),
            Vec3::new(5.0, 1.0, 5.0),
            0.125,
        )
        .expect("sphere touches box");
        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-5);
        assert!(contact.distance < 0.0);
    }

    #[test]
    fn stacked_boxes_produce_a_four_point_manifold() {
        let floor = Transform::default();
        let unit = Transform::from_position(Vec3::new(0.0, 1.45, 0.0));
        let contacts = box_box(
            &unit,
            Vec3::splat(0.5),
            &floor,
            Vec3::new(5.0, 1.0, 5.0),
            0.125,
        );
        assert_eq!(contacts.len(), 4);
        for contact in &contacts {
            assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-4);
            assert!(contact.distance < 0.0);
        }
    }

    #[test]
    fn distant_boxes_produce_no_manifold() {
        let a = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        let b = Transform::default();
        assert!(box_box(&a, Vec3::splat(0.5), &b, Vec3::splat(0.5), 0.125).is_empty());
    }

    #[test]
    fn penetrating_hulls_are_detected_by_the_support_map_pair() {
        let tetra = |offset: Vec3| {
            vec![
                offset + Vec3::new(0.0, 1.0, 0.0),
                offset + Vec3::new(1.0, -1.0, 1.0),
                offset + Vec3::new(-1.0, -1.0, 1.0),
                offset + Vec3::new(0.0, -1.0, -1.0),
            ]
        };
        let first = Geometry::convex_hull(tetra(Vec3::ZERO));
        let second = Geometry::convex_hull(tetra(Vec3::ZERO));
        let ta = Transform::from_position(Vec3::new(0.4, 0.0, 0.0));
        let tb = Transform::default();
        let contact =
            support_map_contact(&first, &ta, &second, &tb).expect("hulls interpenetrate");
        assert!(contact.distance < 0.0);
    }
}
