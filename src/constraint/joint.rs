use glam::Vec3;

use crate::{
    collision::broadphase::BodyPair,
    core::rigidbody::RigidBody,
    dynamics::solver::NcpRow,
    utils::{
        allocator::{Arena, EntityId},
        math::Pair,
    },
};

/// Position-error gain of the joint rows, per second.
const BIAS_FACTOR: f32 = 0.2;
/// Clamp on the joint correction velocity.
const MAX_BIAS_VELOCITY: f32 = 2.0;

/// Joint constraints. A body pair holds either a joint or a contact
/// constraint, never both.
#[derive(Debug, Clone)]
pub enum Joint {
    /// Keeps one anchor point of each body coincident while leaving all
    /// rotation free.
    BallSocket {
        first: EntityId,
        second: EntityId,
        local_anchor_first: Vec3,
        local_anchor_second: Vec3,
    },
}

impl Joint {
    /// Ball-in-socket joint through a world-space anchor point.
    pub fn ball_socket(
        first: &RigidBody,
        second: &RigidBody,
        world_anchor: Vec3,
    ) -> Self {
        Joint::BallSocket {
            first: first.id,
            second: second.id,
            local_anchor_first: first.transform.to_local(world_anchor),
            local_anchor_second: second.transform.to_local(world_anchor),
        }
    }

    pub fn bodies(&self) -> BodyPair {
        match self {
            Joint::BallSocket { first, second, .. } => Pair::new(*first, *second),
        }
    }

    /// Emits this joint's equality rows for the current step.
    pub fn apply_constraints(
        &self,
        bodies: &Arena<RigidBody>,
        dt: f32,
        rows: &mut Vec<NcpRow>,
    ) {
        match self {
            Joint::BallSocket {
                first,
                second,
                local_anchor_first,
                local_anchor_second,
            } => {
                let (Some(body1), Some(body2)) = (bodies.get(*first), bodies.get(*second))
                else {
                    return;
                };

                let anchor1 = body1.transform.to_world(*local_anchor_first);
                let anchor2 = body2.transform.to_world(*local_anchor_second);
                let error = anchor1 - anchor2;
                let r1 = anchor1 - body1.transform.position;
                let r2 = anchor2 - body2.transform.position;

                for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                    let j1 = axis;
                    let j2 = r1.cross(axis);
                    let j3 = -axis;
                    let j4 = -(r2.cross(axis));
                    let b1 = j1 * body1.inverse_mass;
                    let b2 = body1.inverse_inertia * j2;
                    let b3 = j3 * body2.inverse_mass;
                    let b4 = body2.inverse_inertia * j4;

                    let u = j1.dot(body1.velocity.linear)
                        + j2.dot(body1.velocity.angular)
                        + j3.dot(body2.velocity.linear)
                        + j4.dot(body2.velocity.angular);
                    let bias = (error.dot(axis) * BIAS_FACTOR / dt)
                        .clamp(-MAX_BIAS_VELOCITY, MAX_BIAS_VELOCITY);

                    rows.push(NcpRow {
                        first: *first,
                        second: *second,
                        j1,
                        j2,
                        j3,
                        j4,
                        b1,
                        b2,
                        b3,
                        b4,
                        lower: f32::NEG_INFINITY,
                        upper: f32::INFINITY,
                        // drive the anchor drift back to zero
                        rhs: u + bias,
                        diagonal: j1.dot(b1) + j2.dot(b2) + j3.dot(b3) + j4.dot(b4),
                        mu: 0.0,
                        coupling: None,
                        lambda: 0.0,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_socket_rows_oppose_anchor_drift() {
        let mut bodies = Arena::new();
        let a = bodies.insert(RigidBody::default());
        let b = bodies.insert({
            let mut body = RigidBody::default();
            body.transform.position = Vec3::new(2.0, 0.0, 0.0);
            body
        });
        bodies.get_mut(a).unwrap().id = a;
        bodies.get_mut(b).unwrap().id = b;

        let joint = Joint::ball_socket(
            bodies.get(a).unwrap(),
            bodies.get(b).unwrap(),
            Vec3::new(1.0, 0.0, 0.0),
        );

        // drift the second body and rebuild: the x row must push back
        bodies.get_mut(b).unwrap().transform.position.x += 0.5;
        let mut rows = Vec::new();
        joint.apply_constraints(&bodies, 1.0 / 60.0, &mut rows);
        assert_eq!(rows.len(), 3);
        // anchor1 - anchor2 is negative along x, so the row's rhs carries a
        // negative correction target
        assert!(rows[0].rhs < 0.0);
    }
}
