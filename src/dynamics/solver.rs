use glam::Vec3;
use log::trace;

use crate::{
    core::rigidbody::RigidBody,
    utils::allocator::{Arena, EntityId},
};

/// One scalar complementarity row.
///
/// `j1..j4` are the Jacobian blocks (linear/angular for each body),
/// `b1..b4` the same blocks scaled by inverse mass/inertia (zero for fixed
/// bodies). A row with `coupling` set is a friction row whose bounds are
/// re-derived each sweep from the referenced normal row's impulse and `mu`.
#[derive(Debug, Clone)]
pub struct NcpRow {
    pub first: EntityId,
    pub second: EntityId,
    pub j1: Vec3,
    pub j2: Vec3,
    pub j3: Vec3,
    pub j4: Vec3,
    pub b1: Vec3,
    pub b2: Vec3,
    pub b3: Vec3,
    pub b4: Vec3,
    pub lower: f32,
    pub upper: f32,
    pub rhs: f32,
    pub diagonal: f32,
    pub mu: f32,
    /// Index of the coupled normal row within the same row list.
    pub coupling: Option<usize>,
    pub lambda: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolveSummary {
    pub sweeps: u32,
    pub residual: f32,
}

/// Iterative complementarity solver: Gauss-Seidel relaxation with impulse
/// projection.
///
/// Rows are visited in order, each seeing every body's most recently updated
/// delta-velocity. Rows clamped at a bound may keep residual velocity error
/// (complementarity); interior rows converge toward zero residual. The sweep
/// budget bounds the work; stopping early on negligible change or running
/// out of sweeps both yield an acceptable approximate solution.
#[derive(Debug, Clone)]
pub struct ProjectedGaussSeidel {
    pub sweeps: u32,
    pub tolerance: f32,
}

impl Default for ProjectedGaussSeidel {
    fn default() -> Self {
        Self {
            sweeps: 35,
            tolerance: 1e-7,
        }
    }
}

impl ProjectedGaussSeidel {
    pub fn new(sweeps: u32, tolerance: f32) -> Self {
        Self { sweeps, tolerance }
    }

    pub fn solve(&self, rows: &mut [NcpRow], bodies: &mut Arena<RigidBody>) -> SolveSummary {
        // friction bounds grow from the normal impulses, which start at zero
        for row in rows.iter_mut() {
            if row.coupling.is_some() {
                row.lower = 0.0;
                row.upper = 0.0;
            }
        }

        let mut summary = SolveSummary::default();
        for _ in 0..self.sweeps {
            summary.sweeps += 1;

            // re-derive the Coulomb box from the live normal impulses
            for i in 0..rows.len() {
                if let Some(normal) = rows[i].coupling {
                    let bound = rows[normal].lambda.abs() * rows[i].mu;
                    rows[i].lower = -bound;
                    rows[i].upper = bound;
                }
            }

            let mut residual = 0.0;
            for row in rows.iter_mut() {
                if row.diagonal <= f32::EPSILON {
                    continue;
                }
                let Some((body1, body2)) = bodies.get2_mut(row.first, row.second) else {
                    continue;
                };

                let w = row.j1.dot(body1.delta_velocity)
                    + row.j2.dot(body1.delta_omega)
                    + row.j3.dot(body2.delta_velocity)
                    + row.j4.dot(body2.delta_omega);

                let proposed = row.lambda + (-row.rhs - w) / row.diagonal;
                let clamped = proposed.clamp(row.lower, row.upper);
                let applied = clamped - row.lambda;
                row.lambda = clamped;

                body1.delta_velocity += row.b1 * applied;
                body1.delta_omega += row.b2 * applied;
                body2.delta_velocity += row.b3 * applied;
                body2.delta_omega += row.b4 * applied;

                residual += applied * applied;
            }

            summary.residual = residual;
            if residual < self.tolerance {
                break;
            }
        }

        trace!(
            "solver: {} rows, {} sweeps, residual {:.3e}",
            rows.len(),
            summary.sweeps,
            summary.residual
        );
        summary
    }
}
