//! Global configuration constants and the per-step solver configuration.

use serde::{Deserialize, Serialize};

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Maximum number of geometries the sweep-and-prune broadphase will accept.
pub const DEFAULT_BROADPHASE_CAPACITY: usize = 2500;

/// Contact envelope: geometries within this distance of each other are
/// treated as touching and produce contact points.
pub const DEFAULT_CONTACT_ENVELOPE: f32 = 0.125;

/// Tunable magnitudes of the contact model and the iterative solver.
///
/// Hoisted into an explicit value passed through each step so independent
/// worlds (and tests) can run with different settings side by side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Upper bound on Gauss-Seidel sweeps per step.
    pub sweeps: u32,
    /// Early-out threshold on the summed squared impulse change of a sweep.
    pub termination_tolerance: f32,
    /// Fraction of the computed penetration-correction velocity actually
    /// applied. Below 1 so correction cannot inject energy.
    pub normal_stabilisation: f32,
    /// Gain on the anchor-drift velocity used while a friction row sticks.
    pub friction_stabilisation: f32,
    /// Clamp on the penetration-correction velocity.
    pub max_correction_velocity: f32,
    /// A friction row starts sticking once its impulse drops below
    /// `normal impulse * friction * kickin_factor`.
    pub kickin_factor: f32,
    /// A sticking row releases once the friction bound is within this margin
    /// of being saturated.
    pub release_limit: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            sweeps: 35,
            termination_tolerance: 1e-7,
            normal_stabilisation: 0.9,
            friction_stabilisation: 1.0,
            max_correction_velocity: 0.5,
            kickin_factor: 0.6,
            release_limit: 1e-5,
        }
    }
}
