//! Stiction – an incremental contact-resolution core for rigid body
//! dynamics.
//!
//! Per fixed-size step the engine detects which convex geometries overlap
//! (coherence-exploiting sweep-and-prune), mirrors those overlaps in a
//! connected-component graph of contact and joint constraints, and solves
//! the resulting bounded complementarity problem into non-penetrating,
//! frictional impulses with a persistent stick/slip friction state.

pub mod collision;
pub mod config;
pub mod constraint;
pub mod core;
pub mod dynamics;
pub mod trigger;
pub mod utils;
pub mod world;

pub use glam::{Mat3, Quat, Vec3};

pub use collision::{
    broadphase::{BodyPair, BroadphaseError, BroadphaseHandler, GeometryPair, SweepAndPrune},
    contact::{ContactGenerator, ContactGeneratorClassifier, ContactPoint},
};
pub use config::SolverConfig;
pub use constraint::{
    ComponentGraph, Constraint, ConstraintError, ContactConstraint, ContactConstraintCreator,
    ContactConstraintManager, ContactEventHandler, Joint, RowSlot,
};
pub use self::core::{
    Aabb, Geometry, InertiaTensorExt, MassProperties, Material, RigidBody, Shape, Transform,
    Velocity,
};
pub use dynamics::{
    DragForce, ForceGenerator, ForceRegistry, GravityForce, Integrator, NcpRow,
    ProjectedGaussSeidel,
};
pub use trigger::ContactTrigger;
pub use utils::{Arena, EntityId, Pair};
pub use world::{PhysicsWorld, StepError};
