//! Core types describing bodies, geometries, and shared data.

pub mod geometry;
pub mod rigidbody;
pub mod types;

pub use geometry::{Aabb, Geometry, Shape};
pub use rigidbody::RigidBody;
pub use types::{InertiaTensorExt, MassProperties, Material, Transform, Velocity};
