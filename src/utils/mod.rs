//! Utility helpers: generational allocation, logging, and small math pieces.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, EntityId, GenerationalId};
pub use math::{tangent_basis, Pair};
