//! Collision detection: sweep-and-prune broadphase, narrow-phase contact
//! math, and the contact generator chain.

pub mod broadphase;
pub mod clipping;
pub mod contact;
pub mod narrowphase;

pub use broadphase::{
    BodyPair, BroadphaseError, BroadphaseHandler, GeometryPair, SweepAndPrune, SweepEvents,
};
pub use contact::{
    default_classifier_chain, ContactGenerator, ContactGeneratorClassifier, ContactPoint,
};
