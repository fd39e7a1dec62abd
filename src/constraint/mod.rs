//! Constraint bookkeeping: the component graph over bodies, the contact
//! constraint aggregate, joints, and the manager bridging broadphase events
//! to graph edges.

pub mod contact_constraint;
pub mod graph;
pub mod joint;
pub mod manager;

pub use contact_constraint::{ContactConstraint, RowSlot};
pub use graph::{ComponentGraph, ComponentId};
pub use joint::Joint;
pub use manager::{
    ConstraintError, ContactConstraintCreator, ContactConstraintManager, ContactEventHandler,
};

/// Payload stored in a constraint-graph edge. One constraint per body pair:
/// a pair holds either a contact constraint or a joint, never both.
pub enum Constraint {
    Contact(ContactConstraint),
    Joint(Joint),
}

impl Constraint {
    pub fn as_contact(&self) -> Option<&ContactConstraint> {
        match self {
            Constraint::Contact(constraint) => Some(constraint),
            Constraint::Joint(_) => None,
        }
    }

    pub fn as_contact_mut(&mut self) -> Option<&mut ContactConstraint> {
        match self {
            Constraint::Contact(constraint) => Some(constraint),
            Constraint::Joint(_) => None,
        }
    }
}
