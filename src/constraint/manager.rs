use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::{
    collision::{
        broadphase::{BodyPair, GeometryPair},
        contact::{default_classifier_chain, ContactGenerator, ContactGeneratorClassifier},
    },
    constraint::{contact_constraint::ContactConstraint, graph::ComponentGraph, Constraint},
    core::{geometry::Geometry, rigidbody::RigidBody},
    utils::{allocator::Arena, math::Pair},
};

#[derive(Debug, Error, PartialEq)]
pub enum ConstraintError {
    /// A separation arrived for a geometry pair that has a live contact
    /// constraint but no recorded generator. The bookkeeping is corrupt and
    /// must be surfaced, never ignored.
    #[error("no contact generator recorded for separating geometry pair {0:?}")]
    MissingGenerator(GeometryPair),
    #[error("no classifier in the chain accepts geometry pair {0:?}")]
    UnclassifiedPair(GeometryPair),
    #[error("body pair {0:?} already holds a constraint")]
    PairOccupied(BodyPair),
}

/// Pluggable strategy producing a specialized contact constraint for a body
/// pair. The first creator returning `Some` wins; the manager attaches the
/// generator afterwards. Returning `None` passes to the next creator, with a
/// default frictional constraint as the final fallback.
pub trait ContactConstraintCreator {
    fn create(&self, first: &RigidBody, second: &RigidBody) -> Option<ContactConstraint>;
}

/// Subscriber notified when contact constraints appear and disappear, in
/// registration order.
pub trait ContactEventHandler {
    fn contact_constraint_created(&mut self, pair: BodyPair, constraint: &ContactConstraint);
    fn contact_constraint_removed(&mut self, pair: BodyPair, constraint: &ContactConstraint);
}

/// Bridges broadphase overlap events to constraint-graph edges.
///
/// On overlap it resolves the owning bodies, attaches a generator to the
/// existing constraint for the pair or creates a new one; on separation it
/// detaches the matching generator and removes the constraint once its last
/// generator is gone. The graph edge is the single source of truth for
/// which constraint occupies a body pair.
pub struct ContactConstraintManager {
    classifiers: Vec<Box<dyn ContactGeneratorClassifier>>,
    creators: Vec<Box<dyn ContactConstraintCreator>>,
    handlers: Vec<Box<dyn ContactEventHandler>>,
    generators: HashMap<GeometryPair, u64>,
    next_generator_id: u64,
}

impl Default for ContactConstraintManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactConstraintManager {
    /// A manager with the default classifier chain installed.
    pub fn new() -> Self {
        Self {
            classifiers: default_classifier_chain(),
            creators: Vec::new(),
            handlers: Vec::new(),
            generators: HashMap::new(),
            next_generator_id: 0,
        }
    }

    /// Prepends a classifier so it is consulted before the default chain.
    pub fn add_classifier(&mut self, classifier: Box<dyn ContactGeneratorClassifier>) {
        self.classifiers.insert(0, classifier);
    }

    pub fn add_creator(&mut self, creator: Box<dyn ContactConstraintCreator>) {
        self.creators.push(creator);
    }

    pub fn add_handler(&mut self, handler: Box<dyn ContactEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn generator_id(&self, pair: &GeometryPair) -> Option<u64> {
        self.generators.get(pair).copied()
    }

    /// Handles a broadphase overlap event.
    pub fn overlap(
        &mut self,
        pair: GeometryPair,
        geometries: &Arena<Geometry>,
        bodies: &Arena<RigidBody>,
        graph: &mut ComponentGraph<Constraint>,
    ) -> Result<(), ConstraintError> {
        let (Some(first_geom), Some(second_geom)) =
            (geometries.get(pair.first), geometries.get(pair.second))
        else {
            return Ok(());
        };
        // overlaps within one body, or involving free-floating geometries,
        // or between two immovable bodies produce no constraint
        if first_geom.body == second_geom.body {
            return Ok(());
        }
        let (Some(first_body), Some(second_body)) =
            (bodies.get(first_geom.body), bodies.get(second_geom.body))
        else {
            return Ok(());
        };
        if first_body.fixed && second_body.fixed {
            return Ok(());
        }

        let body_pair = Pair::new(first_body.id, second_body.id);

        if graph.contains_edge(&body_pair) {
            match graph.edge_mut(&body_pair) {
                Some(Constraint::Contact(constraint)) => {
                    // order the geometry pair to match the constraint's
                    // established body order, so normals from every
                    // generator of this pair point the same way
                    let (ordered, ordered_first, ordered_second) =
                        if constraint.first_body() == first_body.id {
                            (pair, first_geom, second_geom)
                        } else {
                            (pair.swapped(), second_geom, first_geom)
                        };
                    let generator = self.classify(ordered_first, ordered_second)?;
                    let id = self.fresh_generator_id();
                    self.generators.insert(ordered, id);
                    constraint.add_generator(id, generator);
                }
                _ => {
                    // the pair is occupied by a joint; contacts and joints
                    // are mutually exclusive per pair
                    warn!(
                        "skipping contact for {:?}-{:?}: pair holds another constraint",
                        body_pair.first, body_pair.second
                    );
                }
            }
            return Ok(());
        }

        let generator = self.classify(first_geom, second_geom)?;
        let mut constraint = self
            .creators
            .iter()
            .find_map(|creator| creator.create(first_body, second_body))
            .unwrap_or_else(|| ContactConstraint::new(first_body.id, second_body.id));

        let id = self.fresh_generator_id();
        self.generators.insert(pair, id);
        constraint.add_generator(id, generator);

        graph.add_edge(
            body_pair,
            first_body.fixed,
            second_body.fixed,
            Constraint::Contact(constraint),
        );
        debug!(
            "contact constraint created for {:?}-{:?}",
            body_pair.first, body_pair.second
        );

        if let Some(Constraint::Contact(constraint)) = graph.edge(&body_pair) {
            for handler in &mut self.handlers {
                handler.contact_constraint_created(body_pair, constraint);
            }
        }
        Ok(())
    }

    /// Handles a broadphase separation event.
    pub fn separation(
        &mut self,
        pair: GeometryPair,
        geometries: &Arena<Geometry>,
        bodies: &Arena<RigidBody>,
        graph: &mut ComponentGraph<Constraint>,
    ) -> Result<(), ConstraintError> {
        let (Some(first_geom), Some(second_geom)) =
            (geometries.get(pair.first), geometries.get(pair.second))
        else {
            return Ok(());
        };
        if first_geom.body == second_geom.body {
            return Ok(());
        }
        let (Some(first_body), Some(second_body)) =
            (bodies.get(first_geom.body), bodies.get(second_geom.body))
        else {
            return Ok(());
        };
        if first_body.fixed && second_body.fixed {
            return Ok(());
        }

        let body_pair = Pair::new(first_body.id, second_body.id);

        match graph.edge_mut(&body_pair) {
            Some(Constraint::Contact(constraint)) => {
                let Some(id) = self.generators.remove(&pair) else {
                    return Err(ConstraintError::MissingGenerator(pair));
                };
                constraint.remove_generator(id);

                if constraint.generator_count() == 0 {
                    let Some(Constraint::Contact(removed)) = graph.remove_edge(&body_pair)
                    else {
                        return Ok(());
                    };
                    debug!(
                        "contact constraint removed for {:?}-{:?}",
                        body_pair.first, body_pair.second
                    );
                    for handler in &mut self.handlers {
                        handler.contact_constraint_removed(body_pair, &removed);
                    }
                }
                Ok(())
            }
            // tolerated: the bodies may be linked by a joint, or by nothing
            _ => Ok(()),
        }
    }

    fn classify(
        &self,
        first: &Geometry,
        second: &Geometry,
    ) -> Result<Box<dyn ContactGenerator>, ConstraintError> {
        for classifier in &self.classifiers {
            if let Some(generator) = classifier.classify(first, second) {
                return Ok(generator);
            }
        }
        Err(ConstraintError::UnclassifiedPair(Pair::new(
            first.id, second.id,
        )))
    }

    fn fresh_generator_id(&mut self) -> u64 {
        let id = self.next_generator_id;
        self.next_generator_id += 1;
        id
    }
}
