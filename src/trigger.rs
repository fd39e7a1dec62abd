use crate::{
    collision::broadphase::BodyPair,
    constraint::{graph::ComponentGraph, Constraint},
    utils::allocator::EntityId,
};

/// Monitors one body for contact interactions.
///
/// When the summed normal impulse of a contact constraint involving the
/// monitored body climbs above the threshold, the `above` callback fires
/// once; when it falls back below, or the constraint vanishes entirely, the
/// `below` callback fires. Updated by the world after each solve.
pub struct ContactTrigger {
    body: EntityId,
    impulse_threshold: f32,
    triggered: Vec<BodyPair>,
    above: Box<dyn FnMut(EntityId, BodyPair)>,
    below: Box<dyn FnMut(EntityId, BodyPair)>,
}

impl ContactTrigger {
    pub fn new(
        body: EntityId,
        impulse_threshold: f32,
        above: impl FnMut(EntityId, BodyPair) + 'static,
        below: impl FnMut(EntityId, BodyPair) + 'static,
    ) -> Self {
        Self {
            body,
            impulse_threshold,
            triggered: Vec::new(),
            above: Box::new(above),
            below: Box::new(below),
        }
    }

    pub fn body(&self) -> EntityId {
        self.body
    }

    pub(crate) fn update(&mut self, graph: &ComponentGraph<Constraint>) {
        // constraints that vanished count as dropping below the threshold
        let body = self.body;
        let mut vanished = Vec::new();
        self.triggered.retain(|pair| {
            if graph.contains_edge(pair) {
                true
            } else {
                vanished.push(*pair);
                false
            }
        });
        for pair in vanished {
            (self.below)(pair.other(body), pair);
        }

        for (pair, constraint) in graph.edges_of(self.body) {
            let Constraint::Contact(contact) = constraint else {
                continue;
            };
            let total = contact.total_normal_impulse();
            let position = self.triggered.iter().position(|p| *p == pair);
            match position {
                None if total > self.impulse_threshold => {
                    self.triggered.push(pair);
                    (self.above)(pair.other(body), pair);
                }
                Some(index) if total <= self.impulse_threshold => {
                    self.triggered.remove(index);
                    (self.below)(pair.other(body), pair);
                }
                _ => {}
            }
        }
    }
}
