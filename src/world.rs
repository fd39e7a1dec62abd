use glam::Vec3;
use thiserror::Error;

use crate::{
    collision::broadphase::{
        BodyPair, BroadphaseError, BroadphaseHandler, SweepAndPrune, SweepEvents,
    },
    config::{SolverConfig, DEFAULT_GRAVITY, DEFAULT_TIME_STEP},
    constraint::{
        graph::ComponentGraph,
        joint::Joint,
        manager::{ConstraintError, ContactConstraintManager},
        Constraint, ContactConstraint,
    },
    core::{geometry::Geometry, rigidbody::RigidBody},
    dynamics::{
        forces::ForceRegistry,
        integrator::Integrator,
        solver::{NcpRow, ProjectedGaussSeidel},
    },
    trigger::ContactTrigger,
    utils::{
        allocator::{Arena, EntityId},
        logging::ScopedTimer,
    },
};

#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Broadphase(#[from] BroadphaseError),
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
}

/// Central simulation container: owns the body and geometry arenas and
/// drives the fixed-timestep tick.
///
/// A tick is an atomic batch: clear accumulators, apply forces, run the
/// broadphase (updating the constraint graph through the manager), walk the
/// graph components to build the row list, solve, integrate. Any fatal
/// error aborts the tick before velocities are touched.
pub struct PhysicsWorld {
    pub bodies: Arena<RigidBody>,
    pub geometries: Arena<Geometry>,
    pub gravity: Vec3,
    pub time_step: f32,
    pub config: SolverConfig,
    pub force_registry: ForceRegistry,
    solver: ProjectedGaussSeidel,
    integrator: Integrator,
    broadphase: SweepAndPrune,
    graph: ComponentGraph<Constraint>,
    manager: ContactConstraintManager,
    handlers: Vec<Box<dyn BroadphaseHandler>>,
    triggers: Vec<ContactTrigger>,
    time_accumulated: f32,
    rows: Vec<NcpRow>,
    row_spans: Vec<(BodyPair, std::ops::Range<usize>)>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

impl PhysicsWorld {
    pub fn new(time_step: f32) -> Self {
        Self::with_config(time_step, SolverConfig::default())
    }

    pub fn with_config(time_step: f32, config: SolverConfig) -> Self {
        let ts = if time_step <= 0.0 {
            DEFAULT_TIME_STEP
        } else {
            time_step
        };
        Self {
            bodies: Arena::new(),
            geometries: Arena::new(),
            gravity: Vec3::from_slice(&DEFAULT_GRAVITY),
            time_step: ts,
            config,
            force_registry: ForceRegistry::new(),
            solver: ProjectedGaussSeidel::new(config.sweeps, config.termination_tolerance),
            integrator: Integrator,
            broadphase: SweepAndPrune::default(),
            graph: ComponentGraph::new(),
            manager: ContactConstraintManager::new(),
            handlers: Vec::new(),
            triggers: Vec::new(),
            time_accumulated: 0.0,
            rows: Vec::new(),
            row_spans: Vec::new(),
        }
    }

    pub fn add_body(&mut self, body: RigidBody) -> EntityId {
        let id = self.bodies.insert(body);
        if let Some(stored) = self.bodies.get_mut(id) {
            stored.id = id;
        }
        id
    }

    /// Removes a body together with its geometries; dependent contact
    /// constraints tear down through synthesized separation events.
    pub fn remove_body(&mut self, id: EntityId) -> Result<Option<RigidBody>, StepError> {
        let Some(geometry_ids) = self.bodies.get(id).map(|body| body.geometries.clone()) else {
            return Ok(None);
        };
        for geometry in geometry_ids {
            self.remove_geometry(geometry)?;
        }
        // drop any joints still anchored to the body
        let joint_pairs: Vec<BodyPair> =
            self.graph.edges_of(id).map(|(pair, _)| pair).collect();
        for pair in joint_pairs {
            self.graph.remove_edge(&pair);
        }
        Ok(self.bodies.remove(id))
    }

    /// Adds a geometry owned by `body` and registers it with the broadphase.
    pub fn add_geometry(
        &mut self,
        body: EntityId,
        mut geometry: Geometry,
    ) -> Result<EntityId, StepError> {
        geometry.body = body;
        let id = self.geometries.insert(geometry);
        if let Some(stored) = self.geometries.get_mut(id) {
            stored.id = id;
        }
        if let Err(error) = self.broadphase.add(id, &self.geometries, &self.bodies) {
            self.geometries.remove(id);
            return Err(error.into());
        }
        if let Some(owner) = self.bodies.get_mut(body) {
            owner.geometries.push(id);
        }
        Ok(id)
    }

    /// Unregisters a geometry. Separations synthesized by the broadphase are
    /// dispatched before the geometry leaves the arena, so constraints tear
    /// down deterministically.
    pub fn remove_geometry(&mut self, id: EntityId) -> Result<(), StepError> {
        let separations = self.broadphase.remove(id)?;
        for pair in separations {
            self.manager
                .separation(pair, &self.geometries, &self.bodies, &mut self.graph)?;
            for handler in &mut self.handlers {
                handler.separation(pair);
            }
        }
        if let Some(geometry) = self.geometries.remove(id) {
            if let Some(owner) = self.bodies.get_mut(geometry.body) {
                owner.geometries.retain(|g| *g != id);
            }
        }
        Ok(())
    }

    /// Installs a joint on a body pair. Fails if the pair already holds any
    /// constraint.
    pub fn add_joint(&mut self, joint: Joint) -> Result<(), StepError> {
        let pair = joint.bodies();
        if self.graph.contains_edge(&pair) {
            return Err(ConstraintError::PairOccupied(pair).into());
        }
        let first_fixed = self.bodies.get(pair.first).map(|b| b.fixed).unwrap_or(false);
        let second_fixed = self
            .bodies
            .get(pair.second)
            .map(|b| b.fixed)
            .unwrap_or(false);
        self.graph
            .add_edge(pair, first_fixed, second_fixed, Constraint::Joint(joint));
        Ok(())
    }

    pub fn remove_joint(&mut self, pair: &BodyPair) -> Option<Joint> {
        if !matches!(self.graph.edge(pair), Some(Constraint::Joint(_))) {
            return None;
        }
        match self.graph.remove_edge(pair) {
            Some(Constraint::Joint(joint)) => Some(joint),
            _ => None,
        }
    }

    pub fn body(&self, id: EntityId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn geometry(&self, id: EntityId) -> Option<&Geometry> {
        self.geometries.get(id)
    }

    pub fn contact_constraint(&self, pair: &BodyPair) -> Option<&ContactConstraint> {
        self.graph.edge(pair).and_then(Constraint::as_contact)
    }

    pub fn constraint_graph(&self) -> &ComponentGraph<Constraint> {
        &self.graph
    }

    pub fn broadphase(&self) -> &SweepAndPrune {
        &self.broadphase
    }

    pub fn contact_manager_mut(&mut self) -> &mut ContactConstraintManager {
        &mut self.manager
    }

    /// Subscribes an external handler to broadphase transitions. The
    /// built-in constraint manager always runs first; external handlers
    /// follow in registration order.
    pub fn add_broadphase_handler(&mut self, handler: Box<dyn BroadphaseHandler>) {
        self.handlers.push(handler);
    }

    pub fn add_trigger(&mut self, trigger: ContactTrigger) {
        self.triggers.push(trigger);
    }

    /// Advances the simulation using a fixed timestep accumulator.
    pub fn step(&mut self, dt: f32) -> Result<(), StepError> {
        self.time_accumulated += dt;
        while self.time_accumulated >= self.time_step {
            self.time_accumulated -= self.time_step;
            self.tick()?;
        }
        Ok(())
    }

    /// One fixed-size simulation step.
    pub fn tick(&mut self) -> Result<(), StepError> {
        let _timer = ScopedTimer::new("world::tick");
        let dt = self.time_step;

        // clear forces and solver accumulators
        for body in self.bodies.iter_mut() {
            body.clear_accumulators();
        }

        // apply forces; they enter the solve as delta-velocities
        let gravity = self.gravity;
        for body in self.bodies.iter_mut() {
            if !body.fixed {
                body.acceleration += gravity * body.gravity_scale;
            }
        }
        self.force_registry.apply_all(&mut self.bodies, dt);
        self.integrator.apply_forces(&mut self.bodies, dt);

        // broadphase; overlap transitions drive the constraint graph
        let events = {
            let _timer = ScopedTimer::new("broadphase::run");
            self.broadphase.run(&self.geometries, &self.bodies)?
        };
        self.dispatch(events)?;

        // walk graph components and flatten every constraint into rows
        self.rows.clear();
        self.row_spans.clear();
        {
            let _timer = ScopedTimer::new("constraints::apply");
            let component_ids: Vec<_> = self.graph.components().collect();
            for component in component_ids {
                let pairs: Vec<BodyPair> =
                    self.graph.edge_pairs_in_component(component).collect();
                for pair in pairs {
                    let start = self.rows.len();
                    match self.graph.edge_mut(&pair) {
                        Some(Constraint::Contact(constraint)) => constraint.apply_constraints(
                            &self.bodies,
                            &self.geometries,
                            dt,
                            &self.config,
                            &mut self.rows,
                        ),
                        Some(Constraint::Joint(joint)) => {
                            joint.apply_constraints(&self.bodies, dt, &mut self.rows)
                        }
                        None => {}
                    }
                    if self.rows.len() > start {
                        self.row_spans.push((pair, start..self.rows.len()));
                    }
                }
            }
        }

        {
            let _timer = ScopedTimer::new("solver::solve");
            self.solver.solve(&mut self.rows, &mut self.bodies);
        }

        // persist solved impulses into the per-constraint slots
        for (pair, span) in &self.row_spans {
            if let Some(Constraint::Contact(constraint)) = self.graph.edge_mut(pair) {
                constraint.store_impulses(&self.rows[span.clone()]);
            }
        }

        self.integrator.advance(&mut self.bodies, dt);

        for trigger in &mut self.triggers {
            trigger.update(&self.graph);
        }

        Ok(())
    }

    fn dispatch(&mut self, events: SweepEvents) -> Result<(), StepError> {
        for pair in events.overlaps {
            self.manager
                .overlap(pair, &self.geometries, &self.bodies, &mut self.graph)?;
            for handler in &mut self.handlers {
                handler.overlap(pair);
            }
        }
        for pair in events.separations {
            self.manager
                .separation(pair, &self.geometries, &self.bodies, &mut self.graph)?;
            for handler in &mut self.handlers {
                handler.separation(pair);
            }
        }
        Ok(())
    }
}
