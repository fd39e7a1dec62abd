use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
    config::DEFAULT_BROADPHASE_CAPACITY,
    core::{geometry::Geometry, rigidbody::RigidBody, types::Transform},
    utils::{
        allocator::{Arena, EntityId},
        math::Pair,
    },
};

/// Unordered key for a pair of geometries.
pub type GeometryPair = Pair<EntityId>;

/// Unordered key for a pair of bodies.
pub type BodyPair = Pair<EntityId>;

#[derive(Debug, Error, PartialEq)]
pub enum BroadphaseError {
    /// A geometry produced a NaN bounding value; its state is corrupted and
    /// the tick must not proceed.
    #[error("geometry {0:?} has NaN in its bounding values")]
    NanBounds(EntityId),
    #[error("geometry {0:?} is already registered")]
    AlreadyRegistered(EntityId),
    #[error("geometry {0:?} is not registered")]
    UnknownGeometry(EntityId),
    #[error("broadphase capacity of {0} geometries exceeded")]
    CapacityExceeded(usize),
}

/// Overlap transitions observed during one `run`.
///
/// A pair never appears in both lists: a pair that both gains and loses full
/// overlap within the same run cancels out and is reported in neither.
#[derive(Debug, Default)]
pub struct SweepEvents {
    pub overlaps: Vec<GeometryPair>,
    pub separations: Vec<GeometryPair>,
}

/// Receives overlap transitions after each broadphase run, in registration
/// order.
pub trait BroadphaseHandler {
    fn overlap(&mut self, pair: GeometryPair);
    fn separation(&mut self, pair: GeometryPair);
}

#[derive(Debug, Clone, Copy)]
struct SweepPoint {
    geometry: EntityId,
    begin: bool,
    value: f32,
}

/// Incremental sweep-and-prune broadphase.
///
/// Each geometry contributes a begin and an end point per axis. Every run
/// insertion-sorts the three axis arrays; under temporal coherence the
/// arrays are nearly sorted already, so a run is close to linear in the
/// number of geometries. Each adjacent swap during sorting moves exactly one
/// axis-overlap boundary, which is tallied in a per-pair counter: a pair
/// overlaps in space iff its counter reaches 3.
pub struct SweepAndPrune {
    capacity: usize,
    geometries: Vec<EntityId>,
    axes: [Vec<SweepPoint>; 3],
    counters: HashMap<GeometryPair, u8>,
    overlapping: HashSet<GeometryPair>,
    incoming: Vec<GeometryPair>,
    leaving: Vec<GeometryPair>,
}

impl Default for SweepAndPrune {
    fn default() -> Self {
        Self::new(DEFAULT_BROADPHASE_CAPACITY)
    }
}

impl SweepAndPrune {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            geometries: Vec::new(),
            axes: [Vec::new(), Vec::new(), Vec::new()],
            counters: HashMap::new(),
            overlapping: HashSet::new(),
            incoming: Vec::new(),
            leaving: Vec::new(),
        }
    }

    /// Registers a geometry, inserting two sweep points per axis.
    pub fn add(
        &mut self,
        geometry: EntityId,
        geometries: &Arena<Geometry>,
        bodies: &Arena<RigidBody>,
    ) -> Result<(), BroadphaseError> {
        if self.geometries.contains(&geometry) {
            return Err(BroadphaseError::AlreadyRegistered(geometry));
        }
        if self.geometries.len() >= self.capacity {
            return Err(BroadphaseError::CapacityExceeded(self.capacity));
        }

        let bounds = Self::bounds_of(geometry, geometries, bodies)?;
        for axis in 0..3 {
            self.axes[axis].push(SweepPoint {
                geometry,
                begin: true,
                value: bounds.0[axis],
            });
            self.axes[axis].push(SweepPoint {
                geometry,
                begin: false,
                value: bounds.1[axis],
            });
        }
        self.geometries.push(geometry);
        Ok(())
    }

    /// Unregisters a geometry, compacting all three axis arrays and purging
    /// every counter that references it.
    ///
    /// Pairs that were fully overlapping get a separation event synthesized
    /// into the returned list, so callers can tear dependent constraints
    /// down before the geometry itself disappears.
    pub fn remove(&mut self, geometry: EntityId) -> Result<Vec<GeometryPair>, BroadphaseError> {
        let Some(position) = self.geometries.iter().position(|g| *g == geometry) else {
            return Err(BroadphaseError::UnknownGeometry(geometry));
        };
        self.geometries.swap_remove(position);

        for axis in &mut self.axes {
            axis.retain(|point| point.geometry != geometry);
        }

        let mut separations = Vec::new();
        let overlapping = &mut self.overlapping;
        self.counters.retain(|pair, count| {
            if !pair.contains(geometry) {
                return true;
            }
            if *count == 3 {
                overlapping.remove(pair);
                separations.push(*pair);
            }
            false
        });

        Ok(separations)
    }

    /// Sorts each axis once, updating pair counters on every adjacent swap,
    /// and reports the pairs whose counter transitioned to or away from full
    /// overlap.
    pub fn run(
        &mut self,
        geometries: &Arena<Geometry>,
        bodies: &Arena<RigidBody>,
    ) -> Result<SweepEvents, BroadphaseError> {
        self.incoming.clear();
        self.leaving.clear();

        for axis in 0..3 {
            // refresh sweep values once per run; bodies move every tick
            for index in 0..self.axes[axis].len() {
                let point = self.axes[axis][index];
                let bounds = Self::bounds_of(point.geometry, geometries, bodies)?;
                self.axes[axis][index].value = if point.begin {
                    bounds.0[axis]
                } else {
                    bounds.1[axis]
                };
            }
            Self::sort_axis(
                &mut self.axes[axis],
                &mut self.counters,
                &mut self.overlapping,
                &mut self.incoming,
                &mut self.leaving,
            );
        }

        Ok(SweepEvents {
            overlaps: self.incoming.clone(),
            separations: self.leaving.clone(),
        })
    }

    /// The set of pairs currently in full overlap.
    pub fn overlapping_pairs(&self) -> impl Iterator<Item = GeometryPair> + '_ {
        self.overlapping.iter().copied()
    }

    /// Number of axes on which the pair's intervals currently overlap.
    pub fn overlap_count(&self, pair: GeometryPair) -> u8 {
        self.counters.get(&pair).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    fn bounds_of(
        geometry: EntityId,
        geometries: &Arena<Geometry>,
        bodies: &Arena<RigidBody>,
    ) -> Result<(glam::Vec3, glam::Vec3), BroadphaseError> {
        let geom = geometries
            .get(geometry)
            .ok_or(BroadphaseError::UnknownGeometry(geometry))?;
        let body_transform = bodies
            .get(geom.body)
            .map(|body| body.transform)
            .unwrap_or_else(Transform::default);
        let bounds = geom.world_bounds(&body_transform);
        if bounds.min.is_nan() || bounds.max.is_nan() {
            return Err(BroadphaseError::NanBounds(geometry));
        }
        Ok((bounds.min, bounds.max))
    }

    /// Insertion sort that observes element interchanges.
    ///
    /// A begin point moving in front of another geometry's end point opens an
    /// axis overlap (increment); an end point moving in front of a begin
    /// point closes one (decrement). Transitions through 3 are recorded in
    /// `incoming`/`leaving` with mutual cancellation inside a single run.
    fn sort_axis(
        axis: &mut [SweepPoint],
        counters: &mut HashMap<GeometryPair, u8>,
        overlapping: &mut HashSet<GeometryPair>,
        incoming: &mut Vec<GeometryPair>,
        leaving: &mut Vec<GeometryPair>,
    ) {
        for j in 1..axis.len() {
            let key = axis[j];
            let mut i = j as isize - 1;

            while i >= 0 && axis[i as usize].value > key.value {
                let swapper = axis[i as usize];

                if key.begin && !swapper.begin {
                    let pair = Pair::new(key.geometry, swapper.geometry);
                    let count = counters.entry(pair).or_insert(0);
                    *count += 1;
                    debug_assert!(*count <= 3);
                    if *count == 3 {
                        overlapping.insert(pair);
                        if !remove_pair(leaving, &pair) {
                            incoming.push(pair);
                        }
                    }
                }

                if !key.begin && swapper.begin {
                    let pair = Pair::new(key.geometry, swapper.geometry);
                    if let Some(count) = counters.get_mut(&pair) {
                        debug_assert!(*count > 0);
                        *count -= 1;
                        if *count == 2 {
                            overlapping.remove(&pair);
                            if !remove_pair(incoming, &pair) {
                                leaving.push(pair);
                            }
                        }
                        if *count == 0 {
                            counters.remove(&pair);
                        }
                    }
                }

                axis[i as usize + 1] = swapper;
                i -= 1;
            }
            axis[(i + 1) as usize] = key;
        }
    }
}

fn remove_pair(list: &mut Vec<GeometryPair>, pair: &GeometryPair) -> bool {
    if let Some(position) = list.iter().position(|candidate| candidate == pair) {
        list.remove(position);
        true
    } else {
        false
    }
}
