//! Flight units and the active flight set.
//!
//! A flight unit is one troop token produced by a dispatch. Its life is a
//! small state machine:
//!
//! ```text
//! Pending --(departure time, source debited)--> InFlight --+--> Arrived
//!                                                          +--> Collided
//! ```
//!
//! Terminal units are removed from the [`FlightSet`] immediately, so a unit
//! is never considered twice. Units reference nodes by id only.
//!
//! # Spatial index synchronization
//!
//! Collision sweeps rebuild the [`SpatialIndex`] from scratch every frame;
//! unit positions are a pure function of time, so there is nothing to keep
//! in sync between frames. Each sweep covers the whole window since the
//! previous frame, not just the sample instant.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::FormationConfig;
use crate::formation::{self, Slot};
use crate::node::{Camp, NodeId};
use crate::registry::NodeRegistry;
use crate::timeline::TimerId;

/// Unique identifier of a flight unit, never reused within an engine.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(u64);

impl FlightId {
    /// Creates a new `FlightId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlightId({})", self.0)
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightState {
    /// Waiting for its departure time.
    Pending,
    /// Airborne; eligible for collisions.
    InFlight,
    /// Resolved against its target.
    Arrived,
    /// Cancelled by an opposing unit.
    Collided,
}

impl FlightState {
    /// Returns true for `Arrived` and `Collided`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Arrived | Self::Collided)
    }
}

/// One discrete travelling troop token.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightUnit {
    id: FlightId,
    from: NodeId,
    to: NodeId,
    owner: Camp,
    departure_at: u64,
    travel_ms: u64,
    slot: Slot,
    state: FlightState,
    pub(crate) depart_timer: Option<TimerId>,
    pub(crate) arrive_timer: Option<TimerId>,
}

impl FlightUnit {
    /// Creates a pending unit.
    #[must_use]
    pub fn new(
        id: FlightId,
        from: NodeId,
        to: NodeId,
        owner: Camp,
        departure_at: u64,
        travel_ms: u64,
        slot: Slot,
    ) -> Self {
        Self {
            id,
            from,
            to,
            owner,
            departure_at,
            travel_ms,
            slot,
            state: FlightState::Pending,
            depart_timer: None,
            arrive_timer: None,
        }
    }

    /// Unit id.
    #[must_use]
    pub const fn id(&self) -> FlightId {
        self.id
    }

    /// Source node.
    #[must_use]
    pub const fn from(&self) -> NodeId {
        self.from
    }

    /// Target node.
    #[must_use]
    pub const fn to(&self) -> NodeId {
        self.to
    }

    /// Camp at dispatch time.
    #[must_use]
    pub const fn owner(&self) -> Camp {
        self.owner
    }

    /// Absolute time at which the unit leaves and debits its source.
    #[must_use]
    pub const fn departure_at(&self) -> u64 {
        self.departure_at
    }

    /// Travel duration.
    #[must_use]
    pub const fn travel_ms(&self) -> u64 {
        self.travel_ms
    }

    /// Absolute arrival time.
    #[must_use]
    pub const fn arrival_at(&self) -> u64 {
        self.departure_at.saturating_add(self.travel_ms)
    }

    /// Queue slot.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> FlightState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: FlightState) {
        self.state = state;
    }
}

/// Render-time view of an airborne unit.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightView {
    /// Unit id.
    pub id: FlightId,
    /// Owning camp.
    pub owner: Camp,
    /// Offset position.
    pub position: Vec2,
    /// Trip fraction in `[0, 1]`.
    pub progress: f32,
}

// =============================================================================
// Spatial Index
// =============================================================================

/// Uniform-grid position index for proximity queries over airborne units.
///
/// Units are bucketed into square cells of `cell_size`; a radius query only
/// visits the cells overlapping the query box.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<FlightId>>,
    positions: HashMap<FlightId, Vec2>,
}

impl SpatialIndex {
    /// Creates an empty index with cells of `cell_size` (clamped to at least 1).
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(1.0)
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Side length of one cell.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Inserts or moves a unit.
    pub fn insert(&mut self, id: FlightId, pos: Vec2) {
        if let Some(old) = self.positions.insert(id, pos) {
            let old_cell = self.cell_of(old);
            if let Some(bucket) = self.cells.get_mut(&old_cell) {
                bucket.retain(|other| *other != id);
            }
        }
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(id);
    }

    /// Returns a unit position, if indexed.
    #[must_use]
    pub fn get(&self, id: FlightId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Returns units within `radius` of `center`, sorted by id.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<FlightId> {
        let radius_sq = radius * radius;
        let (min_x, min_y) = self.cell_of(center - Vec2::splat(radius));
        let (max_x, max_y) = self.cell_of(center + Vec2::splat(radius));

        let mut results = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                results.extend(bucket.iter().copied().filter(|id| {
                    self.positions
                        .get(id)
                        .is_some_and(|pos| center.distance_squared(*pos) <= radius_sq)
                }));
            }
        }

        // bucket order is insertion order, cell order is arbitrary
        results.sort();
        results
    }

    /// Number of indexed units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Straight-line path of one unit between two sweep samples.
#[derive(Debug, Copy, Clone)]
struct SweptPath {
    id: FlightId,
    owner: Camp,
    start: Vec2,
    end: Vec2,
}

impl SweptPath {
    /// Smallest distance between two units moving linearly over the same
    /// sample window.
    fn closest_approach(&self, other: &Self) -> f32 {
        let d0 = self.start - other.start;
        let d1 = self.end - other.end;
        let closing = d1 - d0;
        let len_sq = closing.length_squared();
        let s = if len_sq <= f32::EPSILON {
            0.0
        } else {
            (-d0.dot(closing) / len_sq).clamp(0.0, 1.0)
        };
        (d0 + closing * s).length()
    }
}

// =============================================================================
// Flight Set
// =============================================================================

/// Active (non-terminal) flight units, in id order.
#[derive(Debug, Clone, Default)]
pub struct FlightSet {
    units: BTreeMap<FlightId, FlightUnit>,
}

impl FlightSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit.
    pub fn insert(&mut self, unit: FlightUnit) {
        self.units.insert(unit.id(), unit);
    }

    /// Returns a unit by id.
    #[must_use]
    pub fn get(&self, id: FlightId) -> Option<&FlightUnit> {
        self.units.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: FlightId) -> Option<&mut FlightUnit> {
        self.units.get_mut(&id)
    }

    /// Removes a unit, returning it if it was active.
    pub fn remove(&mut self, id: FlightId) -> Option<FlightUnit> {
        self.units.remove(&id)
    }

    /// Iterates units in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FlightUnit> + '_ {
        self.units.values()
    }

    /// Number of active units, pending included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if no unit is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of airborne units.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.units
            .values()
            .filter(|unit| unit.state() == FlightState::InFlight)
            .count()
    }

    /// Drops every unit.
    pub fn clear(&mut self) {
        self.units.clear();
    }

    /// Positions of airborne units at `now`, in id order.
    ///
    /// Positions are evaluated in parallel; the result order does not depend
    /// on scheduling.
    #[must_use]
    pub fn airborne_views(
        &self,
        registry: &NodeRegistry,
        now: u64,
        layout: &FormationConfig,
    ) -> Vec<FlightView> {
        let airborne: Vec<&FlightUnit> = self
            .units
            .values()
            .filter(|unit| unit.state() == FlightState::InFlight)
            .collect();

        airborne
            .par_iter()
            .filter_map(|unit| {
                let from = registry.get(unit.from())?.position();
                let to = registry.get(unit.to())?.position();
                let progress = formation::progress(unit, now)?;
                let position =
                    formation::offset_position(&unit.slot(), from, to, progress, layout);
                Some(FlightView {
                    id: unit.id(),
                    owner: unit.owner(),
                    position,
                    progress,
                })
            })
            .collect()
    }

    /// Paths of airborne units over `[since, now]`, in id order.
    ///
    /// A unit that departed inside the window starts at its departure point.
    fn swept_paths(
        &self,
        registry: &NodeRegistry,
        since: u64,
        now: u64,
        layout: &FormationConfig,
    ) -> Vec<SweptPath> {
        let airborne: Vec<&FlightUnit> = self
            .units
            .values()
            .filter(|unit| unit.state() == FlightState::InFlight)
            .collect();

        airborne
            .par_iter()
            .filter_map(|unit| {
                let from = registry.get(unit.from())?.position();
                let to = registry.get(unit.to())?.position();
                let end = formation::progress(unit, now)?;
                let start = formation::progress(unit, since.max(unit.departure_at()))?;
                let slot = unit.slot();
                Some(SweptPath {
                    id: unit.id(),
                    owner: unit.owner(),
                    start: formation::offset_position(&slot, from, to, start, layout),
                    end: formation::offset_position(&slot, from, to, end, layout),
                })
            })
            .collect()
    }

    /// Finds colliding pairs among airborne units over the window
    /// `[since, now]`.
    ///
    /// Two units collide when their owners differ and their offset positions
    /// come within `2 * unit_radius` at any point of the window, each unit
    /// moving in a straight line between its positions at `since` and `now`.
    /// Sampling only at `now` would let fast units on long lanes pass through
    /// each other between frames.
    ///
    /// Each unit appears in at most one pair; units are matched in id order,
    /// each with its lowest-id partner.
    #[must_use]
    pub fn detect_collisions(
        &self,
        registry: &NodeRegistry,
        since: u64,
        now: u64,
        layout: &FormationConfig,
    ) -> Vec<(FlightId, FlightId)> {
        let paths = self.swept_paths(registry, since, now, layout);
        if paths.len() < 2 {
            return Vec::new();
        }

        let reach = layout.unit_radius * 2.0;
        // two units can close by at most the sum of their own steps
        let max_step = paths
            .iter()
            .map(|path| path.start.distance(path.end))
            .fold(0.0_f32, f32::max);
        let search = reach + 2.0 * max_step;

        let mut index = SpatialIndex::new(search);
        let mut by_id = HashMap::with_capacity(paths.len());
        for path in &paths {
            index.insert(path.id, path.end);
            by_id.insert(path.id, *path);
        }

        let mut taken = BTreeSet::new();
        let mut pairs = Vec::new();
        for path in &paths {
            if taken.contains(&path.id) {
                continue;
            }
            let partner = index
                .query_radius(path.end, search)
                .into_iter()
                .find(|other| {
                    *other != path.id
                        && !taken.contains(other)
                        && by_id.get(other).is_some_and(|candidate| {
                            candidate.owner != path.owner
                                && path.closest_approach(candidate) <= reach
                        })
                });
            if let Some(other) = partner {
                taken.insert(path.id);
                taken.insert(other);
                pairs.push((path.id, other));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn registry() -> NodeRegistry {
        NodeRegistry::new([
            Node::new(NodeId::new(0), Vec2::ZERO, Camp::Blue, 10.0),
            Node::new(NodeId::new(1), Vec2::new(200.0, 0.0), Camp::Red, 10.0),
        ])
    }

    fn single_slot() -> Slot {
        Slot::for_index(0, 1, 5, 3, &FormationConfig::default())
    }

    fn airborne(id: u64, from: u32, to: u32, owner: Camp) -> FlightUnit {
        let mut unit = FlightUnit::new(
            FlightId::new(id),
            NodeId::new(from),
            NodeId::new(to),
            owner,
            0,
            2000,
            single_slot(),
        );
        unit.set_state(FlightState::InFlight);
        unit
    }

    mod unit_tests {
        use super::*;

        #[test]
        fn arrival_is_departure_plus_travel() {
            let unit = airborne(1, 0, 1, Camp::Blue);
            assert_eq!(unit.arrival_at(), 2000);
        }

        #[test]
        fn terminal_states() {
            assert!(FlightState::Arrived.is_terminal());
            assert!(FlightState::Collided.is_terminal());
            assert!(!FlightState::InFlight.is_terminal());
            assert!(!FlightState::Pending.is_terminal());
        }
    }

    mod spatial_tests {
        use super::*;

        #[test]
        fn query_radius_is_sorted_and_inclusive() {
            let mut index = SpatialIndex::new(5.0);
            index.insert(FlightId::new(9), Vec2::new(3.0, 4.0));
            index.insert(FlightId::new(2), Vec2::new(0.0, 0.0));
            index.insert(FlightId::new(5), Vec2::new(30.0, 0.0));

            let hits = index.query_radius(Vec2::ZERO, 5.0);
            assert_eq!(hits, vec![FlightId::new(2), FlightId::new(9)]);
            assert_eq!(index.len(), 3);
            assert_eq!(index.get(FlightId::new(5)), Some(Vec2::new(30.0, 0.0)));
        }

        #[test]
        fn query_spans_neighbouring_cells() {
            let mut index = SpatialIndex::new(5.0);
            index.insert(FlightId::new(1), Vec2::new(-2.0, -1.0));
            index.insert(FlightId::new(2), Vec2::new(4.0, 0.5));
            index.insert(FlightId::new(3), Vec2::new(-30.0, 0.0));

            let hits = index.query_radius(Vec2::new(1.0, 0.0), 4.0);
            assert_eq!(hits, vec![FlightId::new(1), FlightId::new(2)]);
        }

        #[test]
        fn reinsert_moves_unit_between_cells() {
            let mut index = SpatialIndex::new(5.0);
            index.insert(FlightId::new(1), Vec2::new(0.0, 0.0));
            index.insert(FlightId::new(1), Vec2::new(100.0, 0.0));

            assert!(index.query_radius(Vec2::ZERO, 5.0).is_empty());
            assert_eq!(index.query_radius(Vec2::new(100.0, 0.0), 1.0), vec![FlightId::new(1)]);
            assert_eq!(index.len(), 1);
        }
    }

    mod collision_tests {
        use super::*;

        #[test]
        fn opposing_units_meeting_midway_collide() {
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));
            set.insert(airborne(2, 1, 0, Camp::Red));

            let pairs = set.detect_collisions(&registry(), 984, 1000, &FormationConfig::default());
            assert_eq!(pairs, vec![(FlightId::new(1), FlightId::new(2))]);
        }

        #[test]
        fn same_owner_never_collides() {
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));
            set.insert(airborne(2, 1, 0, Camp::Blue));

            let pairs = set.detect_collisions(&registry(), 984, 1000, &FormationConfig::default());
            assert!(pairs.is_empty());
        }

        #[test]
        fn distant_units_do_not_collide() {
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));
            set.insert(airborne(2, 1, 0, Camp::Red));

            let pairs = set.detect_collisions(&registry(), 484, 500, &FormationConfig::default());
            assert!(pairs.is_empty());
        }

        #[test]
        fn each_unit_collides_at_most_once() {
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));
            set.insert(airborne(2, 0, 1, Camp::Blue));
            set.insert(airborne(3, 1, 0, Camp::Red));

            let pairs = set.detect_collisions(&registry(), 984, 1000, &FormationConfig::default());
            assert_eq!(pairs, vec![(FlightId::new(1), FlightId::new(3))]);
        }

        #[test]
        fn fast_units_crossing_between_samples_collide() {
            let long_lane = NodeRegistry::new([
                Node::new(NodeId::new(0), Vec2::ZERO, Camp::Blue, 10.0),
                Node::new(NodeId::new(1), Vec2::new(1200.0, 0.0), Camp::Red, 10.0),
            ]);
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));
            set.insert(airborne(2, 1, 0, Camp::Red));
            let layout = FormationConfig::default();

            // 9.6 apart on either side of the meeting point
            assert!(set.detect_collisions(&long_lane, 992, 992, &layout).is_empty());
            assert!(set.detect_collisions(&long_lane, 1008, 1008, &layout).is_empty());

            let pairs = set.detect_collisions(&long_lane, 992, 1008, &layout);
            assert_eq!(pairs, vec![(FlightId::new(1), FlightId::new(2))]);
        }

        #[test]
        fn diverging_units_in_window_do_not_collide() {
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));
            set.insert(airborne(2, 1, 0, Camp::Red));

            // already past each other for the whole window
            let pairs = set.detect_collisions(&registry(), 1200, 1216, &FormationConfig::default());
            assert!(pairs.is_empty());
        }

        #[test]
        fn pending_units_are_ignored() {
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));
            let mut pending = airborne(2, 1, 0, Camp::Red);
            pending.set_state(FlightState::Pending);
            set.insert(pending);

            let pairs = set.detect_collisions(&registry(), 984, 1000, &FormationConfig::default());
            assert!(pairs.is_empty());
            assert_eq!(set.in_flight_count(), 1);
        }
    }

    mod view_tests {
        use super::*;

        #[test]
        fn views_report_progress_and_position() {
            let mut set = FlightSet::new();
            set.insert(airborne(1, 0, 1, Camp::Blue));

            let views = set.airborne_views(&registry(), 500, &FormationConfig::default());
            assert_eq!(views.len(), 1);
            assert!((views[0].progress - 0.25).abs() < 1e-6);
            assert!((views[0].position.x - 50.0).abs() < 1e-4);
            assert_eq!(views[0].owner, Camp::Blue);
        }

        #[test]
        fn views_skip_units_before_departure() {
            let mut set = FlightSet::new();
            let mut late = FlightUnit::new(
                FlightId::new(1),
                NodeId::new(0),
                NodeId::new(1),
                Camp::Blue,
                800,
                2000,
                single_slot(),
            );
            late.set_state(FlightState::InFlight);
            set.insert(late);

            assert!(set
                .airborne_views(&registry(), 500, &FormationConfig::default())
                .is_empty());
        }
    }
}
