//! The simulation engine: single writer over nodes, flights and the clock.
//!
//! `Engine` owns every piece of mutable state and runs all work as tasks on
//! one [`Timeline`]:
//!
//! 1. **DEBIT**: a departing unit takes one unit of value from its source
//! 2. **FRAME**: opposing airborne units within collision reach cancel out
//! 3. **ARRIVAL**: a unit resolves against its target
//! 4. **GROWTH**: passive regeneration
//! 5. **AI**: the planner may issue one dispatch
//!
//! Tasks sharing an instant run in that order. The victory condition is
//! re-evaluated after every task; on a terminal result every pending task is
//! cancelled and the active flight set is cleared, which also freezes growth
//! and the AI.
//!
//! # Determinism
//!
//! Given the same level, config, seed and sequence of calls, an engine
//! produces identical node values, events and results:
//! - nodes and flights are stored in `BTreeMap`s and iterated in id order
//! - tasks are ordered by `(time, phase, scheduling order)`
//! - AI jitter comes from a `ChaCha8Rng` seeded from the engine seed
//!
//! # Example
//!
//! ```
//! use foothold_core::config::EngineConfig;
//! use foothold_core::engine::Engine;
//! use foothold_core::level::LevelDef;
//! use foothold_core::node::{Camp, NodeId};
//!
//! let mut engine = Engine::new(LevelDef::test_panel().unwrap(), EngineConfig::default(), 42).unwrap();
//!
//! let cohort = engine.dispatch(NodeId::new(0), NodeId::new(1), Camp::Blue, 6.0);
//! assert_eq!(cohort.len(), 6);
//!
//! engine.advance(5_000);
//! assert_eq!(engine.now(), 5_000);
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::ai::{AiPlanner, Planner, PlannerContext};
use crate::config::EngineConfig;
use crate::dispatch::{DispatchIntent, DispatchScheduler};
use crate::error::{EngineError, OrderError};
use crate::flight::{FlightId, FlightSet, FlightState, FlightView};
use crate::formation;
use crate::growth::GrowthEngine;
use crate::level::LevelDef;
use crate::node::{Camp, NodeId, NodeView};
use crate::registry::{NodeRegistry, RegistrySnapshot};
use crate::resolver::{CombatResolver, Event, HitOutcome, Observer};
use crate::timeline::{Phase, Task, TimerId, Timeline};
use crate::victory::{GameResult, VictoryEvaluator};

// =============================================================================
// Engine
// =============================================================================

/// Authoritative simulation of one round on one level.
pub struct Engine {
    level: LevelDef,
    config: EngineConfig,
    seed: u64,
    registry: NodeRegistry,
    initial: RegistrySnapshot,
    timeline: Timeline,
    flights: FlightSet,
    scheduler: DispatchScheduler,
    growth: GrowthEngine,
    combat: CombatResolver,
    victory: VictoryEvaluator,
    planner: Box<dyn Planner>,
    observers: Vec<Arc<dyn Observer>>,
    now: u64,
    round_started_at: u64,
    result: GameResult,
    winner: Option<Camp>,
    frame_timer: Option<TimerId>,
    ai_timer: Option<TimerId>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("level", &self.level.name)
            .field("seed", &self.seed)
            .field("now", &self.now)
            .field("round_started_at", &self.round_started_at)
            .field("result", &self.result)
            .field("nodes", &self.registry.len())
            .field("flights", &self.flights.len())
            .field("pending_tasks", &self.timeline.len())
            .field("observers", &format!("[{} observers]", self.observers.len()))
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Builds an engine at time 0 with the stock [`AiPlanner`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `config` fails validation and
    /// [`EngineError::Level`] if `level` is unusable for the configured camps.
    pub fn new(level: LevelDef, config: EngineConfig, seed: u64) -> Result<Self, EngineError> {
        config.validate()?;
        level.validate(config.player_camp, config.ai.camp)?;

        let registry = NodeRegistry::new(level.build_nodes());
        let initial = registry.snapshot();
        let planner = Box::new(AiPlanner::new(config.ai.clone(), config.player_camp, seed));

        let mut engine = Self {
            scheduler: DispatchScheduler::new(config.timing.clone(), config.formation.clone()),
            growth: GrowthEngine::new(config.growth.clone()),
            combat: CombatResolver::new(config.combat.clone(), config.growth.owned_cap),
            victory: VictoryEvaluator::new(config.player_camp, config.ai.camp),
            level,
            config,
            seed,
            registry,
            initial,
            timeline: Timeline::new(),
            flights: FlightSet::new(),
            planner,
            observers: Vec::new(),
            now: 0,
            round_started_at: 0,
            result: GameResult::Playing,
            winner: None,
            frame_timer: None,
            ai_timer: None,
        };
        engine.start_round(0);
        Ok(engine)
    }

    /// Replaces the computer opponent.
    ///
    /// The new planner is reset to the current round start and takes its
    /// first decision one interval from now.
    pub fn set_planner(&mut self, mut planner: Box<dyn Planner>) {
        if let Some(timer) = self.ai_timer.take() {
            self.timeline.cancel(timer);
        }
        planner.reset(self.round_started_at);
        debug!(camp = %planner.camp(), interval_ms = planner.interval_ms(), "planner replaced");
        self.planner = planner;
        if !self.result.is_terminal() {
            self.schedule_ai(self.now);
        }
    }

    /// Registers an observer for every subsequent event.
    pub fn subscribe(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Sends `floor(amount)` units from `from` to `to` on behalf of `owner`.
    ///
    /// Invalid intents (`from == to`, fewer than one whole unit) are ignored,
    /// as are all intents once the round is over. Ownership is not checked
    /// and the amount is not clamped to the source value; use
    /// [`Engine::order`] for validated player input.
    ///
    /// Units of the first column depart immediately.
    pub fn dispatch(&mut self, from: NodeId, to: NodeId, owner: Camp, amount: f64) -> Vec<FlightId> {
        let intent = DispatchIntent {
            from,
            to,
            owner,
            amount,
        };
        let ids = self.accept(&intent, self.now);
        if !ids.is_empty() {
            self.run_due(self.now);
        }
        ids
    }

    /// Validated player order: every source sends `floor(value * ratio)`
    /// units to `to`.
    ///
    /// Duplicate sources are sent once. Sources whose share floors to zero
    /// send nothing.
    ///
    /// # Errors
    ///
    /// Rejects the whole order if the round is over, no source is given, the
    /// ratio is outside `(0, 1]`, a node is unknown, a source is the target,
    /// or a source is not owned by the player camp.
    pub fn order(
        &mut self,
        sources: &[NodeId],
        to: NodeId,
        ratio: f64,
    ) -> Result<Vec<FlightId>, OrderError> {
        if self.result.is_terminal() {
            return Err(OrderError::Finished);
        }
        if sources.is_empty() {
            return Err(OrderError::NoSources);
        }
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(OrderError::InvalidRatio(ratio));
        }
        if !self.registry.contains(to) {
            return Err(OrderError::UnknownNode(to));
        }

        let camp = self.config.player_camp;
        let mut seen = BTreeSet::new();
        let mut shares = Vec::with_capacity(sources.len());
        for &from in sources {
            if !seen.insert(from) {
                continue;
            }
            let node = self
                .registry
                .get(from)
                .ok_or(OrderError::UnknownNode(from))?;
            if from == to {
                return Err(OrderError::SelfTarget(from));
            }
            if node.owner() != camp {
                return Err(OrderError::NotOwned {
                    node: from,
                    owner: node.owner(),
                    camp,
                });
            }
            shares.push((from, (node.value() * ratio).floor()));
        }

        let mut ids = Vec::new();
        for (from, amount) in shares {
            ids.extend(self.dispatch(from, to, camp, amount));
        }
        Ok(ids)
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Runs every task due at or before `t`, then sets the clock to `t`.
    ///
    /// The clock never moves backwards; an earlier `t` is ignored.
    pub fn advance_to(&mut self, t: u64) {
        if t < self.now {
            return;
        }
        self.run_due(t);
        self.now = t;
    }

    /// Advances the clock by `dt` milliseconds.
    pub fn advance(&mut self, dt: u64) {
        self.advance_to(self.now.saturating_add(dt));
    }

    /// Restores the initial level state and starts a new round at the
    /// current time.
    ///
    /// Pending debits, arrivals, sweeps and ticks are cancelled, the flight
    /// set is emptied and the AI cooldown is cleared. Flight ids keep
    /// counting up. Observers stay subscribed.
    pub fn reset(&mut self) {
        self.timeline.clear();
        self.flights.clear();
        self.frame_timer = None;
        self.ai_timer = None;
        self.registry.restore(&self.initial);
        self.start_round(self.now);
        info!(at = self.now, level = %self.level.name, "round reset");
    }

    // =========================================================================
    // Read surface
    // =========================================================================

    /// Current time.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Start of the current round.
    #[must_use]
    pub const fn round_started_at(&self) -> u64 {
        self.round_started_at
    }

    /// Round result from the player's side.
    #[must_use]
    pub const fn result(&self) -> GameResult {
        self.result
    }

    /// Camp holding the board once the round is over.
    #[must_use]
    pub const fn winner(&self) -> Option<Camp> {
        self.winner
    }

    /// Seed of the AI jitter stream.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Node states.
    #[must_use]
    pub const fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Level the engine was built from.
    #[must_use]
    pub const fn level(&self) -> &LevelDef {
        &self.level
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Active flight units, pending and airborne.
    #[must_use]
    pub const fn flights(&self) -> &FlightSet {
        &self.flights
    }

    /// Number of active flight units, pending and airborne.
    #[must_use]
    pub fn pending_flights(&self) -> usize {
        self.flights.len()
    }

    /// Time of the next scheduled task, if any.
    #[must_use]
    pub fn next_task_at(&self) -> Option<u64> {
        self.timeline.next_at()
    }

    /// `{id, owner, value}` of every node in id order.
    #[must_use]
    pub fn node_snapshot(&self) -> Vec<NodeView> {
        self.registry.views()
    }

    /// Render positions of airborne units at `now`.
    ///
    /// Only units that have departed by the engine clock are airborne; call
    /// [`Engine::advance_to`] first when rendering ahead of the clock.
    #[must_use]
    pub fn active_flight_units(&self, now: u64) -> Vec<FlightView> {
        self.flights
            .airborne_views(&self.registry, now, &self.config.formation)
    }

    // =========================================================================
    // Task execution
    // =========================================================================

    fn start_round(&mut self, at: u64) {
        self.round_started_at = at;
        self.result = GameResult::Playing;
        self.winner = None;
        self.planner.reset(at);
        if self.growth.enabled() {
            self.schedule_growth(at);
        }
        self.schedule_ai(at);
    }

    // Periodic tasks stop at the end of the clock range instead of wrapping.
    fn schedule_growth(&mut self, from: u64) {
        if let Some(at) = from.checked_add(self.growth.tick_ms()) {
            self.timeline.schedule(at, Phase::Growth, Task::GrowthTick);
        }
    }

    fn schedule_ai(&mut self, from: u64) {
        if !self.planner.is_active() {
            return;
        }
        let Some(at) = from.checked_add(self.planner.interval_ms().max(1)) else {
            return;
        };
        self.ai_timer = Some(self.timeline.schedule(at, Phase::AiDecision, Task::AiTick));
    }

    fn run_due(&mut self, until: u64) {
        while let Some((at, task)) = self.timeline.pop_due(until) {
            self.now = self.now.max(at);
            self.run_task(task, at);
            self.check_victory(at);
        }
    }

    fn run_task(&mut self, task: Task, at: u64) {
        match task {
            Task::Depart(id) => self.depart(id, at),
            Task::Frame => self.sweep(at),
            Task::Arrive(id) => self.arrive(id, at),
            Task::GrowthTick => {
                self.growth.tick(&mut self.registry);
                self.schedule_growth(at);
            }
            Task::AiTick => {
                let ctx = PlannerContext {
                    now: at,
                    round_started_at: self.round_started_at,
                };
                if let Some(intent) = self.planner.decide(&ctx, &self.registry) {
                    self.accept(&intent, at);
                }
                self.schedule_ai(at);
            }
        }
    }

    fn accept(&mut self, intent: &DispatchIntent, at: u64) -> Vec<FlightId> {
        if self.result.is_terminal() {
            return Vec::new();
        }
        let Some(amount) = intent.whole_amount() else {
            return Vec::new();
        };
        if !self.registry.contains(intent.from) || !self.registry.contains(intent.to) {
            warn!(from = %intent.from, to = %intent.to, "dispatch between unknown nodes");
            return Vec::new();
        }

        let cohort = self.scheduler.plan(intent, at);
        let mut ids = Vec::with_capacity(cohort.len());
        for mut unit in cohort {
            let id = unit.id();
            unit.depart_timer =
                Some(self.timeline.schedule(unit.departure_at(), Phase::Debit, Task::Depart(id)));
            unit.arrive_timer =
                Some(self.timeline.schedule(unit.arrival_at(), Phase::Arrival, Task::Arrive(id)));
            self.flights.insert(unit);
            ids.push(id);
        }

        debug!(
            from = %intent.from,
            to = %intent.to,
            owner = %intent.owner,
            amount,
            at,
            "dispatch accepted"
        );
        self.emit(&Event::Dispatched {
            from: intent.from,
            to: intent.to,
            owner: intent.owner,
            amount,
            at,
        });
        ids
    }

    fn depart(&mut self, id: FlightId, at: u64) {
        let Some(unit) = self.flights.get_mut(id) else {
            return;
        };
        unit.depart_timer = None;
        unit.set_state(FlightState::InFlight);
        let from = unit.from();

        self.registry.apply_delta(from, -1.0);
        self.emit(&Event::Departed {
            flight: id,
            from,
            at,
        });
        self.ensure_frame(at);
    }

    fn arrive(&mut self, id: FlightId, at: u64) {
        let Some(unit) = self.flights.remove(id) else {
            return;
        };
        let owner = unit.owner();
        let target = unit.to();
        let outcome = self.combat.resolve_hit(&mut self.registry, owner, target);

        self.emit(&Event::Arrived {
            flight: id,
            owner,
            target,
            outcome,
            at,
        });
        if let HitOutcome::Captured { previous_owner, .. } = outcome {
            self.emit(&Event::Captured {
                node: target,
                previous_owner,
                new_owner: owner,
                at,
            });
        }
    }

    fn sweep(&mut self, at: u64) {
        self.frame_timer = None;
        let since = at.saturating_sub(self.config.timing.frame_ms);
        let pairs = self
            .flights
            .detect_collisions(&self.registry, since, at, &self.config.formation);

        for (first, second) in pairs {
            let position = match (self.unit_position(first, at), self.unit_position(second, at)) {
                (Some(a), Some(b)) => a.lerp(b, 0.5),
                (Some(p), None) | (None, Some(p)) => p,
                (None, None) => Vec2::ZERO,
            };
            for id in [first, second] {
                // the arrival timer goes with the unit, so it can never resolve
                if let Some(unit) = self.flights.remove(id) {
                    if let Some(timer) = unit.arrive_timer {
                        self.timeline.cancel(timer);
                    }
                }
            }
            debug!(%first, %second, x = position.x, y = position.y, at, "collision");
            self.emit(&Event::Collided {
                first,
                second,
                position,
                at,
            });
        }

        if self.flights.in_flight_count() > 0 {
            if let Some(next) = at.checked_add(self.config.timing.frame_ms) {
                self.ensure_frame(next);
            }
        }
    }

    fn ensure_frame(&mut self, at: u64) {
        if self
            .frame_timer
            .is_some_and(|timer| self.timeline.is_pending(timer))
        {
            return;
        }
        self.frame_timer = Some(self.timeline.schedule(at, Phase::Frame, Task::Frame));
    }

    fn unit_position(&self, id: FlightId, at: u64) -> Option<Vec2> {
        let unit = self.flights.get(id)?;
        let from = self.registry.get(unit.from())?.position();
        let to = self.registry.get(unit.to())?.position();
        formation::position(unit, from, to, at, &self.config.formation)
    }

    fn check_victory(&mut self, at: u64) {
        if self.result.is_terminal() {
            return;
        }
        let Some((result, winner)) = self.victory.evaluate(&self.registry) else {
            return;
        };

        self.result = result;
        self.winner = Some(winner);
        self.timeline.clear();
        self.flights.clear();
        self.frame_timer = None;
        self.ai_timer = None;

        info!(%result, %winner, at, "round finished");
        self.emit(&Event::Finished { result, winner, at });
    }

    fn emit(&self, event: &Event) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
