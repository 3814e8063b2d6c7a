//! Level and engine factories shared by the cross-module tests.

use std::sync::Arc;

use crate::config::{EngineConfig, GrowthConfig};
use crate::engine::Engine;
use crate::level::{LevelDef, NodeDef};
use crate::node::{Camp, NodeId};
use crate::resolver::{Event, EventLog};

// =============================================================================
// Levels
// =============================================================================

/// Builds a level from `(id, x, y, owner, value)` tuples.
pub fn level_from(nodes: &[(u32, f32, f32, Camp, f64)]) -> LevelDef {
    LevelDef {
        name: "test".to_string(),
        nodes: nodes
            .iter()
            .map(|&(id, x, y, owner, initial_value)| NodeDef {
                id: NodeId::new(id),
                x,
                y,
                owner,
                initial_value,
                growth_rate: None,
            })
            .collect(),
        edges: Vec::new(),
    }
}

// =============================================================================
// Engines
// =============================================================================

/// Default config with growth and the AI switched off.
pub fn quiet_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.growth = GrowthConfig {
        enabled: false,
        ..GrowthConfig::default()
    };
    config.ai.enabled = false;
    config
}

/// Default config with growth switched off and the AI on.
pub fn ai_only_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.growth.enabled = false;
    config
}

/// Builds an engine and attaches an event log.
pub fn engine_with_log(level: LevelDef, config: EngineConfig, seed: u64) -> (Engine, Arc<EventLog>) {
    let mut engine = Engine::new(level, config, seed).unwrap();
    let log = Arc::new(EventLog::new());
    engine.subscribe(log.clone());
    (engine, log)
}

/// Value of node `id`.
pub fn value_of(engine: &Engine, id: u32) -> f64 {
    engine.registry().get(NodeId::new(id)).unwrap().value()
}

/// Owner of node `id`.
pub fn owner_of(engine: &Engine, id: u32) -> Camp {
    engine.registry().get(NodeId::new(id)).unwrap().owner()
}

/// Advances until no flight unit is active, at most `limit_ms` ahead.
pub fn run_until_idle(engine: &mut Engine, limit_ms: u64) {
    let deadline = engine.now() + limit_ms;
    while engine.pending_flights() > 0 && engine.now() < deadline {
        engine.advance(engine.config().timing.frame_ms);
    }
}

// =============================================================================
// Events
// =============================================================================

/// Dispatch events sent by `camp`.
pub fn dispatches_by(events: &[Event], camp: Camp) -> Vec<Event> {
    events
        .iter()
        .filter(|event| matches!(event, Event::Dispatched { owner, .. } if *owner == camp))
        .cloned()
        .collect()
}

/// Number of events matching `predicate`.
pub fn count_events(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}
