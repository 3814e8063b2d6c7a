//! # Foothold Core
//!
//! Real-time territory conquest simulation for Foothold.
//!
//! Two camps and a neutral pool hold nodes of a fixed graph. Troops leave a
//! node one unit at a time, fly along straight paths in chevron formations,
//! cancel out against opposing units they meet and resolve against their
//! target on arrival. A camp that loses its last node loses the round.
//!
//! ## Architecture
//!
//! - **Registry**: authoritative node set ([`registry`])
//! - **Timeline**: cancellable tasks keyed by absolute time ([`timeline`])
//! - **Dispatch**: intents become cohorts of flight units ([`dispatch`])
//! - **Flights**: unit lifecycle, formation offsets, collision sweep
//!   ([`flight`], [`formation`])
//! - **Resolvers**: arrival effects and observer events ([`resolver`])
//! - **Growth, victory, AI**: [`growth`], [`victory`], [`ai`]
//!
//! [`engine::Engine`] is the single writer that ties them together.
//!
//! ## Usage
//!
//! ```
//! use foothold_core::{Engine, EngineConfig, GameResult, LevelDef, NodeId};
//!
//! let mut engine = Engine::new(LevelDef::test_panel()?, EngineConfig::default(), 7)?;
//!
//! engine.order(&[NodeId::new(0)], NodeId::new(1), 0.5).unwrap();
//! engine.advance(3_000);
//!
//! assert_eq!(engine.result(), GameResult::Playing);
//! # Ok::<(), foothold_core::EngineError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ai;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod flight;
pub mod formation;
pub mod growth;
pub mod level;
pub mod node;
pub mod registry;
pub mod resolver;
pub mod timeline;
pub mod victory;

#[cfg(test)]
mod tests;

pub use ai::{AiPlanner, Planner, PlannerContext};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ConfigError, EngineError, LevelError, OrderError};
pub use flight::{FlightId, FlightView};
pub use level::LevelDef;
pub use node::{Camp, NodeId, NodeView};
pub use resolver::{Event, EventLog, Observer};
pub use victory::GameResult;
