//! Cross-module tests for the engine.
//!
//! - `scenarios.rs`: end-to-end rounds with known outcomes
//! - `determinism.rs`: same seed and inputs give the same round
//! - `properties.rs`: invariants under random dispatch sequences
//! - `helpers.rs`: level and engine factories

mod determinism;
mod helpers;
mod properties;

pub use helpers::*;
