//! Passive value regeneration.
//!
//! Every growth tick adds `rate_per_sec * tick_ms / 1000 * node.growth_rate`
//! to each node, where the rate and cap depend on the owner. Growth clamps at
//! the cap and never lowers a node that already sits above it.

use crate::config::GrowthConfig;
use crate::registry::NodeRegistry;

/// Applies growth ticks to a registry.
#[derive(Debug, Clone)]
pub struct GrowthEngine {
    config: GrowthConfig,
}

impl GrowthEngine {
    /// Creates a growth engine.
    #[must_use]
    pub fn new(config: GrowthConfig) -> Self {
        Self { config }
    }

    /// Tick cadence in milliseconds.
    #[must_use]
    pub fn tick_ms(&self) -> u64 {
        self.config.tick_ms
    }

    /// Returns false when growth is switched off.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Owned-node cap, shared with reinforcement.
    #[must_use]
    pub fn owned_cap(&self) -> f64 {
        self.config.owned_cap
    }

    /// Applies one tick.
    #[allow(clippy::cast_precision_loss)]
    pub fn tick(&self, registry: &mut NodeRegistry) {
        let seconds = self.config.tick_ms as f64 / 1000.0;
        let config = &self.config;
        registry.apply_growth(
            |node| {
                let (rate, cap) = config.for_owner(node.owner());
                let step = rate * seconds * node.growth_rate();
                step.min(cap - node.value())
            },
            |node| {
                let (_, cap) = config.for_owner(node.owner());
                node.value() < cap
            },
        );
    }
}
