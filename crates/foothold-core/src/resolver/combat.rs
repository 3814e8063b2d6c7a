//! Arrival resolution for flight units.
//!
//! The `CombatResolver` applies the single combat rule used for every
//! arriving unit, whichever camp sent it:
//!
//! - Same owner: the target gains `support_amount`, capped at the owned cap.
//! - Different owner: the target loses `damage_amount`. If the result is
//!   still positive it is applied; otherwise the target is captured and
//!   holds `capture_value`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CombatConfig;
use crate::node::{Camp, NodeId};
use crate::registry::NodeRegistry;

/// Effect of one arrival on its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitOutcome {
    /// Same-owner arrival.
    Reinforced {
        /// Target value afterwards.
        value: f64,
    },
    /// Hostile arrival that left the target standing.
    Damaged {
        /// Target value afterwards.
        value: f64,
    },
    /// Hostile arrival that took the target.
    Captured {
        /// Owner before the capture.
        previous_owner: Camp,
        /// Target value afterwards.
        value: f64,
    },
    /// Target id does not exist; nothing changed.
    Missing,
}

impl HitOutcome {
    /// Returns true if ownership changed.
    #[must_use]
    pub const fn is_capture(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }
}

/// Resolver for arrivals.
///
/// # Example
///
/// ```
/// use foothold_core::config::CombatConfig;
/// use foothold_core::node::{Camp, Node, NodeId};
/// use foothold_core::registry::NodeRegistry;
/// use foothold_core::resolver::CombatResolver;
/// use glam::Vec2;
///
/// let mut registry = NodeRegistry::new([Node::new(NodeId::new(0), Vec2::ZERO, Camp::Red, 1.0)]);
/// let resolver = CombatResolver::new(CombatConfig::default(), 60.0);
///
/// let outcome = resolver.resolve_hit(&mut registry, Camp::Blue, NodeId::new(0));
/// assert!(outcome.is_capture());
/// assert_eq!(registry.get(NodeId::new(0)).unwrap().owner(), Camp::Blue);
/// ```
#[derive(Debug, Clone)]
pub struct CombatResolver {
    config: CombatConfig,
    owned_cap: f64,
}

impl CombatResolver {
    /// Creates a resolver. `owned_cap` bounds reinforcement.
    #[must_use]
    pub fn new(config: CombatConfig, owned_cap: f64) -> Self {
        Self { config, owned_cap }
    }

    /// Resolves one unit of `attacker` landing on `target`.
    pub fn resolve_hit(
        &self,
        registry: &mut NodeRegistry,
        attacker: Camp,
        target: NodeId,
    ) -> HitOutcome {
        let Some(node) = registry.get(target) else {
            warn!(node = %target, "arrival at unknown node");
            return HitOutcome::Missing;
        };
        let owner = node.owner();
        let value = node.value();

        if owner == attacker {
            let reinforced = if value < self.owned_cap {
                (value + self.config.support_amount).min(self.owned_cap)
            } else {
                value
            };
            registry.set_value(target, reinforced);
            return HitOutcome::Reinforced { value: reinforced };
        }

        let remaining = (value - self.config.damage_amount).max(0.0);
        if remaining > 0.0 {
            registry.set_value(target, remaining);
            return HitOutcome::Damaged { value: remaining };
        }

        registry.set_owner(target, attacker, self.config.capture_value);
        info!(node = %target, from = %owner, to = %attacker, "node captured");
        HitOutcome::Captured {
            previous_owner: owner,
            value: self.config.capture_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use glam::Vec2;

    fn registry(owner: Camp, value: f64) -> NodeRegistry {
        NodeRegistry::new([Node::new(NodeId::new(0), Vec2::ZERO, owner, value)])
    }

    fn resolver() -> CombatResolver {
        CombatResolver::new(CombatConfig::default(), 60.0)
    }

    fn node(registry: &NodeRegistry) -> &Node {
        registry.get(NodeId::new(0)).unwrap()
    }

    mod support_tests {
        use super::*;

        #[test]
        fn same_owner_adds_support() {
            let mut registry = registry(Camp::Blue, 10.0);
            let outcome = resolver().resolve_hit(&mut registry, Camp::Blue, NodeId::new(0));
            assert_eq!(outcome, HitOutcome::Reinforced { value: 11.0 });
            assert_eq!(node(&registry).value(), 11.0);
        }

        #[test]
        fn support_is_capped() {
            let mut registry = registry(Camp::Blue, 59.5);
            resolver().resolve_hit(&mut registry, Camp::Blue, NodeId::new(0));
            assert_eq!(node(&registry).value(), 60.0);
        }

        #[test]
        fn support_never_lowers_value_above_cap() {
            let mut registry = registry(Camp::Blue, 75.0);
            resolver().resolve_hit(&mut registry, Camp::Blue, NodeId::new(0));
            assert_eq!(node(&registry).value(), 75.0);
        }
    }

    mod damage_tests {
        use super::*;

        #[test]
        fn hostile_arrival_damages() {
            let mut registry = registry(Camp::Red, 25.0);
            let outcome = resolver().resolve_hit(&mut registry, Camp::Blue, NodeId::new(0));
            assert_eq!(outcome, HitOutcome::Damaged { value: 24.0 });
            assert_eq!(node(&registry).owner(), Camp::Red);
        }

        #[test]
        fn value_one_is_captured() {
            let mut registry = registry(Camp::Red, 1.0);
            let outcome = resolver().resolve_hit(&mut registry, Camp::Blue, NodeId::new(0));
            assert_eq!(
                outcome,
                HitOutcome::Captured {
                    previous_owner: Camp::Red,
                    value: 1.0
                }
            );
            assert_eq!(node(&registry).owner(), Camp::Blue);
            assert_eq!(node(&registry).value(), 1.0);
        }

        #[test]
        fn fractional_value_below_damage_is_captured() {
            let mut registry = registry(Camp::Neutral, 0.4);
            let outcome = resolver().resolve_hit(&mut registry, Camp::Red, NodeId::new(0));
            assert!(outcome.is_capture());
            assert_eq!(node(&registry).owner(), Camp::Red);
        }

        #[test]
        fn empty_node_is_captured() {
            let mut registry = registry(Camp::Neutral, 0.0);
            resolver().resolve_hit(&mut registry, Camp::Blue, NodeId::new(0));
            assert_eq!(node(&registry).owner(), Camp::Blue);
        }

        #[test]
        fn capture_value_is_configurable() {
            let config = CombatConfig {
                capture_value: 3.0,
                ..CombatConfig::default()
            };
            let mut registry = registry(Camp::Red, 1.0);
            CombatResolver::new(config, 60.0).resolve_hit(
                &mut registry,
                Camp::Blue,
                NodeId::new(0),
            );
            assert_eq!(node(&registry).value(), 3.0);
        }
    }

    mod missing_target_tests {
        use super::*;

        #[test]
        fn unknown_target_is_noop() {
            let mut registry = registry(Camp::Red, 5.0);
            let before = registry.clone();
            let outcome = resolver().resolve_hit(&mut registry, Camp::Blue, NodeId::new(9));
            assert_eq!(outcome, HitOutcome::Missing);
            assert_eq!(registry, before);
        }
    }
}
