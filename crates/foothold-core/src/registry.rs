//! Node registry: the single mutable source of truth for node state.
//!
//! The registry provides:
//! - Node storage with deterministic iteration order (`BTreeMap`)
//! - Total mutation helpers (growth, delta, ownership change)
//! - Snapshot and restore for round resets
//!
//! # Unknown ids
//!
//! The node set is fixed for a session, so a write to an id that does not
//! exist is a programming error. Writes to unknown ids are no-ops that log a
//! warning and return `false`; they never panic and never surface to players.
//!
//! # Example
//!
//! ```
//! use foothold_core::node::{Camp, Node, NodeId};
//! use foothold_core::registry::NodeRegistry;
//! use glam::Vec2;
//!
//! let mut registry = NodeRegistry::new([
//!     Node::new(NodeId::new(0), Vec2::ZERO, Camp::Blue, 10.0),
//!     Node::new(NodeId::new(1), Vec2::new(100.0, 0.0), Camp::Red, 4.0),
//! ]);
//!
//! registry.apply_delta(NodeId::new(1), -6.0);
//! assert_eq!(registry.get(NodeId::new(1)).unwrap().value(), 0.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::node::{Camp, Node, NodeId, NodeView};

/// Frozen copy of every node, used to reset a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    nodes: Vec<Node>,
}

impl RegistrySnapshot {
    /// Returns the captured nodes in id order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Authoritative node set.
///
/// # Determinism
///
/// Nodes are stored in a `BTreeMap` keyed by [`NodeId`], so every scan
/// (growth, victory checks, AI candidate enumeration) visits nodes in the
/// same order on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRegistry {
    nodes: BTreeMap<NodeId, Node>,
}

impl NodeRegistry {
    /// Creates a registry from a node list. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|node| (node.id(), node)).collect(),
        }
    }

    /// Returns a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns true if the id exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterates nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Counts nodes owned by `camp`.
    #[must_use]
    pub fn owned_count(&self, camp: Camp) -> usize {
        self.nodes.values().filter(|node| node.owner() == camp).count()
    }

    /// Returns per-node views in id order.
    #[must_use]
    pub fn views(&self) -> Vec<NodeView> {
        self.nodes.values().map(NodeView::from).collect()
    }

    /// Adds `delta(node)` to every node matching `predicate`.
    ///
    /// Results are floored at 0. The caller is responsible for caps.
    pub fn apply_growth<D, P>(&mut self, delta: D, predicate: P)
    where
        D: Fn(&Node) -> f64,
        P: Fn(&Node) -> bool,
    {
        for node in self.nodes.values_mut() {
            if predicate(node) {
                let next = node.value() + delta(node);
                node.set_value(next);
            }
        }
    }

    /// Adds `delta` to one node's value, flooring at 0.
    ///
    /// Returns false (and logs) if the id does not exist.
    pub fn apply_delta(&mut self, id: NodeId, delta: f64) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                let next = node.value() + delta;
                node.set_value(next);
                true
            }
            None => {
                warn!(node = %id, "apply_delta on unknown node");
                false
            }
        }
    }

    /// Overwrites owner and value of one node.
    ///
    /// Returns false (and logs) if the id does not exist.
    pub fn set_owner(&mut self, id: NodeId, owner: Camp, value: f64) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.set_owner(owner);
                node.set_value(value);
                true
            }
            None => {
                warn!(node = %id, "set_owner on unknown node");
                false
            }
        }
    }

    /// Overwrites one node's value.
    ///
    /// Returns false (and logs) if the id does not exist.
    pub fn set_value(&mut self, id: NodeId, value: f64) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.set_value(value);
                true
            }
            None => {
                warn!(node = %id, "set_value on unknown node");
                false
            }
        }
    }

    /// Captures the current node set.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            nodes: self.nodes.values().cloned().collect(),
        }
    }

    /// Replaces the node set with a snapshot.
    pub fn restore(&mut self, snapshot: &RegistrySnapshot) {
        self.nodes = snapshot
            .nodes
            .iter()
            .map(|node| (node.id(), node.clone()))
            .collect();
    }
}
