//! Node types for the territory graph.
//!
//! This module provides the core identity and state types:
//! - [`NodeId`]: Unique identifier for a graph node
//! - [`Camp`]: Faction that owns a node or a flight unit
//! - [`Node`]: Position, owner and troop value of one node
//!
//! The graph topology is fixed for a session. Nodes are created from level
//! data, reset to their initial snapshot on replay, and never destroyed.
//!
//! # Example
//!
//! ```
//! use foothold_core::node::{Camp, Node, NodeId};
//! use glam::Vec2;
//!
//! let node = Node::new(NodeId::new(3), Vec2::new(120.0, 80.0), Camp::Blue, 12.0);
//!
//! assert_eq!(node.id().as_u32(), 3);
//! assert_eq!(node.owner(), Camp::Blue);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node.
///
/// `NodeId` is a newtype wrapper around `u32`. Ids come from level data and
/// are ordered by their numeric value, which gives every scan over the
/// registry a deterministic order.
///
/// # Example
///
/// ```
/// use foothold_core::node::NodeId;
///
/// let a = NodeId::new(1);
/// let b = NodeId::new(2);
///
/// assert!(a < b);
/// assert_eq!(a.as_u32(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new `NodeId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Faction identity.
///
/// Two camps fight over the graph; `Neutral` holds unclaimed nodes and never
/// dispatches. Which camp is the human player and which is the computer is
/// decided by configuration, not by the variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Camp {
    /// First combatant camp (the human player by default).
    Blue,
    /// Second combatant camp (the computer opponent by default).
    Red,
    /// Unclaimed nodes.
    Neutral,
}

impl Camp {
    /// Returns true for the neutral pool.
    #[must_use]
    pub const fn is_neutral(self) -> bool {
        matches!(self, Self::Neutral)
    }

    /// Returns the opposing combatant camp. Neutral has no opponent.
    #[must_use]
    pub const fn opponent(self) -> Option<Self> {
        match self {
            Self::Blue => Some(Self::Red),
            Self::Red => Some(Self::Blue),
            Self::Neutral => None,
        }
    }
}

impl fmt::Display for Camp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blue => write!(f, "blue"),
            Self::Red => write!(f, "red"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// A graph vertex holding a troop value.
///
/// Position and growth multiplier are static for the session. Owner and
/// value are mutated only through the [`NodeRegistry`](crate::registry::NodeRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    position: Vec2,
    owner: Camp,
    value: f64,
    growth_rate: f64,
}

impl Node {
    /// Creates a node with a growth multiplier of 1.
    ///
    /// Negative or non-finite values are stored as 0.
    #[must_use]
    pub fn new(id: NodeId, position: Vec2, owner: Camp, value: f64) -> Self {
        Self {
            id,
            position,
            owner,
            value: sanitize(value),
            growth_rate: 1.0,
        }
    }

    /// Sets the per-node growth multiplier.
    #[must_use]
    pub fn with_growth_rate(mut self, growth_rate: f64) -> Self {
        self.growth_rate = growth_rate;
        self
    }

    /// Returns the node id.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node center.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Returns the owning camp.
    #[must_use]
    pub const fn owner(&self) -> Camp {
        self.owner
    }

    /// Returns the troop value. Always `>= 0`.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Returns the whole number of units the node can send.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn whole_value(&self) -> u32 {
        self.value.floor() as u32
    }

    /// Returns the growth multiplier.
    #[must_use]
    pub const fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = sanitize(value);
    }

    pub(crate) fn set_owner(&mut self, owner: Camp) {
        self.owner = owner;
    }
}

/// Read-only per-frame view of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    /// Node id.
    pub id: NodeId,
    /// Owning camp.
    pub owner: Camp,
    /// Troop value.
    pub value: f64,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            owner: node.owner,
            value: node.value,
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
