//! Static level definitions.
//!
//! A level is a list of nodes with positions, initial owners and values,
//! plus cosmetic edges. Edges are adjacency hints for rendering only: any
//! owned node may dispatch to any other node.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;
use crate::node::{Camp, Node, NodeId};

/// Built-in four-node level.
pub const TEST_PANEL_JSON: &str = include_str!("../data/test_panel.json");

/// One node as written in level data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique id.
    pub id: NodeId,
    /// Center x.
    pub x: f32,
    /// Center y.
    pub y: f32,
    /// Initial owner.
    pub owner: Camp,
    /// Initial troop value.
    pub initial_value: f64,
    /// Optional growth multiplier, 1 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
}

impl NodeDef {
    /// Builds the runtime node.
    #[must_use]
    pub fn to_node(&self) -> Node {
        Node::new(
            self.id,
            Vec2::new(self.x, self.y),
            self.owner,
            self.initial_value,
        )
        .with_growth_rate(self.growth_rate.unwrap_or(1.0))
    }
}

/// A complete level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Node set, fixed for the session.
    pub nodes: Vec<NodeDef>,
    /// Cosmetic adjacency.
    #[serde(default)]
    pub edges: Vec<(NodeId, NodeId)>,
}

impl LevelDef {
    /// Parses a level from JSON. Call [`LevelDef::validate`] before use.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Parse`] for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the built-in four-node level: one node per camp and two
    /// neutral nodes between them.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Parse`] if the embedded data is malformed.
    pub fn test_panel() -> Result<Self, LevelError> {
        Self::from_json_str(TEST_PANEL_JSON)
    }

    /// Checks the level for use with the given combatant camps.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn validate(&self, player: Camp, ai: Camp) -> Result<(), LevelError> {
        if self.nodes.len() < 2 {
            return Err(LevelError::TooFewNodes(self.nodes.len()));
        }

        let mut ids = BTreeSet::new();
        for def in &self.nodes {
            if !ids.insert(def.id) {
                return Err(LevelError::DuplicateNode(def.id));
            }
            if !def.x.is_finite() || !def.y.is_finite() {
                return Err(LevelError::InvalidPosition {
                    id: def.id,
                    x: def.x,
                    y: def.y,
                });
            }
            if !def.initial_value.is_finite() || def.initial_value < 0.0 {
                return Err(LevelError::InvalidValue {
                    id: def.id,
                    value: def.initial_value,
                });
            }
            if let Some(rate) = def.growth_rate {
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(LevelError::InvalidGrowthRate { id: def.id, rate });
                }
            }
        }

        for &(from, to) in &self.edges {
            if from == to {
                return Err(LevelError::SelfLoop(from));
            }
            if !ids.contains(&from) || !ids.contains(&to) {
                return Err(LevelError::UnknownEdgeNode { from, to });
            }
        }

        for camp in [player, ai] {
            if !self.nodes.iter().any(|def| def.owner == camp) {
                return Err(LevelError::CampWithoutNodes(camp));
            }
        }
        Ok(())
    }

    /// Returns the initial runtime nodes.
    #[must_use]
    pub fn build_nodes(&self) -> Vec<Node> {
        self.nodes.iter().map(NodeDef::to_node).collect()
    }
}
