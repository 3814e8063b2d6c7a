//! Error types.
//!
//! The simulation itself has no recoverable failures: invalid dispatch
//! intents are ignored and unknown node ids are logged no-ops. Errors exist
//! only at the edges where data or player input enters the core.

use thiserror::Error;

use crate::node::{Camp, NodeId};

/// Failure to load or validate a level definition.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level JSON could not be parsed.
    #[error("failed to parse level: {0}")]
    Parse(#[from] serde_json::Error),
    /// Fewer than two nodes were defined.
    #[error("level must define at least two nodes, found {0}")]
    TooFewNodes(usize),
    /// Two nodes share an id.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
    /// A node has a negative or non-finite initial value.
    #[error("node {id} has invalid initial value {value}")]
    InvalidValue {
        /// Offending node.
        id: NodeId,
        /// Offending value.
        value: f64,
    },
    /// A node has a non-finite coordinate.
    #[error("node {id} has invalid position ({x}, {y})")]
    InvalidPosition {
        /// Offending node.
        id: NodeId,
        /// Horizontal coordinate.
        x: f32,
        /// Vertical coordinate.
        y: f32,
    },
    /// A node has a non-positive or non-finite growth multiplier.
    #[error("node {id} has invalid growth rate {rate}")]
    InvalidGrowthRate {
        /// Offending node.
        id: NodeId,
        /// Offending multiplier.
        rate: f64,
    },
    /// An edge references a node that does not exist.
    #[error("edge {from}-{to} references an unknown node")]
    UnknownEdgeNode {
        /// Edge start.
        from: NodeId,
        /// Edge end.
        to: NodeId,
    },
    /// An edge connects a node to itself.
    #[error("edge {0}-{0} is a self loop")]
    SelfLoop(NodeId),
    /// A combatant camp starts without any node.
    #[error("camp {0} owns no node at round start")]
    CampWithoutNodes(Camp),
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config JSON could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A numeric field is out of range.
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        /// Dotted field path.
        field: &'static str,
        /// Human readable constraint.
        expected: &'static str,
        /// Offending value.
        value: f64,
    },
    /// The player and the AI were given the same camp, or a neutral one.
    #[error("player camp {player} and ai camp {ai} must be distinct combatants")]
    Camps {
        /// Configured player camp.
        player: Camp,
        /// Configured AI camp.
        ai: Camp,
    },
}

/// Failure to build an [`Engine`](crate::engine::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The level is malformed or unusable for the configured camps.
    #[error(transparent)]
    Level(#[from] LevelError),
    /// The configuration is out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Rejected player order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    /// The round is over.
    #[error("the round has already finished")]
    Finished,
    /// No source node was selected.
    #[error("no source node selected")]
    NoSources,
    /// The send ratio is outside `(0, 1]`.
    #[error("send ratio {0} is outside (0, 1]")]
    InvalidRatio(f64),
    /// A referenced node does not exist.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// A source node is not owned by the ordering camp.
    #[error("node {node} is owned by {owner}, not {camp}")]
    NotOwned {
        /// Source node.
        node: NodeId,
        /// Its current owner.
        owner: Camp,
        /// The ordering camp.
        camp: Camp,
    },
    /// A source node is also the target.
    #[error("node {0} cannot send to itself")]
    SelfTarget(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_error_messages_name_the_node() {
        let err = LevelError::DuplicateNode(NodeId::new(4));
        assert_eq!(err.to_string(), "duplicate node id 4");

        let err = LevelError::CampWithoutNodes(Camp::Red);
        assert_eq!(err.to_string(), "camp red owns no node at round start");
    }

    #[test]
    fn parse_errors_convert() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: LevelError = parse.into();
        assert!(matches!(err, LevelError::Parse(_)));
    }

    #[test]
    fn order_error_messages() {
        let err = OrderError::NotOwned {
            node: NodeId::new(2),
            owner: Camp::Red,
            camp: Camp::Blue,
        };
        assert_eq!(err.to_string(), "node 2 is owned by red, not blue");
    }

    #[test]
    fn engine_error_is_transparent() {
        let err: EngineError = LevelError::TooFewNodes(1).into();
        assert_eq!(err.to_string(), "level must define at least two nodes, found 1");
        assert!(matches!(err, EngineError::Level(LevelError::TooFewNodes(1))));
    }
}
