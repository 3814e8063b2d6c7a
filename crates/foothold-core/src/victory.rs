//! Terminal-condition checks.
//!
//! A round ends when a combatant camp owns no node: its opponent wins. A
//! board held entirely by one camp is the special case where the other camp
//! owns nothing. Neutral nodes never decide a round.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::Camp;
use crate::registry::NodeRegistry;

/// Round result from the player's side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameResult {
    /// Round in progress.
    #[default]
    Playing,
    /// The player's opponent owns no node.
    Victory,
    /// The player owns no node.
    Defeat,
}

impl GameResult {
    /// Returns true for `Victory` and `Defeat`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
        }
    }
}

/// Evaluates the terminal condition for a player/AI pairing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VictoryEvaluator {
    player: Camp,
    opponent: Camp,
}

impl VictoryEvaluator {
    /// Creates an evaluator for `player` against `opponent`.
    #[must_use]
    pub const fn new(player: Camp, opponent: Camp) -> Self {
        Self { player, opponent }
    }

    /// Returns the terminal result and the winning camp, or `None` while the
    /// round is still open.
    ///
    /// If both camps own nothing the player is considered defeated.
    #[must_use]
    pub fn evaluate(&self, registry: &NodeRegistry) -> Option<(GameResult, Camp)> {
        if registry.owned_count(self.player) == 0 {
            return Some((GameResult::Defeat, self.opponent));
        }
        if registry.owned_count(self.opponent) == 0 {
            return Some((GameResult::Victory, self.player));
        }
        None
    }
}
