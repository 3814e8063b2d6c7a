//! Computer opponent.
//!
//! The [`Planner`] trait is the seam the engine drives on every decision
//! tick. [`AiPlanner`] is the stock implementation: a greedy heuristic that
//! scores every `(source, target)` pair and sends one cohort along the best
//! feasible pair, then waits out a cooldown.
//!
//! # Scoring
//!
//! ```text
//! score = bonus(target owner)
//!       + threat_weight   * threat(target)
//!       - value_weight    * target.value
//!       + surplus_weight  * (source.value - min_garrison)
//!       - distance_weight * distance(source, target)
//!       + jitter in [0, jitter_max)
//! ```
//!
//! `threat(target)` sums, over player nodes, the player node's value scaled
//! by `1 - d / threat_radius` (zero beyond the radius). The jitter makes
//! target choice stochastic; it comes from a seeded `ChaCha8Rng`, so a given
//! seed always reproduces the same choices.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::AiPolicy;
use crate::dispatch::DispatchIntent;
use crate::node::{Camp, Node, NodeId};
use crate::registry::NodeRegistry;

/// Clock readings handed to a planner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlannerContext {
    /// Current time.
    pub now: u64,
    /// Start of the current round.
    pub round_started_at: u64,
}

impl PlannerContext {
    /// Time elapsed since the round started.
    #[must_use]
    pub const fn elapsed(&self) -> u64 {
        self.now.saturating_sub(self.round_started_at)
    }
}

/// Decision maker for a computer-controlled camp.
pub trait Planner: Send + Sync {
    /// Camp this planner plays.
    fn camp(&self) -> Camp;

    /// Decision cadence in milliseconds.
    fn interval_ms(&self) -> u64;

    /// Whether the planner wants decision ticks at all.
    fn is_active(&self) -> bool {
        true
    }

    /// Returns at most one dispatch for this decision tick.
    fn decide(&mut self, ctx: &PlannerContext, registry: &NodeRegistry) -> Option<DispatchIntent>;

    /// Clears cooldowns for a new round starting at `round_started_at`.
    fn reset(&mut self, round_started_at: u64);
}

/// A scored attack option.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Candidate {
    /// Source node, owned by the AI.
    pub from: NodeId,
    /// Target node, not owned by the AI.
    pub to: NodeId,
    /// Heuristic score, jitter included.
    pub score: f64,
}

/// Greedy heuristic planner.
#[derive(Debug, Clone)]
pub struct AiPlanner {
    policy: AiPolicy,
    player: Camp,
    seed: u64,
    rng: ChaCha8Rng,
    next_action_at: u64,
}

impl AiPlanner {
    /// Creates a planner playing `policy.camp` against `player`.
    #[must_use]
    pub fn new(policy: AiPolicy, player: Camp, seed: u64) -> Self {
        Self {
            policy,
            player,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_action_at: 0,
        }
    }

    /// Earliest time of the next allowed dispatch.
    #[must_use]
    pub const fn next_action_at(&self) -> u64 {
        self.next_action_at
    }

    /// Enumerates eligible `(source, target)` pairs in id order.
    ///
    /// Sources are AI nodes holding at least `min_source_value` whole units.
    /// Player nodes are excluded as targets during the opening grace period
    /// and, when the policy asks for it, while any neutral node remains.
    #[must_use]
    pub fn candidate_pairs(
        &self,
        ctx: &PlannerContext,
        registry: &NodeRegistry,
    ) -> Vec<(NodeId, NodeId)> {
        let camp = self.policy.camp;
        let in_grace = ctx.elapsed() < self.policy.opening_grace_ms;
        let neutral_remains = registry.iter().any(|node| node.owner().is_neutral());
        let spare_player =
            in_grace || (self.policy.avoid_player_while_neutral_remains && neutral_remains);

        let sources = registry
            .iter()
            .filter(|node| node.owner() == camp && node.whole_value() >= self.policy.min_source_value);

        let mut pairs = Vec::new();
        for source in sources {
            for target in registry.iter() {
                if target.id() == source.id() || target.owner() == camp {
                    continue;
                }
                if spare_player && target.owner() == self.player {
                    continue;
                }
                pairs.push((source.id(), target.id()));
            }
        }
        pairs
    }

    /// Heuristic score of a pair, without jitter.
    #[must_use]
    pub fn base_score(&self, registry: &NodeRegistry, source: &Node, target: &Node) -> f64 {
        let policy = &self.policy;
        let bonus = if target.owner().is_neutral() {
            policy.neutral_bonus
        } else {
            policy.enemy_bonus
        };
        let surplus = source.value() - f64::from(policy.min_garrison);
        let distance = f64::from(source.position().distance(target.position()));

        bonus + policy.threat_weight * self.threat(registry, target)
            - policy.value_weight * target.value()
            + policy.surplus_weight * surplus
            - policy.distance_weight * distance
    }

    /// Player strength around `target`, linearly decaying to zero at
    /// `threat_radius`.
    #[must_use]
    pub fn threat(&self, registry: &NodeRegistry, target: &Node) -> f64 {
        let radius = self.policy.threat_radius;
        if radius <= 0.0 {
            return 0.0;
        }
        registry
            .iter()
            .filter(|node| node.owner() == self.player)
            .map(|node| {
                let distance = f64::from(node.position().distance(target.position()));
                (1.0 - distance / radius).max(0.0) * node.value()
            })
            .sum()
    }

    /// Scores every candidate pair and sorts best first.
    pub fn score_candidates(
        &mut self,
        ctx: &PlannerContext,
        registry: &NodeRegistry,
    ) -> Vec<Candidate> {
        let pairs = self.candidate_pairs(ctx, registry);
        let mut scored = Vec::with_capacity(pairs.len());
        for (from, to) in pairs {
            let (Some(source), Some(target)) = (registry.get(from), registry.get(to)) else {
                continue;
            };
            let jitter = self.jitter();
            scored.push(Candidate {
                from,
                to,
                score: self.base_score(registry, source, target) + jitter,
            });
        }
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Units to send from `source` at `target`, or `None` if the source
    /// cannot spare `min_send` while keeping its garrison.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn send_amount(&self, source: &Node, target: &Node) -> Option<u32> {
        let policy = &self.policy;
        let whole = source.whole_value();
        let max_send = whole.checked_sub(policy.min_garrison)?;
        if max_send < policy.min_send {
            return None;
        }
        let ratio = if target.owner().is_neutral() {
            policy.neutral_send_ratio
        } else {
            policy.enemy_send_ratio
        };
        let wanted = (source.value() * ratio).floor().max(0.0) as u32;
        Some(wanted.clamp(policy.min_send, max_send))
    }

    fn jitter(&mut self) -> f64 {
        if self.policy.jitter_max > 0.0 {
            self.rng.gen_range(0.0..self.policy.jitter_max)
        } else {
            0.0
        }
    }
}

impl Planner for AiPlanner {
    fn camp(&self) -> Camp {
        self.policy.camp
    }

    fn interval_ms(&self) -> u64 {
        self.policy.decision_interval_ms
    }

    fn is_active(&self) -> bool {
        self.policy.enabled
    }

    fn decide(&mut self, ctx: &PlannerContext, registry: &NodeRegistry) -> Option<DispatchIntent> {
        if !self.policy.enabled || ctx.now < self.next_action_at {
            return None;
        }

        let candidates = self.score_candidates(ctx, registry);
        for candidate in candidates {
            let (Some(source), Some(target)) =
                (registry.get(candidate.from), registry.get(candidate.to))
            else {
                continue;
            };
            let Some(amount) = self.send_amount(source, target) else {
                continue;
            };

            self.next_action_at = ctx.now + self.policy.cooldown_ms;
            debug!(
                from = %candidate.from,
                to = %candidate.to,
                amount,
                score = candidate.score,
                "ai dispatch"
            );
            return Some(DispatchIntent {
                from: candidate.from,
                to: candidate.to,
                owner: self.policy.camp,
                amount: f64::from(amount),
            });
        }
        None
    }

    fn reset(&mut self, round_started_at: u64) {
        self.next_action_at = round_started_at;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}
