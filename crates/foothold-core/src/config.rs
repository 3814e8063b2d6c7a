//! Engine configuration.
//!
//! Every tunable of the simulation lives here, grouped by the component that
//! reads it. All fields have defaults, so a config file only needs to name
//! what it overrides:
//!
//! ```
//! use foothold_core::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "timing": { "travel_ms": 1500 } }"#).unwrap();
//! assert_eq!(config.timing.travel_ms, 1500);
//! assert_eq!(config.timing.column_delay_ms, 220);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::node::Camp;

/// Top-level configuration for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Camp controlled by the human player. Results are reported from its side.
    pub player_camp: Camp,
    /// Dispatch and frame timing.
    pub timing: TimingConfig,
    /// Passive regeneration.
    pub growth: GrowthConfig,
    /// Arrival effects.
    pub combat: CombatConfig,
    /// Lateral offsets and collision geometry.
    pub formation: FormationConfig,
    /// Computer opponent policy.
    pub ai: AiPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            player_camp: Camp::Blue,
            timing: TimingConfig::default(),
            growth: GrowthConfig::default(),
            combat: CombatConfig::default(),
            formation: FormationConfig::default(),
            ai: AiPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the validation
    /// errors of [`EngineConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_camp.is_neutral()
            || self.ai.camp.is_neutral()
            || self.player_camp == self.ai.camp
        {
            return Err(ConfigError::Camps {
                player: self.player_camp,
                ai: self.ai.camp,
            });
        }

        positive_ms("timing.travel_ms", self.timing.travel_ms)?;
        positive_ms("timing.frame_ms", self.timing.frame_ms)?;
        positive_ms("growth.tick_ms", self.growth.tick_ms)?;
        positive_ms("ai.decision_interval_ms", self.ai.decision_interval_ms)?;
        if self.timing.column_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "timing.column_size",
                expected: "at least 1",
                value: 0.0,
            });
        }
        if self.ai.min_send == 0 {
            return Err(ConfigError::OutOfRange {
                field: "ai.min_send",
                expected: "at least 1",
                value: 0.0,
            });
        }

        non_negative("growth.owned_rate_per_sec", self.growth.owned_rate_per_sec)?;
        non_negative("growth.owned_cap", self.growth.owned_cap)?;
        non_negative("growth.neutral_rate_per_sec", self.growth.neutral_rate_per_sec)?;
        non_negative("growth.neutral_cap", self.growth.neutral_cap)?;
        non_negative("combat.support_amount", self.combat.support_amount)?;
        non_negative("combat.damage_amount", self.combat.damage_amount)?;
        non_negative("combat.capture_value", self.combat.capture_value)?;
        non_negative("formation.lane_spacing", f64::from(self.formation.lane_spacing))?;
        non_negative("formation.emit_spread", f64::from(self.formation.emit_spread))?;
        non_negative("formation.absorb_distance", f64::from(self.formation.absorb_distance))?;
        non_negative("formation.unit_radius", f64::from(self.formation.unit_radius))?;
        non_negative("ai.jitter_max", self.ai.jitter_max)?;
        non_negative("ai.threat_radius", self.ai.threat_radius)?;
        ratio("ai.neutral_send_ratio", self.ai.neutral_send_ratio)?;
        ratio("ai.enemy_send_ratio", self.ai.enemy_send_ratio)?;
        Ok(())
    }
}

fn positive_ms(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::OutOfRange {
            field,
            expected: "greater than zero",
            value: 0.0,
        });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::OutOfRange {
            field,
            expected: "finite and non-negative",
            value,
        });
    }
    Ok(())
}

fn ratio(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigError::OutOfRange {
            field,
            expected: "in (0, 1]",
            value,
        });
    }
    Ok(())
}

/// Dispatch scheduling and frame cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between consecutive columns of one cohort.
    pub column_delay_ms: u64,
    /// Travel time of every unit. Independent of distance.
    pub travel_ms: u64,
    /// Collision sweep cadence while units are airborne.
    pub frame_ms: u64,
    /// Units per column.
    pub column_size: u32,
    /// Cohorts smaller than this fly as a single column.
    pub small_cohort_threshold: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            column_delay_ms: 220,
            travel_ms: 2000,
            frame_ms: 16,
            column_size: 5,
            small_cohort_threshold: 3,
        }
    }
}

/// Passive value regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Disables regeneration entirely when false.
    pub enabled: bool,
    /// Growth tick cadence.
    pub tick_ms: u64,
    /// Regeneration of camp-owned nodes.
    pub owned_rate_per_sec: f64,
    /// Owned nodes stop growing at this value. Also caps reinforcement.
    pub owned_cap: f64,
    /// Regeneration of neutral nodes.
    pub neutral_rate_per_sec: f64,
    /// Neutral nodes stop growing at this value.
    pub neutral_cap: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_ms: 50,
            owned_rate_per_sec: 1.0,
            owned_cap: 60.0,
            neutral_rate_per_sec: 0.5,
            neutral_cap: 15.0,
        }
    }
}

impl GrowthConfig {
    /// Returns `(rate_per_sec, cap)` for nodes owned by `owner`.
    #[must_use]
    pub fn for_owner(&self, owner: Camp) -> (f64, f64) {
        if owner.is_neutral() {
            (self.neutral_rate_per_sec, self.neutral_cap)
        } else {
            (self.owned_rate_per_sec, self.owned_cap)
        }
    }
}

/// Arrival effects of a single flight unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Value added when a unit lands on a node of its own camp.
    pub support_amount: f64,
    /// Value removed when a unit lands on a foreign node.
    pub damage_amount: f64,
    /// Value a node holds right after being captured.
    pub capture_value: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            support_amount: 1.0,
            damage_amount: 1.0,
            capture_value: 1.0,
        }
    }
}

/// Formation offsets applied to flight-unit positions.
///
/// Collision detection runs on the offset positions, so these values are
/// gameplay relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Radius of one unit. Two opposing units collide within twice this.
    pub unit_radius: f32,
    /// Lateral distance between rows.
    pub lane_spacing: f32,
    /// Backward offset per row away from the column center.
    pub chevron_depth: f32,
    /// Backward offset step per column (cycles every three columns).
    pub stagger_step: f32,
    /// Distance from the source over which offsets fade in.
    pub emit_spread: f32,
    /// Distance to the target over which offsets fade out.
    pub absorb_distance: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            unit_radius: 4.0,
            lane_spacing: 7.0,
            chevron_depth: 4.0,
            stagger_step: 1.5,
            emit_spread: 36.0,
            absorb_distance: 28.0,
        }
    }
}

/// Computer opponent policy.
///
/// The opening grace period and the neutral-first rule are balance choices,
/// kept configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiPolicy {
    /// Disables the planner when false.
    pub enabled: bool,
    /// Camp the planner plays.
    pub camp: Camp,
    /// Decision cadence.
    pub decision_interval_ms: u64,
    /// Quiet period after each successful dispatch.
    pub cooldown_ms: u64,
    /// No attacks on the player during this window after round start.
    pub opening_grace_ms: u64,
    /// Sources below this whole value are not considered.
    pub min_source_value: u32,
    /// Units always left behind in the source.
    pub min_garrison: u32,
    /// Smallest cohort worth sending.
    pub min_send: u32,
    /// Score bonus for neutral targets.
    pub neutral_bonus: f64,
    /// Score bonus for player targets.
    pub enemy_bonus: f64,
    /// Weight of player strength around the target.
    pub threat_weight: f64,
    /// Penalty per unit of target value.
    pub value_weight: f64,
    /// Reward per unit of source surplus above the garrison.
    pub surplus_weight: f64,
    /// Penalty per unit of distance.
    pub distance_weight: f64,
    /// Upper bound of the uniform jitter added to each score.
    pub jitter_max: f64,
    /// Radius of the linearly decaying threat contribution.
    pub threat_radius: f64,
    /// Fraction of the source sent at neutral targets.
    pub neutral_send_ratio: f64,
    /// Fraction of the source sent at player targets.
    pub enemy_send_ratio: f64,
    /// Skip player targets while any neutral node remains.
    pub avoid_player_while_neutral_remains: bool,
}

impl Default for AiPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            camp: Camp::Red,
            decision_interval_ms: 560,
            cooldown_ms: 2600,
            opening_grace_ms: 18_000,
            min_source_value: 8,
            min_garrison: 4,
            min_send: 3,
            neutral_bonus: 160.0,
            enemy_bonus: 110.0,
            threat_weight: 0.1,
            value_weight: 1.35,
            surplus_weight: 0.42,
            distance_weight: 0.018,
            jitter_max: 6.0,
            threat_radius: 210.0,
            neutral_send_ratio: 0.58,
            enemy_send_ratio: 0.44,
            avoid_player_while_neutral_remains: true,
        }
    }
}
