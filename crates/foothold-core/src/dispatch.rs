//! Dispatch scheduling.
//!
//! Turns a "send N units from A to B" intent into a cohort of flight units
//! with deterministic departure times. Units are queued in columns; column
//! `c` departs `c * column_delay_ms` after the dispatch, and every unit
//! travels for the same fixed duration regardless of distance.
//!
//! The scheduler only plans. The engine registers one debit timer and one
//! arrival timer per unit and debits the source by exactly one as each unit
//! departs.
//!
//! # Preconditions
//!
//! The caller has already checked ownership and clamped the amount to what
//! the source holds. The scheduler floors the amount and creates exactly
//! that many units; non-positive amounts and `from == to` produce an empty
//! cohort.

use serde::{Deserialize, Serialize};

use crate::config::{FormationConfig, TimingConfig};
use crate::flight::{FlightId, FlightUnit};
use crate::formation::Slot;
use crate::node::{Camp, NodeId};

/// A request to move troops, consumed immediately.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchIntent {
    /// Source node.
    pub from: NodeId,
    /// Target node.
    pub to: NodeId,
    /// Sending camp.
    pub owner: Camp,
    /// Requested units; floored before use.
    pub amount: f64,
}

impl DispatchIntent {
    /// Returns the whole unit count this intent asks for, or `None` if the
    /// intent is invalid and must be ignored.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn whole_amount(&self) -> Option<u32> {
        if self.from == self.to || !self.amount.is_finite() {
            return None;
        }
        let amount = self.amount.floor();
        if amount < 1.0 {
            return None;
        }
        Some(amount.min(f64::from(u32::MAX)) as u32)
    }
}

/// Plans cohorts of flight units.
#[derive(Debug, Clone)]
pub struct DispatchScheduler {
    timing: TimingConfig,
    formation: FormationConfig,
    next_id: u64,
}

impl DispatchScheduler {
    /// Creates a scheduler whose first unit gets id 0.
    #[must_use]
    pub fn new(timing: TimingConfig, formation: FormationConfig) -> Self {
        Self {
            timing,
            formation,
            next_id: 0,
        }
    }

    /// Plans the cohort for `intent` dispatched at `now`.
    ///
    /// Units are returned in departure order (column ascending, then row).
    #[must_use]
    pub fn plan(&mut self, intent: &DispatchIntent, now: u64) -> Vec<FlightUnit> {
        let Some(amount) = intent.whole_amount() else {
            return Vec::new();
        };

        (0..amount)
            .map(|index| {
                let slot = Slot::for_index(
                    index,
                    amount,
                    self.timing.column_size,
                    self.timing.small_cohort_threshold,
                    &self.formation,
                );
                let delay = u64::from(slot.col).saturating_mul(self.timing.column_delay_ms);
                let departure_at = now.saturating_add(delay);
                let id = FlightId::new(self.next_id);
                self.next_id += 1;
                FlightUnit::new(
                    id,
                    intent.from,
                    intent.to,
                    intent.owner,
                    departure_at,
                    self.timing.travel_ms,
                    slot,
                )
            })
            .collect()
    }
}
