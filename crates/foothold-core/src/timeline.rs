//! Cancellable deferred tasks keyed by absolute time.
//!
//! All waiting in the simulation is expressed as tasks scheduled on a
//! [`Timeline`]: unit debits, unit arrivals, collision sweeps, growth ticks
//! and AI decisions. Tasks due at the same instant run in [`Phase`] order,
//! then in scheduling order, so debits always land before collision sweeps
//! and collision sweeps before arrivals.
//!
//! # Example
//!
//! ```
//! use foothold_core::timeline::{Phase, Task, Timeline};
//!
//! let mut timeline = Timeline::new();
//! let late = timeline.schedule(100, Phase::Growth, Task::GrowthTick);
//! timeline.schedule(100, Phase::Frame, Task::Frame);
//! timeline.cancel(late);
//!
//! assert_eq!(timeline.pop_due(100), Some((100, Task::Frame)));
//! assert_eq!(timeline.pop_due(100), None);
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::flight::FlightId;

/// Ordering of tasks that share an instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Source debits of departing units.
    Debit,
    /// Collision sweep over airborne units.
    Frame,
    /// Arrival resolution.
    Arrival,
    /// Passive regeneration.
    Growth,
    /// Computer opponent decision.
    AiDecision,
}

/// Work performed when a timer fires.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    /// Unit leaves its source, debiting it by one.
    Depart(FlightId),
    /// Unit reaches its target.
    Arrive(FlightId),
    /// Collision sweep.
    Frame,
    /// Growth tick.
    GrowthTick,
    /// AI decision tick.
    AiTick,
}

/// Handle returned by [`Timeline::schedule`], used to cancel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TimerKey {
    at: u64,
    phase: Phase,
    seq: u64,
}

/// Time-ordered queue of cancellable tasks.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    queue: BTreeMap<TimerKey, Task>,
    index: HashMap<TimerId, TimerKey>,
    next_seq: u64,
}

impl Timeline {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` at absolute time `at`.
    pub fn schedule(&mut self, at: u64, phase: Phase, task: Task) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let key = TimerKey { at, phase, seq };
        let id = TimerId(seq);
        self.queue.insert(key, task);
        self.index.insert(id, key);
        id
    }

    /// Cancels a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.index.remove(&id) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Returns true if the task behind `id` has not run or been cancelled.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.index.contains_key(&id)
    }

    /// Removes and returns the earliest task due at or before `until`.
    pub fn pop_due(&mut self, until: u64) -> Option<(u64, Task)> {
        let (&key, _) = self.queue.first_key_value()?;
        if key.at > until {
            return None;
        }
        let task = self.queue.remove(&key)?;
        self.index.remove(&TimerId(key.seq));
        Some((key.at, task))
    }

    /// Time of the earliest pending task.
    #[must_use]
    pub fn next_at(&self) -> Option<u64> {
        self.queue.first_key_value().map(|(key, _)| key.at)
    }

    /// Cancels everything.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.index.clear();
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod ordering_tests {
        use super::*;

        #[test]
        fn earlier_time_first() {
            let mut timeline = Timeline::new();
            timeline.schedule(200, Phase::Debit, Task::Frame);
            timeline.schedule(100, Phase::AiDecision, Task::AiTick);

            assert_eq!(timeline.pop_due(1000), Some((100, Task::AiTick)));
            assert_eq!(timeline.pop_due(1000), Some((200, Task::Frame)));
        }

        #[test]
        fn same_instant_runs_in_phase_order() {
            let mut timeline = Timeline::new();
            let flight = FlightId::new(1);
            timeline.schedule(50, Phase::Arrival, Task::Arrive(flight));
            timeline.schedule(50, Phase::Frame, Task::Frame);
            timeline.schedule(50, Phase::Debit, Task::Depart(flight));

            assert_eq!(timeline.pop_due(50), Some((50, Task::Depart(flight))));
            assert_eq!(timeline.pop_due(50), Some((50, Task::Frame)));
            assert_eq!(timeline.pop_due(50), Some((50, Task::Arrive(flight))));
        }

        #[test]
        fn same_phase_runs_in_schedule_order() {
            let mut timeline = Timeline::new();
            timeline.schedule(10, Phase::Arrival, Task::Arrive(FlightId::new(7)));
            timeline.schedule(10, Phase::Arrival, Task::Arrive(FlightId::new(3)));

            assert_eq!(
                timeline.pop_due(10),
                Some((10, Task::Arrive(FlightId::new(7))))
            );
        }

        #[test]
        fn nothing_due_before_time() {
            let mut timeline = Timeline::new();
            timeline.schedule(10, Phase::Growth, Task::GrowthTick);
            assert_eq!(timeline.pop_due(9), None);
            assert_eq!(timeline.next_at(), Some(10));
        }
    }

    mod cancellation_tests {
        use super::*;

        #[test]
        fn cancelled_task_never_fires() {
            let mut timeline = Timeline::new();
            let id = timeline.schedule(10, Phase::Arrival, Task::Arrive(FlightId::new(1)));
            assert!(timeline.is_pending(id));
            assert!(timeline.cancel(id));
            assert!(!timeline.is_pending(id));
            assert_eq!(timeline.pop_due(100), None);
        }

        #[test]
        fn cancel_is_idempotent() {
            let mut timeline = Timeline::new();
            let id = timeline.schedule(10, Phase::Growth, Task::GrowthTick);
            assert!(timeline.cancel(id));
            assert!(!timeline.cancel(id));
        }

        #[test]
        fn cancel_after_fire_is_false() {
            let mut timeline = Timeline::new();
            let id = timeline.schedule(10, Phase::Growth, Task::GrowthTick);
            timeline.pop_due(10);
            assert!(!timeline.cancel(id));
        }

        #[test]
        fn clear_drops_everything() {
            let mut timeline = Timeline::new();
            timeline.schedule(10, Phase::Growth, Task::GrowthTick);
            timeline.schedule(20, Phase::Frame, Task::Frame);
            timeline.clear();
            assert!(timeline.is_empty());
            assert_eq!(timeline.len(), 0);
        }
    }
}
