//! Simulation events and the recording observer.
//!
//! The engine emits an [`Event`] for every dispatch, departure, arrival,
//! collision, capture and for the end of the round. Events carry no
//! presentation data; screen shake, sounds and arrows are derived from them
//! by the frontend.
//!
//! # Usage
//!
//! [`EventLog`] records every event it sees. Drain it with `take_events()`,
//! typically once per rendered frame.

use std::sync::Mutex;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::flight::FlightId;
use crate::node::{Camp, NodeId};
use crate::victory::GameResult;

use super::{HitOutcome, Observer};

/// Something that happened in the simulation, stamped with its time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A dispatch intent was accepted.
    Dispatched {
        /// Source node.
        from: NodeId,
        /// Target node.
        to: NodeId,
        /// Sending camp.
        owner: Camp,
        /// Units in the cohort.
        amount: u32,
        /// Dispatch time.
        at: u64,
    },
    /// A unit left its source, which lost one unit of value.
    Departed {
        /// Unit.
        flight: FlightId,
        /// Source node.
        from: NodeId,
        /// Departure time.
        at: u64,
    },
    /// A unit reached its target.
    Arrived {
        /// Unit.
        flight: FlightId,
        /// Sending camp.
        owner: Camp,
        /// Target node.
        target: NodeId,
        /// Effect on the target.
        outcome: HitOutcome,
        /// Arrival time.
        at: u64,
    },
    /// Two opposing units cancelled each other.
    Collided {
        /// Lower-id unit.
        first: FlightId,
        /// Higher-id unit.
        second: FlightId,
        /// Midpoint of the two units.
        position: Vec2,
        /// Sweep time.
        at: u64,
    },
    /// A node changed hands.
    Captured {
        /// Captured node.
        node: NodeId,
        /// Owner before.
        previous_owner: Camp,
        /// Owner after.
        new_owner: Camp,
        /// Capture time.
        at: u64,
    },
    /// The round reached a terminal result.
    Finished {
        /// Result from the player's side.
        result: GameResult,
        /// Camp holding the board.
        winner: Camp,
        /// Time of the deciding mutation.
        at: u64,
    },
}

impl Event {
    /// Time the event happened.
    #[must_use]
    pub const fn at(&self) -> u64 {
        match self {
            Self::Dispatched { at, .. }
            | Self::Departed { at, .. }
            | Self::Arrived { at, .. }
            | Self::Collided { at, .. }
            | Self::Captured { at, .. }
            | Self::Finished { at, .. } => *at,
        }
    }
}

/// Observer that records events for later retrieval.
///
/// # Thread Safety
///
/// The log is behind a `Mutex` to satisfy the `Send + Sync` bound of
/// [`Observer`]; the engine itself notifies from a single thread.
///
/// # Example
///
/// ```
/// use foothold_core::resolver::{Event, EventLog, Observer};
///
/// let log = EventLog::new();
/// log.on_event(&Event::Departed {
///     flight: foothold_core::flight::FlightId::new(1),
///     from: foothold_core::node::NodeId::new(0),
///     at: 10,
/// });
///
/// assert_eq!(log.take_events().len(), 1);
/// assert!(log.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns all recorded events in emission order.
    pub fn take_events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(mut log) => std::mem::take(&mut *log),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Number of recorded events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.with_events(Vec::len)
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_events(Vec::is_empty)
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        drop(self.take_events());
    }

    fn with_events<R>(&self, f: impl FnOnce(&Vec<Event>) -> R) -> R {
        match self.events.lock() {
            Ok(log) => f(&log),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn push(&self, event: &Event) {
        match self.events.lock() {
            Ok(mut log) => log.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

impl Observer for EventLog {
    fn on_event(&self, event: &Event) {
        self.push(event);
    }
}
