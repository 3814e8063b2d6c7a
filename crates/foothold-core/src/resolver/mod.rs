//! Resolution of flight outcomes and the observer seam.
//!
//! # Available pieces
//!
//! - [`CombatResolver`]: the single arrival rule (support, damage, capture)
//! - [`Event`]: what the engine reports after each state change
//! - [`Observer`]: subscriber interface for the presentation layer
//! - [`EventLog`]: observer that records events for polling frontends
//!
//! # Invariants
//!
//! - Arrival effects go through [`CombatResolver::resolve_hit`] whether the
//!   unit was sent by the player or the AI
//! - Observers are notified after the mutation they describe has been applied
//! - Observers cannot mutate simulation state

mod combat;
mod event;

pub use combat::{CombatResolver, HitOutcome};
pub use event::{Event, EventLog};

/// Subscriber to simulation events.
///
/// Every event reaches [`Observer::on_event`], which by default routes it to
/// the matching typed hook. Implement `on_event` to see everything, or only
/// the hooks you care about.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use foothold_core::resolver::{Event, Observer};
///
/// #[derive(Default)]
/// struct CaptureCounter(AtomicUsize);
///
/// impl Observer for CaptureCounter {
///     fn on_capture(&self, _event: &Event) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait Observer: Send + Sync {
    /// Receives every event.
    fn on_event(&self, event: &Event) {
        match event {
            Event::Dispatched { .. } => self.on_dispatch(event),
            Event::Departed { .. } => self.on_depart(event),
            Event::Arrived { .. } => self.on_arrival(event),
            Event::Collided { .. } => self.on_collision(event),
            Event::Captured { .. } => self.on_capture(event),
            Event::Finished { .. } => self.on_finish(event),
        }
    }

    /// A dispatch was accepted.
    fn on_dispatch(&self, _event: &Event) {}

    /// A unit departed.
    fn on_depart(&self, _event: &Event) {}

    /// A unit arrived.
    fn on_arrival(&self, _event: &Event) {}

    /// Two units collided.
    fn on_collision(&self, _event: &Event) {}

    /// A node was captured.
    fn on_capture(&self, _event: &Event) {}

    /// The round finished.
    fn on_finish(&self, _event: &Event) {}
}
