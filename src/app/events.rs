//! Outbound application events.
//!
//! The dispense worker and the reconnect supervisor emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them (serial log today).

use super::connectivity::ConnectivityEvent;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The worker dequeued a request and is about to drive the actuator.
    DispenseStarted { count: u8 },

    /// All units of a request were driven.  Open loop: this says nothing
    /// about whether anything actually came out.
    DispenseCompleted { count: u8, elapsed_ms: u64 },

    /// The network link changed state or a retry happened.
    Link(ConnectivityEvent),
}
