//! Scheduler error types.
//!
//! Scheduling calls reject unrepresentable times up front. Failures raised by
//! an [`Event`](crate::Event) are never swallowed: they surface as
//! [`SchedError::EventFailed`] from the `process_*` call that ran the event.

use crate::event::{EventError, EventHandle};
use crate::time::SimTime;

/// Errors returned by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedError {
    /// The requested delay pushes the target time past `u64::MAX` ticks.
    #[error("delay of {delay} ticks from {now} overflows simulated time")]
    TimeOverflow {
        /// Current simulated time when the event was scheduled.
        now: SimTime,
        /// The relative delay that overflowed.
        delay: u64,
    },

    /// An absolute target time lies before the current simulated time.
    #[error("cannot schedule at {requested}: simulation is already at {now}")]
    TimeInPast {
        /// The absolute time the caller asked for.
        requested: SimTime,
        /// Current simulated time.
        now: SimTime,
    },

    /// An event's `execute` returned an error.
    #[error("event {handle} failed at {time}: {source}")]
    EventFailed {
        /// Simulated time at which the event ran.
        time: SimTime,
        /// Handle the event was scheduled under.
        handle: EventHandle,
        /// The error produced by the event.
        source: EventError,
    },
}
