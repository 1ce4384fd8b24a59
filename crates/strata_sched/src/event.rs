//! The unit of scheduled work and the handle used to cancel it.

use std::fmt;

use crate::scheduler::Scheduler;

/// Error type an event may fail with.
pub type EventError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of executing an event.
pub type EventResult = Result<(), EventError>;

/// An opaque unit of work ordered by the scheduler.
///
/// `execute` consumes the event, so it can run at most once. It receives the
/// scheduler that dispatched it and may schedule further events, including
/// into the time step that is currently draining.
pub trait Event: Send {
    /// Performs the work.
    fn execute(self: Box<Self>, sched: &Scheduler) -> EventResult;
}

/// An [`Event`] built from a closure. See [`from_fn`].
pub struct FnEvent<F>(F);

/// Wraps a closure as an [`Event`].
///
/// ```ignore
/// sched.schedule_active(from_fn(|s: &Scheduler| {
///     s.schedule_monitor(from_fn(|_| Ok(())), 0)?;
///     Ok(())
/// }), 10)?;
/// ```
pub fn from_fn<F>(f: F) -> FnEvent<F>
where
    F: FnOnce(&Scheduler) -> EventResult + Send,
{
    FnEvent(f)
}

impl<F> Event for FnEvent<F>
where
    F: FnOnce(&Scheduler) -> EventResult + Send,
{
    fn execute(self: Box<Self>, sched: &Scheduler) -> EventResult {
        let FnEvent(f) = *self;
        f(sched)
    }
}

impl<F> fmt::Debug for FnEvent<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnEvent")
    }
}

/// Identifies one scheduled event for cancellation.
///
/// Handles are minted by the scheduler, strictly increasing, and never reused
/// within one scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventHandle(u64);

impl EventHandle {
    /// Wraps a raw handle value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev#{}", self.0)
    }
}
