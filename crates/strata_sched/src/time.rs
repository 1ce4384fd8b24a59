//! Absolute simulated time measured in integer ticks.
//!
//! [`SimTime`] carries no physical unit. A tick is whatever the embedding
//! simulation decides it is; the scheduler only compares and adds them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An absolute point in simulated time.
///
/// Time steps are ordered by their `SimTime`; within one time step, ordering
/// is decided by [`Region`](crate::Region) priority instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// Time zero, where every simulation starts.
    pub const ZERO: SimTime = SimTime(0);

    /// Creates a time from a raw tick count.
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns the time `delay` ticks after `self`, or `None` on overflow.
    pub fn checked_add(self, delay: u64) -> Option<SimTime> {
        self.0.checked_add(delay).map(SimTime)
    }
}

impl From<u64> for SimTime {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}
