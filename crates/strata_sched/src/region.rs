//! The four scheduling regions of a Verilog time step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scheduling region within one time step.
///
/// Regions are listed in drain priority order. `Active` events run one at a
/// time; each lower region is promoted wholesale into `Active` once every
/// region above it is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Events that run immediately, in order.
    Active,
    /// Events deferred until the active region settles (`#0` delays).
    Inactive,
    /// Nonblocking assignment updates.
    NonblockingUpdate,
    /// Read-only observers that see the final values of the time step.
    Monitor,
}

impl Region {
    /// Number of regions in a time step.
    pub const COUNT: usize = 4;

    /// All regions, highest priority first.
    pub const ALL: [Region; Region::COUNT] = [
        Region::Active,
        Region::Inactive,
        Region::NonblockingUpdate,
        Region::Monitor,
    ];

    /// Regions that are promoted into `Active`, in promotion order.
    pub const DEFERRED: [Region; 3] = [
        Region::Inactive,
        Region::NonblockingUpdate,
        Region::Monitor,
    ];

    /// Index of this region's queue within a time step.
    pub const fn index(self) -> usize {
        match self {
            Region::Active => 0,
            Region::Inactive => 1,
            Region::NonblockingUpdate => 2,
            Region::Monitor => 3,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Active => "active",
            Region::Inactive => "inactive",
            Region::NonblockingUpdate => "nonblocking-update",
            Region::Monitor => "monitor",
        };
        f.write_str(name)
    }
}
