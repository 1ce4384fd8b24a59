//! Configuration types deserialized from `strata.toml`.

use serde::Deserialize;

/// The top-level configuration parsed from `strata.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrataConfig {
    /// Settings for the event scheduler.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Settings applied to a scheduler at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Last simulated tick the event loop may advance to.
    ///
    /// Time steps later than this stay pending. `None` runs until the
    /// time-step queue empties or termination is requested.
    #[serde(default)]
    pub time_limit: Option<u64>,
    /// Name attached to the scheduler's log records, useful when several
    /// testbenches run in one process.
    #[serde(default)]
    pub label: Option<String>,
}

impl SchedulerConfig {
    /// Returns the label, or `"sched"` when none was configured.
    pub fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or("sched")
    }
}
