//! Parsing of `strata.toml` scheduler configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`StrataConfig`] whose [`SchedulerConfig`] section is consumed by the
//! `strata_sched` scheduler.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::*;
