//! Stratified event-queue scheduler for Verilog-style discrete-event simulation.
//!
//! This crate orders opaque units of work ("events") by simulated time and,
//! within one time, by the IEEE 1364 scheduling regions: active, inactive,
//! nonblocking update, and monitor. It is the engine underneath register
//! models, callback adapters and clock generators, which translate their own
//! activity into calls against [`Scheduler`].
//!
//! # Architecture
//!
//! Each absolute time with pending work owns a time step of four region
//! queues. The scheduler keeps those steps in time order, repeatedly takes the
//! earliest one, and drains it one delta cycle at a time until every region is
//! empty. Events may schedule more events while they run, including into the
//! step being drained.
//!
//! # Usage
//!
//! ```ignore
//! use strata_sched::{from_fn, Scheduler};
//!
//! let sched = Scheduler::new();
//! sched.schedule_active(from_fn(|s: &Scheduler| {
//!     s.schedule_nonblocking_update(from_fn(|_| Ok(())), 0)?;
//!     Ok(())
//! }), 10)?;
//! let summary = sched.run()?;
//! println!("simulation ended at {}", summary.final_time);
//! ```
//!
//! # Modules
//!
//! - `error` — Scheduler error types
//! - `event` — The `Event` trait and cancellation handles
//! - `region` — The four scheduling regions
//! - `time` — Integer-tick simulated time
//! - `scheduler` — The time-ordered event loop and scheduling API

#![warn(missing_docs)]

pub mod error;
pub mod event;
mod queue;
pub mod region;
pub mod scheduler;
pub mod time;
mod time_step;
mod timeline;

pub use error::SchedError;
pub use event::{from_fn, Event, EventError, EventHandle, EventResult, FnEvent};
pub use region::Region;
pub use scheduler::{RunSummary, SchedStats, Scheduler};
pub use strata_config::SchedulerConfig;
pub use time::SimTime;
