//! The top-level stratified event scheduler.
//!
//! [`Scheduler`] owns the time-ordered collection of time steps, the
//! current-time cursor, and the one-shot start/end-of-simulation and
//! next-sim-time lists. Its event loop repeatedly takes the earliest pending
//! step, makes it current, and drains it to completion before advancing.
//!
//! # Threads
//!
//! Exactly one thread drives the `process_*` methods and [`run`](Scheduler::run).
//! Any number of producer threads may call the `schedule_*` methods and
//! [`cancel`](Scheduler::cancel) concurrently through a shared
//! `Arc<Scheduler>`. No lock is held while an event executes, so events may
//! schedule and cancel freely.
//!
//! Events scheduled for the next sim time while that list is being executed
//! are always deferred to the following advance; scheduling never waits for
//! the drain.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use strata_config::SchedulerConfig;
use tracing::{debug, trace};

use crate::error::SchedError;
use crate::event::{Event, EventHandle};
use crate::queue::{lock, pop_front, remove_handle, EventQueue, Pending};
use crate::region::Region;
use crate::time::SimTime;
use crate::time_step::TimeStep;
use crate::timeline::Timeline;

/// Cumulative counters kept by a scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedStats {
    /// Time steps taken from the queue and drained.
    pub time_steps: u64,
    /// Events executed, including start, end and next-sim-time events.
    pub events_executed: u64,
    /// Deferred regions promoted into `Active`.
    pub promotions: u64,
}

/// The outcome of [`Scheduler::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Simulated time when the run ended.
    pub final_time: SimTime,
    /// Time steps drained during this run.
    pub time_steps: u64,
    /// Events executed during this run.
    pub events_executed: u64,
    /// Whether the event loop stopped because termination was requested.
    pub terminated: bool,
}

/// Where an event goes within its time step.
#[derive(Clone, Copy, Debug)]
enum Placement {
    Back(Region),
    FrontOfActive,
}

/// Verilog-style stratified event scheduler.
///
/// Construct with [`Scheduler::new`] or [`Scheduler::with_config`], schedule
/// events, then call [`run`](Scheduler::run) or the individual `process_*`
/// phases.
#[derive(Debug)]
pub struct Scheduler {
    /// Current time, current step, and pending steps.
    timeline: Mutex<Timeline>,
    /// Run once by `process_start_of_simulation_events`.
    start_events: EventQueue,
    /// Run once by `process_end_of_simulation_events`.
    end_events: EventQueue,
    /// Run at the start of the next advance.
    next_time_events: EventQueue,
    /// Snapshot of `next_time_events` being executed.
    active_next_events: EventQueue,
    terminate_requested: AtomicBool,
    next_handle: AtomicU64,
    time_steps: AtomicU64,
    events_executed: AtomicU64,
    promotions: AtomicU64,
    /// Steps later than this stay pending.
    time_limit: Option<SimTime>,
    /// Name recorded on log events.
    label: String,
}

impl Scheduler {
    /// Creates a scheduler at time zero with default settings.
    pub fn new() -> Self {
        Self::with_config(&SchedulerConfig::default())
    }

    /// Creates a scheduler at time zero with the given settings.
    pub fn with_config(config: &SchedulerConfig) -> Self {
        Self {
            timeline: Mutex::new(Timeline::new()),
            start_events: Mutex::new(VecDeque::new()),
            end_events: Mutex::new(VecDeque::new()),
            next_time_events: Mutex::new(VecDeque::new()),
            active_next_events: Mutex::new(VecDeque::new()),
            terminate_requested: AtomicBool::new(false),
            next_handle: AtomicU64::new(1),
            time_steps: AtomicU64::new(0),
            events_executed: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
            time_limit: config.time_limit.map(SimTime::from_ticks),
            label: config.label_or_default().to_string(),
        }
    }

    /// Returns the current simulated time.
    pub fn current_sim_time(&self) -> SimTime {
        lock(&self.timeline).now()
    }

    /// Returns `true` if any time step is waiting to be processed.
    pub fn is_pending(&self) -> bool {
        lock(&self.timeline).is_pending()
    }

    /// Times of the pending time steps, earliest first.
    pub fn pending_time_steps(&self) -> Vec<SimTime> {
        lock(&self.timeline).pending_times()
    }

    /// Returns `true` if a pending time step exists for `time`.
    pub fn has_time_step(&self, time: SimTime) -> bool {
        lock(&self.timeline).contains(time)
    }

    /// Returns the configured time limit, if any.
    pub fn time_limit(&self) -> Option<SimTime> {
        self.time_limit
    }

    /// Returns the label attached to this scheduler's log records.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns a snapshot of the cumulative counters.
    pub fn stats(&self) -> SchedStats {
        SchedStats {
            time_steps: self.time_steps.load(Ordering::Relaxed),
            events_executed: self.events_executed.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
        }
    }

    // ---- scheduling -------------------------------------------------------

    /// Schedules `event` into `region` of the time step `delay` ticks from now.
    pub fn schedule<E: Event + 'static>(
        &self,
        region: Region,
        event: E,
        delay: u64,
    ) -> Result<EventHandle, SchedError> {
        self.enqueue(Placement::Back(region), Box::new(event), delay)
    }

    /// Schedules `event` at the end of the `Active` region.
    pub fn schedule_active<E: Event + 'static>(
        &self,
        event: E,
        delay: u64,
    ) -> Result<EventHandle, SchedError> {
        self.schedule(Region::Active, event, delay)
    }

    /// Schedules `event` at the head of the `Active` region, ahead of every
    /// active event already queued for that time.
    pub fn schedule_active_front<E: Event + 'static>(
        &self,
        event: E,
        delay: u64,
    ) -> Result<EventHandle, SchedError> {
        self.enqueue(Placement::FrontOfActive, Box::new(event), delay)
    }

    /// Schedules `event` into the `Inactive` region.
    pub fn schedule_inactive<E: Event + 'static>(
        &self,
        event: E,
        delay: u64,
    ) -> Result<EventHandle, SchedError> {
        self.schedule(Region::Inactive, event, delay)
    }

    /// Schedules `event` into the `NonblockingUpdate` region.
    pub fn schedule_nonblocking_update<E: Event + 'static>(
        &self,
        event: E,
        delay: u64,
    ) -> Result<EventHandle, SchedError> {
        self.schedule(Region::NonblockingUpdate, event, delay)
    }

    /// Schedules `event` into the `Monitor` region.
    pub fn schedule_monitor<E: Event + 'static>(
        &self,
        event: E,
        delay: u64,
    ) -> Result<EventHandle, SchedError> {
        self.schedule(Region::Monitor, event, delay)
    }

    /// Schedules `event` at the head of `Active` for the absolute time `time`,
    /// so it runs before any other work at that time.
    ///
    /// Fails with [`SchedError::TimeInPast`] if `time` has already passed.
    pub fn schedule_at_start_of_time<E: Event + 'static>(
        &self,
        event: E,
        time: SimTime,
    ) -> Result<EventHandle, SchedError> {
        let mut timeline = lock(&self.timeline);
        let now = timeline.now();
        if time < now {
            return Err(SchedError::TimeInPast {
                requested: time,
                now,
            });
        }
        let step = timeline.step_at(time);
        let handle = self.mint_handle();
        step.push_front_active(Pending::new(handle, Box::new(event)));
        Ok(handle)
    }

    /// Queues `event` to run once by [`process_start_of_simulation_events`](Self::process_start_of_simulation_events).
    pub fn schedule_simulation_start<E: Event + 'static>(&self, event: E) -> EventHandle {
        self.push_list(&self.start_events, Box::new(event))
    }

    /// Queues `event` to run once by [`process_end_of_simulation_events`](Self::process_end_of_simulation_events).
    pub fn schedule_simulation_end<E: Event + 'static>(&self, event: E) -> EventHandle {
        self.push_list(&self.end_events, Box::new(event))
    }

    /// Queues `event` to run at the start of the next time-step advance,
    /// before that step's regions are drained.
    pub fn schedule_next_sim_time<E: Event + 'static>(&self, event: E) -> EventHandle {
        self.push_list(&self.next_time_events, Box::new(event))
    }

    /// Removes a scheduled event that has not started executing.
    ///
    /// Returns `false` if the event already ran, was already cancelled, or is
    /// running right now.
    pub fn cancel(&self, handle: EventHandle) -> bool {
        let mut timeline = lock(&self.timeline);
        if timeline.cancel_in_current(handle) {
            return true;
        }
        let lists = [
            &self.start_events,
            &self.end_events,
            &self.next_time_events,
            &self.active_next_events,
        ];
        if lists.into_iter().any(|list| remove_handle(list, handle)) {
            return true;
        }
        timeline.cancel_in_pending(handle)
    }

    /// Asks the event loop to stop before the next time step.
    ///
    /// A time step that has started always drains completely.
    pub fn request_termination(&self) {
        if !self.terminate_requested.swap(true, Ordering::SeqCst) {
            debug!(sched = %self.label, "termination requested");
        }
    }

    /// Returns `true` once [`request_termination`](Self::request_termination) has been called.
    pub fn is_termination_requested(&self) -> bool {
        self.terminate_requested.load(Ordering::SeqCst)
    }

    // ---- processing -------------------------------------------------------

    /// Runs a complete simulation: start events, the event loop, end events.
    pub fn run(&self) -> Result<RunSummary, SchedError> {
        let before = self.stats();
        self.process_start_of_simulation_events()?;
        self.process_events()?;
        self.process_end_of_simulation_events()?;
        let after = self.stats();
        Ok(RunSummary {
            final_time: self.current_sim_time(),
            time_steps: after.time_steps - before.time_steps,
            events_executed: after.events_executed - before.events_executed,
            terminated: self.is_termination_requested(),
        })
    }

    /// Executes the start-of-simulation events in order.
    ///
    /// Events they add to the list are executed as well.
    pub fn process_start_of_simulation_events(&self) -> Result<(), SchedError> {
        self.drain_list(&self.start_events)
    }

    /// Executes the end-of-simulation events in order.
    ///
    /// Events they add to the list are executed as well.
    pub fn process_end_of_simulation_events(&self) -> Result<(), SchedError> {
        self.drain_list(&self.end_events)
    }

    /// Processes time steps until none remain, termination is requested, or
    /// the next step lies beyond the configured time limit.
    pub fn process_events(&self) -> Result<(), SchedError> {
        if let Some(step) = self.interrupted_step() {
            self.finish_step(&step)?;
        }
        loop {
            if self.is_termination_requested() {
                break;
            }
            let Some(next) = self.next_pending_time() else {
                break;
            };
            if let Some(limit) = self.time_limit {
                if next > limit {
                    debug!(sched = %self.label, %next, %limit, "time limit reached");
                    break;
                }
            }
            self.process_next_simulation_time_step()?;
        }
        Ok(())
    }

    /// Advances by one time step.
    ///
    /// First executes the events queued for the next sim time, then takes the
    /// earliest pending time step, makes it current, and drains it. If the
    /// previous call was interrupted by a failing event, the interrupted step
    /// is finished instead and no advance happens.
    pub fn process_next_simulation_time_step(&self) -> Result<(), SchedError> {
        if let Some(step) = self.interrupted_step() {
            debug!(sched = %self.label, time = %step.time(), "resuming interrupted time step");
            return self.finish_step(&step);
        }

        self.process_next_sim_time_events()?;

        let step = lock(&self.timeline).advance();
        if let Some(step) = step {
            self.time_steps.fetch_add(1, Ordering::Relaxed);
            debug!(
                sched = %self.label,
                time = %step.time(),
                events = step.len(),
                "advancing to time step"
            );
            self.finish_step(&step)?;
        }
        Ok(())
    }

    // ---- internals --------------------------------------------------------

    /// Executes one event on behalf of the step or list that held it.
    pub(crate) fn dispatch(&self, time: SimTime, pending: Pending) -> Result<(), SchedError> {
        let Pending { handle, event } = pending;
        trace!(sched = %self.label, %time, %handle, "executing event");
        self.events_executed.fetch_add(1, Ordering::Relaxed);
        event
            .execute(self)
            .map_err(|source| SchedError::EventFailed {
                time,
                handle,
                source,
            })
    }

    pub(crate) fn record_promotion(&self, time: SimTime, region: Region) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
        trace!(sched = %self.label, %time, %region, "promoting region into active");
    }

    fn mint_handle(&self) -> EventHandle {
        EventHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    fn enqueue(
        &self,
        placement: Placement,
        event: Box<dyn Event>,
        delay: u64,
    ) -> Result<EventHandle, SchedError> {
        // The timeline lock stays held until the push completes so the step
        // cannot be retired in between.
        let mut timeline = lock(&self.timeline);
        let step = timeline.resolve(delay)?;
        let handle = self.mint_handle();
        let pending = Pending::new(handle, event);
        match placement {
            Placement::Back(region) => step.push(region, pending),
            Placement::FrontOfActive => step.push_front_active(pending),
        }
        Ok(handle)
    }

    fn push_list(&self, list: &EventQueue, event: Box<dyn Event>) -> EventHandle {
        let handle = self.mint_handle();
        lock(list).push_back(Pending::new(handle, event));
        handle
    }

    fn drain_list(&self, list: &EventQueue) -> Result<(), SchedError> {
        while let Some(pending) = pop_front(list) {
            self.dispatch(self.current_sim_time(), pending)?;
        }
        Ok(())
    }

    /// Moves the next-sim-time list into the active snapshot and executes it.
    fn process_next_sim_time_events(&self) -> Result<(), SchedError> {
        {
            // Held so a concurrent cancel never sees the event in neither list.
            let _timeline = lock(&self.timeline);
            let mut next = lock(&self.next_time_events);
            if !next.is_empty() {
                lock(&self.active_next_events).extend(next.drain(..));
            }
        }
        while let Some(pending) = pop_front(&self.active_next_events) {
            self.dispatch(self.current_sim_time(), pending)?;
        }
        Ok(())
    }

    fn interrupted_step(&self) -> Option<Arc<TimeStep>> {
        lock(&self.timeline).current()
    }

    fn next_pending_time(&self) -> Option<SimTime> {
        lock(&self.timeline).next_time()
    }

    /// Drains `step` until it is empty under the timeline lock, then retires it.
    fn finish_step(&self, step: &TimeStep) -> Result<(), SchedError> {
        loop {
            step.drain(self)?;
            if lock(&self.timeline).retire_current() {
                return Ok(());
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
