//! One time step of the stratified event queue.
//!
//! A [`TimeStep`] holds the events bound to a single absolute time, split into
//! the four [`Region`]s. Draining it is one full delta-cycle cascade of the
//! Verilog reference model:
//!
//! 1. pop and execute the head of `Active`;
//! 2. otherwise move all of `Inactive` to the end of `Active`;
//! 3. otherwise move all of `NonblockingUpdate`;
//! 4. otherwise move all of `Monitor`;
//! 5. otherwise the step is empty.
//!
//! Only one active event runs per iteration, so events spawned by that event
//! are seen before any lower region is considered.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::SchedError;
use crate::event::EventHandle;
use crate::queue::{lock, pop_front, remove_handle, EventQueue, Pending};
use crate::region::Region;
use crate::scheduler::Scheduler;
use crate::time::SimTime;

/// The pending events of one absolute simulated time.
///
/// Every region is guarded by its own lock so producer threads can enqueue
/// while the scheduler thread drains.
#[derive(Debug)]
pub(crate) struct TimeStep {
    time: SimTime,
    regions: [EventQueue; Region::COUNT],
}

impl TimeStep {
    /// Creates an empty time step bound to `time`.
    pub fn new(time: SimTime) -> Self {
        Self {
            time,
            regions: std::array::from_fn(|_| Mutex::new(VecDeque::new())),
        }
    }

    /// Returns the absolute time this step is bound to.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Appends `pending` to `region`.
    pub fn push(&self, region: Region, pending: Pending) {
        lock(self.queue(region)).push_back(pending);
    }

    /// Inserts `pending` at the head of `Active`, ahead of everything queued.
    pub fn push_front_active(&self, pending: Pending) {
        lock(self.queue(Region::Active)).push_front(pending);
    }

    /// Removes the event scheduled under `handle` from whichever region holds
    /// it. Returns `false` if no region does.
    ///
    /// Regions are searched lowest priority first. Promotion only moves events
    /// towards `Active`, so a concurrent drain cannot carry an event past the
    /// search.
    pub fn remove(&self, handle: EventHandle) -> bool {
        Region::ALL
            .iter()
            .rev()
            .any(|&region| remove_handle(self.queue(region), handle))
    }

    /// Returns `true` if every region is empty.
    pub fn is_empty(&self) -> bool {
        self.regions.iter().all(|q| lock(q).is_empty())
    }

    /// Total number of queued events across all regions.
    pub fn len(&self) -> usize {
        self.regions.iter().map(|q| lock(q).len()).sum()
    }

    #[cfg(test)]
    fn region_len(&self, region: Region) -> usize {
        lock(self.queue(region)).len()
    }

    /// Drains the step until every region is empty.
    ///
    /// Events run through `sched`, which they may use to schedule more work
    /// (into this step or any other). If an event fails, draining stops and
    /// the error is returned; the remaining events stay queued.
    pub fn drain(&self, sched: &Scheduler) -> Result<(), SchedError> {
        loop {
            if let Some(pending) = pop_front(self.queue(Region::Active)) {
                sched.dispatch(self.time, pending)?;
                continue;
            }
            match self.promote_next() {
                Some(region) => sched.record_promotion(self.time, region),
                None => return Ok(()),
            }
        }
    }

    /// Moves the highest-priority nonempty deferred region into `Active`.
    ///
    /// Both locks are held across the move, `Active` first.
    fn promote_next(&self) -> Option<Region> {
        let mut active = lock(self.queue(Region::Active));
        for region in Region::DEFERRED {
            let mut source = lock(self.queue(region));
            if source.is_empty() {
                continue;
            }
            active.extend(source.drain(..));
            return Some(region);
        }
        None
    }

    fn queue(&self, region: Region) -> &EventQueue {
        &self.regions[region.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{from_fn, Event, EventResult};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn note(log: &Log, name: &'static str) -> impl Event + 'static {
        let log = Arc::clone(log);
        from_fn(move |_: &Scheduler| -> EventResult {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    fn h(raw: u64) -> EventHandle {
        EventHandle::from_raw(raw)
    }

    fn pending<E: Event + 'static>(raw: u64, event: E) -> Pending {
        Pending::new(h(raw), Box::new(event))
    }

    #[test]
    fn new_step_is_empty() {
        for i in 0..20u64 {
            let step = TimeStep::new(SimTime::from_ticks(i * i * i));
            assert_eq!(step.time().ticks(), i * i * i);
            assert!(step.is_empty());
            assert_eq!(step.len(), 0);
        }
    }

    #[test]
    fn push_fills_the_named_region() {
        let log: Log = Arc::default();
        let step = TimeStep::new(SimTime::ZERO);
        for (i, region) in Region::ALL.iter().enumerate() {
            step.push(*region, pending(i as u64, note(&log, "x")));
        }
        for region in Region::ALL {
            assert_eq!(step.region_len(region), 1);
        }
        assert_eq!(step.len(), 4);
    }

    #[test]
    fn many_pushes_keep_count() {
        let log: Log = Arc::default();
        let step = TimeStep::new(SimTime::from_ticks(8));
        for i in 0..10_000u64 {
            step.push(Region::Inactive, pending(i, note(&log, "x")));
        }
        assert_eq!(step.region_len(Region::Inactive), 10_000);
    }

    #[test]
    fn drain_follows_region_priority() {
        let sched = Scheduler::new();
        let log: Log = Arc::default();
        let step = TimeStep::new(SimTime::ZERO);
        step.push(Region::Monitor, pending(1, note(&log, "monitor")));
        step.push(Region::NonblockingUpdate, pending(2, note(&log, "nba")));
        step.push(Region::Inactive, pending(3, note(&log, "inactive")));
        step.push(Region::Active, pending(4, note(&log, "active")));

        step.drain(&sched).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["active", "inactive", "nba", "monitor"]
        );
        assert_eq!(sched.stats().events_executed, 4);
        assert_eq!(sched.stats().promotions, 3);
        assert!(step.is_empty());
    }

    #[test]
    fn drain_single_monitor_event_empties_step() {
        let sched = Scheduler::new();
        let log: Log = Arc::default();
        let step = TimeStep::new(SimTime::from_ticks(27));
        step.push(Region::Monitor, pending(1, note(&log, "m")));
        assert!(!step.is_empty());
        step.drain(&sched).unwrap();
        assert!(step.is_empty());
        assert_eq!(*log.lock().unwrap(), vec!["m"]);
    }

    #[test]
    fn front_insert_runs_first() {
        let sched = Scheduler::new();
        let log: Log = Arc::default();
        let step = TimeStep::new(SimTime::ZERO);
        step.push(Region::Active, pending(1, note(&log, "a")));
        step.push(Region::Active, pending(2, note(&log, "b")));
        step.push_front_active(pending(3, note(&log, "front")));
        step.drain(&sched).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["front", "a", "b"]);
    }

    #[test]
    fn promotion_appends_behind_active_work() {
        // An active event that spawns another active event and an inactive
        // one: the spawned active event still runs before the promotion.
        let sched = Scheduler::new();
        let log: Log = Arc::default();
        let step = Arc::new(TimeStep::new(SimTime::ZERO));

        let inner_step = Arc::clone(&step);
        let inner_log = Arc::clone(&log);
        step.push(
            Region::Active,
            pending(
                1,
                from_fn(move |_: &Scheduler| -> EventResult {
                    inner_log.lock().unwrap().push("root");
                    inner_step.push(Region::Inactive, pending(2, note(&inner_log, "inactive")));
                    inner_step.push(Region::Active, pending(3, note(&inner_log, "child")));
                    Ok(())
                }),
            ),
        );
        step.drain(&sched).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["root", "child", "inactive"]);
    }

    #[test]
    fn chained_events_resolve_in_every_region() {
        // An update event in Inactive doubles its input and spawns an
        // evaluation event into each region in turn; both must run before
        // the step reports empty.
        for region in Region::ALL {
            let sched = Scheduler::new();
            let step = Arc::new(TimeStep::new(SimTime::from_ticks(125)));
            let update = Arc::new(AtomicI64::new(-1));
            let evaluation = Arc::new(AtomicI64::new(-1));

            let (s, u, e) = (Arc::clone(&step), Arc::clone(&update), Arc::clone(&evaluation));
            let update_event = from_fn(move |_: &Scheduler| -> EventResult {
                let y = 8 * 2 * 2;
                u.store(y, Ordering::SeqCst);
                let evaluate = from_fn(move |_: &Scheduler| -> EventResult {
                    e.store(y, Ordering::SeqCst);
                    Ok(())
                });
                s.push(region, pending(2, evaluate));
                Ok(())
            });
            step.push(Region::Inactive, pending(1, update_event));
            step.drain(&sched).unwrap();
            assert!(step.is_empty());
            assert_eq!(update.load(Ordering::SeqCst), 32);
            assert_eq!(evaluation.load(Ordering::SeqCst), 32);
        }
    }

    #[test]
    fn remove_searches_all_regions() {
        let log: Log = Arc::default();
        let step = TimeStep::new(SimTime::ZERO);
        step.push(Region::Active, pending(1, note(&log, "a")));
        step.push(Region::Monitor, pending(2, note(&log, "m")));
        assert!(step.remove(h(2)));
        assert!(!step.remove(h(2)));
        assert!(step.remove(h(1)));
        assert!(step.is_empty());
    }

    #[test]
    fn failed_event_leaves_rest_queued() {
        let sched = Scheduler::new();
        let log: Log = Arc::default();
        let step = TimeStep::new(SimTime::from_ticks(3));
        step.push(Region::Active, pending(1, from_fn(|_: &Scheduler| Err("boom".into()))));
        step.push(Region::Active, pending(2, note(&log, "after")));
        step.push(Region::Monitor, pending(3, note(&log, "monitor")));

        let err = step.drain(&sched).unwrap_err();
        assert!(matches!(
            err,
            SchedError::EventFailed { handle, time, .. }
                if handle == h(1) && time == SimTime::from_ticks(3)
        ));
        assert_eq!(step.len(), 2);

        step.drain(&sched).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["after", "monitor"]);
    }
}
