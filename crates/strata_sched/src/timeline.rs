//! The time-ordered collection of pending time steps.
//!
//! [`Timeline`] also owns the current-time cursor and the step being drained,
//! so resolving "current time plus delay" to a step is one atomic operation
//! under the scheduler's timeline lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::SchedError;
use crate::event::EventHandle;
use crate::time::SimTime;
use crate::time_step::TimeStep;

/// Pending time steps keyed by absolute time, plus the current-time cursor.
#[derive(Debug, Default)]
pub(crate) struct Timeline {
    /// Current simulated time. Never decreases.
    now: SimTime,
    /// The step being drained. Not present in `steps`.
    current: Option<Arc<TimeStep>>,
    /// Future steps, and the step for `now` when nothing is draining.
    steps: BTreeMap<SimTime, Arc<TimeStep>>,
}

impl Timeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn now(&self) -> SimTime {
        self.now
    }

    /// Returns the step `delay` ticks from now, creating it if needed.
    pub(crate) fn resolve(&mut self, delay: u64) -> Result<Arc<TimeStep>, SchedError> {
        let time = self.now.checked_add(delay).ok_or(SchedError::TimeOverflow {
            now: self.now,
            delay,
        })?;
        Ok(self.step_at(time))
    }

    /// Returns the step for an absolute `time`, creating it if needed.
    ///
    /// `time` equal to now targets the draining step when there is one.
    pub(crate) fn step_at(&mut self, time: SimTime) -> Arc<TimeStep> {
        debug_assert!(time >= self.now, "step requested in the past: {time}");
        if time == self.now {
            if let Some(current) = &self.current {
                return Arc::clone(current);
            }
        }
        Arc::clone(
            self.steps
                .entry(time)
                .or_insert_with(|| Arc::new(TimeStep::new(time))),
        )
    }

    /// Time of the earliest pending step.
    pub(crate) fn next_time(&self) -> Option<SimTime> {
        self.steps.keys().next().copied()
    }

    /// Removes the earliest pending step and makes it current.
    pub(crate) fn advance(&mut self) -> Option<Arc<TimeStep>> {
        let (time, step) = self.steps.pop_first()?;
        debug_assert!(time >= self.now, "time went backwards: {} -> {time}", self.now);
        self.now = time;
        self.current = Some(Arc::clone(&step));
        Some(step)
    }

    /// The step being drained, if a drain is in progress or was interrupted.
    pub(crate) fn current(&self) -> Option<Arc<TimeStep>> {
        self.current.clone()
    }

    /// Discards the current step if it is empty. Returns whether it was.
    ///
    /// Producers push while holding the timeline lock, so once this returns
    /// `true` nothing can reach the discarded step.
    pub(crate) fn retire_current(&mut self) -> bool {
        match &self.current {
            Some(step) if !step.is_empty() => false,
            _ => {
                self.current = None;
                true
            }
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        !self.steps.is_empty()
    }

    pub(crate) fn pending_times(&self) -> Vec<SimTime> {
        self.steps.keys().copied().collect()
    }

    pub(crate) fn contains(&self, time: SimTime) -> bool {
        self.steps.contains_key(&time)
    }

    pub(crate) fn cancel_in_current(&self, handle: EventHandle) -> bool {
        self.current.as_ref().is_some_and(|step| step.remove(handle))
    }

    /// Cancels `handle` in the pending steps, dropping a step it empties.
    pub(crate) fn cancel_in_pending(&mut self, handle: EventHandle) -> bool {
        let hit = self
            .steps
            .iter()
            .find(|(_, step)| step.remove(handle))
            .map(|(&time, step)| (time, step.is_empty()));
        match hit {
            Some((time, emptied)) => {
                if emptied {
                    self.steps.remove(&time);
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::from_fn;
    use crate::queue::Pending;
    use crate::region::Region;
    use crate::scheduler::Scheduler;

    fn noop(raw: u64) -> Pending {
        Pending::new(
            EventHandle::from_raw(raw),
            Box::new(from_fn(|_: &Scheduler| Ok(()))),
        )
    }

    #[test]
    fn resolve_reuses_existing_step() {
        let mut tl = Timeline::new();
        let a = tl.resolve(10).unwrap();
        let b = tl.resolve(10).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(tl.pending_times(), vec![SimTime::from_ticks(10)]);
    }

    #[test]
    fn resolve_zero_without_current_uses_collection() {
        let mut tl = Timeline::new();
        let step = tl.resolve(0).unwrap();
        assert_eq!(step.time(), SimTime::ZERO);
        assert!(tl.contains(SimTime::ZERO));
    }

    #[test]
    fn resolve_zero_targets_current_step() {
        let mut tl = Timeline::new();
        tl.resolve(5).unwrap();
        let current = tl.advance().unwrap();
        let again = tl.resolve(0).unwrap();
        assert!(Arc::ptr_eq(&current, &again));
        assert!(!tl.is_pending());
    }

    #[test]
    fn resolve_overflow() {
        let mut tl = Timeline::new();
        tl.resolve(u64::MAX).unwrap();
        tl.advance().unwrap();
        let err = tl.resolve(1).unwrap_err();
        assert!(matches!(err, SchedError::TimeOverflow { delay: 1, .. }));
    }

    #[test]
    fn advance_visits_in_time_order() {
        let mut tl = Timeline::new();
        tl.resolve(9999).unwrap();
        tl.resolve(88).unwrap();
        tl.resolve(500).unwrap();
        let mut seen = Vec::new();
        while let Some(step) = tl.advance() {
            assert_eq!(tl.now(), step.time());
            seen.push(step.time().ticks());
            assert!(tl.retire_current());
        }
        assert_eq!(seen, vec![88, 500, 9999]);
    }

    #[test]
    fn retire_keeps_nonempty_current() {
        let mut tl = Timeline::new();
        let step = tl.resolve(1).unwrap();
        step.push(Region::Active, noop(1));
        tl.advance().unwrap();
        assert!(!tl.retire_current());
        assert!(tl.current().is_some());
    }

    #[test]
    fn cancel_drops_emptied_step() {
        let mut tl = Timeline::new();
        let step = tl.resolve(7).unwrap();
        step.push(Region::Inactive, noop(1));
        assert!(tl.cancel_in_pending(EventHandle::from_raw(1)));
        assert!(!tl.contains(SimTime::from_ticks(7)));
        assert!(!tl.cancel_in_pending(EventHandle::from_raw(1)));
    }

    #[test]
    fn cancel_keeps_nonempty_step() {
        let mut tl = Timeline::new();
        let step = tl.resolve(7).unwrap();
        step.push(Region::Active, noop(1));
        step.push(Region::Active, noop(2));
        assert!(tl.cancel_in_pending(EventHandle::from_raw(2)));
        assert!(tl.contains(SimTime::from_ticks(7)));
    }
}
