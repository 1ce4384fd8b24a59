//! Mutex-guarded FIFO queues of pending events.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::event::{Event, EventHandle};

/// An event waiting in a queue, tagged with the handle it was scheduled under.
pub(crate) struct Pending {
    pub(crate) handle: EventHandle,
    pub(crate) event: Box<dyn Event>,
}

impl Pending {
    pub(crate) fn new(handle: EventHandle, event: Box<dyn Event>) -> Self {
        Self { handle, event }
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// A FIFO of pending events shared between producer threads and the
/// scheduler thread.
pub(crate) type EventQueue = Mutex<VecDeque<Pending>>;

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// Events never run while a queue lock is held, so a poisoned lock can only
/// come from a panic between two consistent states of the deque.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the entry scheduled under `handle`. Returns whether it was present.
pub(crate) fn remove_handle(queue: &EventQueue, handle: EventHandle) -> bool {
    let mut queue = lock(queue);
    match queue.iter().position(|p| p.handle == handle) {
        Some(pos) => {
            queue.remove(pos);
            true
        }
        None => false,
    }
}

/// Pops the head of `queue`, releasing the lock before returning.
pub(crate) fn pop_front(queue: &EventQueue) -> Option<Pending> {
    lock(queue).pop_front()
}
