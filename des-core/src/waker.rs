//! DES waker utilities.
//!
//! Futures running inside the simulation are woken through a [`Waker`] that
//! does not touch the scheduler directly. Waking a task appends its id to a
//! shared [`WakeQueue`]; after every poll the simulation drains that queue and
//! turns each entry into a zero-delay event. Wakes raised while a task is
//! being polled are therefore delivered after it yields, in the order they
//! were raised.
//!
//! # Usage
//!
//! ```rust,ignore
//! let waker = create_des_waker(task_id, wake_queue.clone());
//! let mut cx = Context::from_waker(&waker);
//! let _ = future.as_mut().poll(&mut cx);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Wake, Waker};

use crate::types::TaskId;

/// Deferred wakes raised while polling, in raise order.
#[derive(Debug, Clone, Default)]
pub struct WakeQueue {
    inner: Arc<Mutex<VecDeque<TaskId>>>,
}

impl WakeQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, task_id: TaskId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task_id);
    }

    /// Remove and return every pending wake in raise order.
    pub fn drain(&self) -> Vec<TaskId> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Number of wakes not yet drained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether there are no pending wakes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct TaskWaker {
    task_id: TaskId,
    queue: WakeQueue,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.queue.push(self.task_id);
    }
}

/// Create a DES-aware waker that records a wake for `task_id` in `queue`.
pub fn create_des_waker(task_id: TaskId, queue: WakeQueue) -> Waker {
    Waker::from(Arc::new(TaskWaker { task_id, queue }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waker_records_wakes_in_order() {
        let queue = WakeQueue::new();
        let w1 = create_des_waker(TaskId(1), queue.clone());
        let w2 = create_des_waker(TaskId(2), queue.clone());

        w2.wake_by_ref();
        w1.wake_by_ref();
        w2.wake();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain(), vec![TaskId(2), TaskId(1), TaskId(2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_waker_clone() {
        let queue = WakeQueue::new();
        let waker = create_des_waker(TaskId(42), queue.clone());

        let waker2 = waker.clone();
        let waker3 = waker2.clone();
        assert!(waker.will_wake(&waker2));

        drop(waker);
        waker3.wake();
        drop(waker2);
        assert_eq!(queue.drain(), vec![TaskId(42)]);
    }
}
