//! DES-based async runtime.
//!
//! Simulation processes are written as ordinary `async` blocks. Every wait
//! point (`sim_sleep`, a resource acquisition) returns `Poll::Pending` to the
//! runtime, which hands control back to the scheduler. The process is polled
//! again only when an event naming its [`TaskId`] is delivered.
//!
//! # Key Components
//!
//! - [`DesRuntime`]: owns the suspended processes and polls them on demand
//! - [`sim_sleep`]: suspend the current process for a simulated duration
//! - [`sim_sleep_until`]: suspend until a specific simulation time
//!
//! # Basic Usage
//!
//! ```
//! use des_core::{Simulation, SimTime};
//! use des_core::async_runtime::sim_sleep;
//! use std::time::Duration;
//!
//! let mut sim = Simulation::default();
//! sim.spawn(async {
//!     sim_sleep(Duration::from_millis(100)).await;
//!     sim_sleep(Duration::from_millis(50)).await;
//! });
//!
//! sim.run_until(SimTime::from_millis(200));
//! assert_eq!(sim.time(), SimTime::from_millis(150));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::{debug, instrument, trace};

use crate::scheduler::SchedulerHandle;
use crate::types::TaskId;
use crate::waker::{create_des_waker, WakeQueue};
use crate::SimTime;

struct PollContext {
    scheduler: SchedulerHandle,
    task_id: TaskId,
}

// Context of the task currently being polled. Futures use it to read the
// clock and to register timer wakes for themselves.
thread_local! {
    static CURRENT: RefCell<Option<PollContext>> = const { RefCell::new(None) };
}

/// Get the current simulation time (only available while a task is polled).
pub fn current_sim_time() -> Option<SimTime> {
    CURRENT.with(|c| c.borrow().as_ref().map(|ctx| ctx.scheduler.time()))
}

/// Id of the task currently being polled.
pub fn current_task() -> Option<TaskId> {
    CURRENT.with(|c| c.borrow().as_ref().map(|ctx| ctx.task_id))
}

fn set_poll_context(scheduler: &SchedulerHandle, task_id: TaskId) {
    CURRENT.with(|c| {
        *c.borrow_mut() = Some(PollContext {
            scheduler: scheduler.clone(),
            task_id,
        });
    });
}

fn clear_poll_context() {
    CURRENT.with(|c| *c.borrow_mut() = None);
}

/// Schedule a wake of the current task after `delay`. Returns `false` when
/// called outside a poll.
fn schedule_wake_after(delay: Duration) -> bool {
    CURRENT.with(|c| match c.borrow().as_ref() {
        Some(ctx) => {
            ctx.scheduler.schedule(delay, ctx.task_id);
            true
        }
        None => false,
    })
}

/// A suspended async task.
struct Task {
    future: Pin<Box<dyn Future<Output = ()>>>,
}

/// DES-based async runtime.
///
/// The `DesRuntime` owns every live simulation process. It never decides
/// *when* to poll: the [`crate::Simulation`] polls a task exactly when an
/// event for it is delivered.
pub struct DesRuntime {
    next_task_id: u64,
    tasks: HashMap<TaskId, Task>,
    wakes: WakeQueue,
}

impl Default for DesRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl DesRuntime {
    /// Create a new async runtime.
    pub fn new() -> Self {
        Self {
            next_task_id: 0,
            tasks: HashMap::new(),
            wakes: WakeQueue::new(),
        }
    }

    /// Register a new process. The caller is responsible for scheduling its
    /// first poll.
    #[instrument(skip(self, future), fields(task_id))]
    pub fn spawn<F>(&mut self, future: F) -> TaskId
    where
        F: Future<Output = ()> + 'static,
    {
        let task_id = TaskId(self.next_task_id);
        self.next_task_id += 1;

        self.tasks.insert(
            task_id,
            Task {
                future: Box::pin(future),
            },
        );

        tracing::Span::current().record("task_id", tracing::field::display(task_id));
        debug!(task_count = self.tasks.len(), "Spawned async task");

        task_id
    }

    /// Get the number of live tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Check if there are any live tasks.
    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Poll a single task. Returns `None` if the task no longer exists.
    /// Completed tasks are dropped.
    #[instrument(level = "trace", skip(self, scheduler), fields(task_id = %task_id))]
    pub(crate) fn poll_task(
        &mut self,
        task_id: TaskId,
        scheduler: &SchedulerHandle,
    ) -> Option<Poll<()>> {
        let task = self.tasks.get_mut(&task_id)?;

        let waker = create_des_waker(task_id, self.wakes.clone());
        let mut cx = Context::from_waker(&waker);

        set_poll_context(scheduler, task_id);
        trace!("Polling async task");
        let result = task.future.as_mut().poll(&mut cx);
        clear_poll_context();

        match result {
            Poll::Ready(()) => {
                self.tasks.remove(&task_id);
                debug!(remaining = self.tasks.len(), "Async task completed");
            }
            Poll::Pending => trace!("Async task returned Pending"),
        }

        Some(result)
    }

    /// Drain wakes raised since the last call, in raise order.
    pub(crate) fn take_wakes(&self) -> Vec<TaskId> {
        self.wakes.drain()
    }
}

/// A future that completes after a simulated delay.
///
/// Use [`sim_sleep`] or [`sim_sleep_until`] to create instances.
#[derive(Debug)]
pub struct SimSleep {
    target_time: Option<SimTime>,
    duration: Duration,
    timer_scheduled: bool,
}

impl SimSleep {
    /// Create a new SimSleep that will complete after the given duration.
    pub fn new(duration: Duration) -> Self {
        Self {
            target_time: None,
            duration,
            timer_scheduled: false,
        }
    }

    /// Create a SimSleep with a specific target time.
    pub fn until(target_time: SimTime) -> Self {
        Self {
            target_time: Some(target_time),
            duration: Duration::ZERO,
            timer_scheduled: false,
        }
    }
}

impl Future for SimSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        let Some(current_time) = current_sim_time() else {
            return Poll::Pending;
        };

        let duration = self.duration;
        let target = *self
            .target_time
            .get_or_insert_with(|| current_time + duration);

        if current_time >= target {
            Poll::Ready(())
        } else {
            if !self.timer_scheduled {
                self.timer_scheduled = schedule_wake_after(target - current_time);
            }
            Poll::Pending
        }
    }
}

/// Suspend the current process for `duration` of simulation time.
///
/// A zero duration completes without yielding.
///
/// # Example
///
/// ```
/// use des_core::async_runtime::sim_sleep;
/// use std::time::Duration;
///
/// async fn serve() {
///     sim_sleep(Duration::from_secs(25)).await;
/// }
/// ```
pub fn sim_sleep(duration: Duration) -> SimSleep {
    SimSleep::new(duration)
}

/// Suspend the current process until a specific simulation time.
pub fn sim_sleep_until(target: SimTime) -> SimSleep {
    SimSleep::until(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Simulation;
    use std::rc::Rc;

    #[test]
    fn test_runtime_spawn() {
        let mut runtime = DesRuntime::new();
        assert_eq!(runtime.task_count(), 0);
        assert!(!runtime.has_tasks());

        let task_id = runtime.spawn(async {});
        assert_eq!(task_id, TaskId(0));
        assert_eq!(runtime.task_count(), 1);
        assert!(runtime.has_tasks());

        let task_id2 = runtime.spawn(async {});
        assert_eq!(task_id2, TaskId(1));
        assert_eq!(runtime.task_count(), 2);
    }

    #[test]
    fn test_context_only_inside_poll() {
        assert!(current_sim_time().is_none());
        assert!(current_task().is_none());

        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();

        let mut sim = Simulation::default();
        let id = sim.spawn(async move {
            *seen_clone.borrow_mut() = Some((current_task(), current_sim_time()));
        });
        sim.run_until(SimTime::from_secs(1));

        assert_eq!(*seen.borrow(), Some((Some(id), Some(SimTime::zero()))));
        assert!(current_task().is_none());
    }

    #[test]
    fn test_sim_sleep() {
        let mut sim = Simulation::default();

        let wake_times = Rc::new(RefCell::new(Vec::new()));
        let wake_times_clone = wake_times.clone();

        sim.spawn(async move {
            wake_times_clone.borrow_mut().push(current_sim_time());
            sim_sleep(Duration::from_millis(50)).await;
            wake_times_clone.borrow_mut().push(current_sim_time());
            sim_sleep(Duration::from_millis(50)).await;
            wake_times_clone.borrow_mut().push(current_sim_time());
        });

        sim.run_until(SimTime::from_millis(200));

        assert_eq!(
            *wake_times.borrow(),
            vec![
                Some(SimTime::zero()),
                Some(SimTime::from_millis(50)),
                Some(SimTime::from_millis(100)),
            ]
        );
        assert_eq!(sim.task_count(), 0);
    }

    #[test]
    fn test_zero_sleep_does_not_yield() {
        let mut sim = Simulation::default();
        sim.spawn(async {
            sim_sleep(Duration::ZERO).await;
            sim_sleep(Duration::ZERO).await;
        });
        sim.run_until(SimTime::from_secs(1));
        // Only the initial poll was needed
        assert_eq!(sim.events_processed(), 1);
        assert_eq!(sim.task_count(), 0);
    }

    #[test]
    fn test_sim_sleep_until() {
        let mut sim = Simulation::default();
        let woke = Rc::new(RefCell::new(None));
        let woke_clone = woke.clone();
        sim.spawn(async move {
            sim_sleep_until(SimTime::from_secs(7)).await;
            *woke_clone.borrow_mut() = current_sim_time();
        });
        sim.run_until(SimTime::from_secs(10));
        assert_eq!(*woke.borrow(), Some(SimTime::from_secs(7)));
    }

    #[test]
    fn test_multiple_tasks_interleave_in_time_order() {
        let mut sim = Simulation::default();

        let results = Rc::new(RefCell::new(Vec::new()));
        let results1 = results.clone();
        let results2 = results.clone();

        sim.spawn(async move {
            results1.borrow_mut().push("t1-start");
            sim_sleep(Duration::from_millis(50)).await;
            results1.borrow_mut().push("t1-50ms");
            sim_sleep(Duration::from_millis(100)).await;
            results1.borrow_mut().push("t1-150ms");
        });

        sim.spawn(async move {
            results2.borrow_mut().push("t2-start");
            sim_sleep(Duration::from_millis(100)).await;
            results2.borrow_mut().push("t2-100ms");
        });

        sim.run_until(SimTime::from_millis(200));

        assert_eq!(
            *results.borrow(),
            vec!["t1-start", "t2-start", "t1-50ms", "t2-100ms", "t1-150ms"]
        );
    }

    #[test]
    fn test_sleep_past_horizon_is_abandoned() {
        let mut sim = Simulation::default();
        let finished = Rc::new(RefCell::new(false));
        let finished_clone = finished.clone();
        sim.spawn(async move {
            sim_sleep(Duration::from_secs(100)).await;
            *finished_clone.borrow_mut() = true;
        });

        sim.run_until(SimTime::from_secs(99));

        assert!(!*finished.borrow());
        assert_eq!(sim.task_count(), 1);
        assert!(sim.has_pending_events());
        assert_eq!(sim.time(), SimTime::zero());
    }
}
