use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use crate::types::{EventId, TaskId};
use crate::SimTime;

/// Entry stored in the scheduler: "resume `task` at `time`".
///
/// Entries are ordered by time, and among equal times by `id`, which is
/// assigned in scheduling order. Popping therefore yields events in
/// non-decreasing time order, FIFO among simultaneous events.
#[derive(Debug, Clone, Copy)]
pub struct EventEntry {
    id: EventId,
    time: SimTime,
    task: TaskId,
}

impl EventEntry {
    pub(crate) fn new(id: EventId, time: SimTime, task: TaskId) -> Self {
        Self { id, time, task }
    }

    /// Identifier (scheduling sequence number) of this event.
    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Time at which the event is delivered.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Process resumed by this event.
    #[must_use]
    pub fn task(&self) -> TaskId {
        self.task
    }
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse the ordering for min-heap behavior in BinaryHeap
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

type Clock = Rc<Cell<SimTime>>;

/// This struct exposes only immutable access to the simulation clock.
/// The clock itself is owned by the scheduler, while others can obtain `ClockRef`
/// to read the current simulation time.
///
/// # Example
///
/// ```
/// # use des_core::Scheduler;
/// let scheduler = Scheduler::default();
/// let clock_ref = scheduler.clock();
/// assert_eq!(clock_ref.time(), scheduler.time());
/// ```
#[derive(Clone)]
pub struct ClockRef {
    clock: Clock,
}

impl From<Clock> for ClockRef {
    fn from(clock: Clock) -> Self {
        Self { clock }
    }
}

impl ClockRef {
    /// Return the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock.get()
    }
}

/// Scheduler is used to keep the current time and the set of pending
/// resumption events.
///
/// See the [crate-level documentation](index.html) for more information.
pub struct Scheduler {
    next_event_id: u64,
    events: BinaryHeap<EventEntry>,
    clock: Clock,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            next_event_id: 0,
            events: BinaryHeap::default(),
            clock: Rc::new(Cell::new(SimTime::default())),
        }
    }
}

impl Scheduler {
    /// Schedules `task` to be resumed at `self.time() + delay`.
    pub fn schedule(&mut self, delay: Duration, task: TaskId) -> EventId {
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        let time = self.time() + delay;
        trace!(event_id = %id, %task, ?time, "Event scheduled");
        self.events.push(EventEntry::new(id, time, task));
        id
    }

    /// Schedules `task` to be resumed at `self.time()`.
    pub fn schedule_now(&mut self, task: TaskId) -> EventId {
        self.schedule(Duration::ZERO, task)
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock.get()
    }

    /// Returns a structure with immutable access to the simulation time.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        ClockRef {
            clock: Rc::clone(&self.clock),
        }
    }

    /// Returns a reference to the next scheduled event or `None` if none are left.
    #[must_use]
    pub fn peek(&self) -> Option<&EventEntry> {
        self.events.peek()
    }

    /// Removes and returns the next scheduled event or `None` if none are left.
    /// The clock is moved to the time of the returned event.
    pub fn pop(&mut self) -> Option<EventEntry> {
        self.events.pop().inspect(|event| {
            debug_assert!(event.time >= self.clock.get(), "clock moved backwards");
            self.clock.replace(event.time);
        })
    }

    /// Number of events still waiting to be delivered.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

/// Cloneable handle to the scheduler shared by the simulation and the
/// futures it polls.
///
/// Everything runs on a single thread, so the handle is a plain
/// `Rc<RefCell<_>>`; borrows never outlive a single call.
#[derive(Clone, Default)]
pub struct SchedulerHandle {
    inner: Rc<RefCell<Scheduler>>,
}

impl SchedulerHandle {
    /// Wraps an existing scheduler.
    #[must_use]
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(scheduler)),
        }
    }

    /// Schedules `task` to be resumed after `delay`.
    pub fn schedule(&self, delay: Duration, task: TaskId) -> EventId {
        self.inner.borrow_mut().schedule(delay, task)
    }

    /// Schedules `task` to be resumed at the current time.
    pub fn schedule_now(&self, task: TaskId) -> EventId {
        self.inner.borrow_mut().schedule_now(task)
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.inner.borrow().time()
    }

    /// Returns a read-only view of the clock.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        self.inner.borrow().clock()
    }

    /// Time of the next pending event, if any.
    #[must_use]
    pub fn peek_time(&self) -> Option<SimTime> {
        self.inner.borrow().peek().map(EventEntry::time)
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.inner.borrow().pending_events()
    }

    pub(crate) fn pop(&self) -> Option<EventEntry> {
        self.inner.borrow_mut().pop()
    }
}
