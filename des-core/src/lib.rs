//! Core discrete event simulation engine.
//!
//! This crate provides the fundamental building blocks for discrete event simulation:
//! simulated time, event scheduling, cooperative processes written as `async`
//! blocks, and FIFO resource pools.
//!
//! # Architecture Overview
//!
//! - [`Simulation`]: the main entry point. It owns the scheduler and the
//!   runtime holding every process, and delivers events one at a time.
//! - [`Scheduler`]: keeps the clock and the time-ordered set of pending
//!   events. Only the scheduler moves the clock.
//! - [`DesRuntime`](async_runtime::DesRuntime): owns suspended processes and
//!   polls exactly the process an event names.
//! - [`ResourcePool`]: a fixed number of identical servers with strict FIFO
//!   admission.
//!
//! # Basic Usage
//!
//! ```rust
//! use des_core::{Simulation, SimTime, ResourcePool};
//! use des_core::async_runtime::sim_sleep;
//! use std::time::Duration;
//!
//! let mut simulation = Simulation::default();
//! let pool = ResourcePool::new(1).unwrap();
//!
//! simulation.spawn(async move {
//!     let permit = pool.acquire().await;
//!     sim_sleep(Duration::from_secs(10)).await;
//!     permit.release();
//! });
//!
//! simulation.run_until(SimTime::from_secs(1000));
//! assert_eq!(simulation.time(), SimTime::from_secs(10));
//! ```
//!
//! # Time Model
//!
//! All timing uses [`SimTime`], which represents simulation time (not wall-clock time).
//! Events are delivered in non-decreasing time order and, among equal times,
//! in the order they were scheduled, so identical inputs give identical runs.

pub mod async_runtime;
pub mod error;
pub mod execute;
pub mod logging;
pub mod metrics;
pub mod resource;
pub mod scheduler;
pub mod time;
pub mod types;
pub mod waker;

use std::future::Future;

use tracing::{debug, info, instrument, trace};

pub use async_runtime::{sim_sleep, sim_sleep_until, DesRuntime, SimSleep};
pub use error::SimError;
pub use execute::{Execute, Executor, ExecutorWithSideEffect, ExecutorWithStopCondition};
pub use logging::{
    init_detailed_simulation_logging, init_simulation_logging,
    init_simulation_logging_with_level, simulation_span,
};
pub use metrics::{CounterSummary, HistogramSummary, SimulationMetrics};
pub use resource::{PoolStats, RequestId, ResourcePool, ServerPermit};
pub use scheduler::{ClockRef, EventEntry, Scheduler, SchedulerHandle};
pub use time::SimTime;
pub use types::{EventId, TaskId};

/// Simulation struct that puts the scheduler and the process runtime together.
///
/// See the [crate-level documentation](index.html) for more information.
pub struct Simulation {
    scheduler: SchedulerHandle,
    runtime: DesRuntime,
    events_processed: u64,
    last_event: Option<EventEntry>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            scheduler: SchedulerHandle::default(),
            runtime: DesRuntime::new(),
            events_processed: 0,
            last_event: None,
        }
    }
}

impl Simulation {
    /// Returns a handle for scheduling events and reading the clock.
    #[must_use]
    pub fn scheduler_handle(&self) -> SchedulerHandle {
        self.scheduler.clone()
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.scheduler.time()
    }

    /// Returns a ClockRef for reading the simulation time.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        self.scheduler.clock()
    }

    /// Start a new process. Its first poll is scheduled at the current time,
    /// after any events already pending for this instant.
    pub fn spawn<F>(&mut self, future: F) -> TaskId
    where
        F: Future<Output = ()> + 'static,
    {
        let task_id = self.runtime.spawn(future);
        self.scheduler.schedule_now(task_id);
        task_id
    }

    /// Performs one step of the simulation: delivers the earliest pending
    /// event and resumes the process it names. Returns `true` if there was in
    /// fact an event available to process, and `false` otherwise, which
    /// signifies that the simulation ended.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.scheduler.pop() else {
            return false;
        };

        self.events_processed += 1;
        self.last_event = Some(event);
        trace!(
            event_id = %event.id(),
            event_time = ?event.time(),
            task = %event.task(),
            "Processing simulation step"
        );

        if self.runtime.poll_task(event.task(), &self.scheduler).is_none() {
            trace!(task = %event.task(), "Event for finished task ignored");
        }

        // Wakes raised during the poll become zero-delay events, in raise order.
        for task_id in self.runtime.take_wakes() {
            self.scheduler.schedule_now(task_id);
        }

        true
    }

    /// Deliver every event with time `<= horizon`, then stop. Processes still
    /// suspended afterwards are abandoned, not resumed.
    pub fn run_until(&mut self, horizon: SimTime) {
        self.execute(Executor::timed(horizon));
    }

    /// Runs the entire simulation.
    ///
    /// The stopping condition and other execution details depend on the executor used.
    /// See [`Execute`] and [`Executor`] for more details.
    #[instrument(skip(self, executor), fields(initial_time = ?self.time()))]
    pub fn execute<E: Execute>(&mut self, executor: E) {
        debug!("Starting simulation execution");
        executor.execute(self);

        if !self.has_pending_events() && self.runtime.has_tasks() {
            logging::diagnostics::tasks_stranded(self.time(), self.runtime.task_count());
        }
        info!(
            final_time = %self.time(),
            events_processed = self.events_processed,
            live_tasks = self.runtime.task_count(),
            pending_events = self.scheduler.pending_events(),
            "Simulation execution completed"
        );
    }

    /// Returns the time of the next scheduled event, or None if no events are scheduled.
    #[must_use]
    pub fn peek_next_event_time(&self) -> Option<SimTime> {
        self.scheduler.peek_time()
    }

    /// Check if there are pending events
    #[must_use]
    pub fn has_pending_events(&self) -> bool {
        self.scheduler.pending_events() > 0
    }

    /// Number of processes that have not finished.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.runtime.task_count()
    }

    /// Number of events delivered so far.
    #[must_use]
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// The most recently delivered event.
    #[must_use]
    pub fn last_event(&self) -> Option<EventEntry> {
        self.last_event
    }
}
