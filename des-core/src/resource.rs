//! FIFO resource pools.
//!
//! A [`ResourcePool`] models a fixed set of identical servers. Processes
//! [`acquire`](ResourcePool::acquire) a slot, hold it while they consume
//! simulated time, and give it back through [`ServerPermit::release`] (or by
//! dropping the permit).
//!
//! Admission is strictly first-come first-served: a request is never granted
//! while an earlier request to the same pool is still waiting, even if a slot
//! happens to be free. When a holder releases, the slot passes directly to
//! the head of the queue and that waiter's task is woken with zero delay.
//!
//! ```
//! use des_core::{ResourcePool, SimTime, Simulation};
//! use des_core::async_runtime::sim_sleep;
//! use std::time::Duration;
//!
//! let mut sim = Simulation::default();
//! let pool = ResourcePool::new(1).unwrap();
//! for _ in 0..3 {
//!     let pool = pool.clone();
//!     sim.spawn(async move {
//!         let permit = pool.acquire().await;
//!         sim_sleep(Duration::from_secs(10)).await;
//!         permit.release();
//!     });
//! }
//! sim.run_until(SimTime::from_secs(100));
//! assert_eq!(sim.time(), SimTime::from_secs(30));
//! assert_eq!(pool.stats().grants, 3);
//! ```

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};

use crate::async_runtime::current_sim_time;
use crate::error::SimError;
use crate::SimTime;

/// Identifier of a single acquisition request, unique within its pool and
/// assigned in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestId(pub u64);

/// Counters kept by every pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolStats {
    /// Total number of granted requests.
    pub grants: u64,
    /// Request ids in the order they were granted.
    pub grant_log: Vec<RequestId>,
    /// Highest number of simultaneous holders observed.
    pub peak_holders: usize,
    /// Longest waiting queue observed.
    pub peak_queue_len: usize,
    /// Sum of the time granted requests spent queued.
    pub total_wait: Duration,
}

impl PoolStats {
    /// Mean queueing delay of granted requests.
    #[must_use]
    pub fn mean_wait(&self) -> Duration {
        match u32::try_from(self.grants) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_wait / n,
            Err(_) => Duration::from_secs_f64(self.total_wait.as_secs_f64() / self.grants as f64),
        }
    }
}

#[derive(Debug)]
struct Waiter {
    request: RequestId,
    requested_at: SimTime,
    waker: Waker,
}

#[derive(Debug)]
struct PoolState {
    capacity: usize,
    holders: usize,
    next_request_id: u64,

    // FIFO queue of outstanding acquisitions.
    queue: VecDeque<Waiter>,

    // Requests promoted to holders whose futures have not yet observed it.
    granted: HashSet<RequestId>,

    stats: PoolStats,
}

impl PoolState {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            holders: 0,
            next_request_id: 0,
            queue: VecDeque::new(),
            granted: HashSet::new(),
            stats: PoolStats::default(),
        }
    }

    fn next_request(&mut self) -> RequestId {
        let id = RequestId(self.next_request_id);
        self.next_request_id += 1;
        id
    }

    fn record_grant(&mut self, request: RequestId, waited: Duration) {
        self.holders += 1;
        debug_assert!(self.holders <= self.capacity, "pool over capacity");
        self.stats.grants += 1;
        self.stats.grant_log.push(request);
        self.stats.total_wait += waited;
        self.stats.peak_holders = self.stats.peak_holders.max(self.holders);
    }

    /// Frees one slot and hands it to the head of the queue, returning the
    /// waker of the promoted request.
    fn release_locked(&mut self) -> Option<Waker> {
        self.holders = self.holders.saturating_sub(1);

        let waiter = self.queue.pop_front()?;
        let now = current_sim_time().unwrap_or(waiter.requested_at);
        self.record_grant(waiter.request, now - waiter.requested_at);
        self.granted.insert(waiter.request);
        trace!(request = waiter.request.0, holders = self.holders, "Promoted queued request");
        Some(waiter.waker)
    }
}

/// A pool of identical servers with FIFO admission.
///
/// Cloning yields another handle to the same pool.
#[derive(Clone)]
pub struct ResourcePool {
    state: Rc<RefCell<PoolState>>,
}

impl fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ResourcePool")
            .field("capacity", &state.capacity)
            .field("holders", &state.holders)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl ResourcePool {
    /// Create a pool with `capacity` servers.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if `capacity` is zero; such a pool
    /// could never serve anyone.
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        if capacity < 1 {
            return Err(SimError::Configuration(
                "resource pool capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            state: Rc::new(RefCell::new(PoolState::new(capacity))),
        })
    }

    /// Number of servers in the pool. Never changes after construction.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.borrow().capacity
    }

    /// Number of currently granted slots.
    #[must_use]
    pub fn holders(&self) -> usize {
        self.state.borrow().holders
    }

    /// Number of requests waiting for a slot.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.state.borrow().stats.clone()
    }

    /// Request a slot. The returned future resolves to a [`ServerPermit`]
    /// once the request reaches the head of the queue and a slot is free.
    pub fn acquire(&self) -> Acquire {
        Acquire {
            pool: self.clone(),
            request: None,
            completed: false,
        }
    }

    fn release(&self, request: RequestId) {
        let waker = {
            let mut state = self.state.borrow_mut();
            debug!(
                request = request.0,
                holders = state.holders,
                queued = state.queue.len(),
                "Releasing server"
            );
            state.release_locked()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Future returned by [`ResourcePool::acquire`].
pub struct Acquire {
    pool: ResourcePool,
    request: Option<RequestId>,
    completed: bool,
}

impl Acquire {
    fn permit(&mut self, request: RequestId) -> ServerPermit {
        self.completed = true;
        ServerPermit {
            pool: self.pool.clone(),
            request,
            released: false,
        }
    }
}

impl Future for Acquire {
    type Output = ServerPermit;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ServerPermit> {
        let this = &mut *self;
        let pool = this.pool.clone();
        let mut state = pool.state.borrow_mut();

        match this.request {
            None => {
                let request = state.next_request();
                this.request = Some(request);

                if state.queue.is_empty() && state.holders < state.capacity {
                    state.record_grant(request, Duration::ZERO);
                    trace!(request = request.0, holders = state.holders, "Granted immediately");
                    drop(state);
                    return Poll::Ready(this.permit(request));
                }

                let requested_at = current_sim_time().unwrap_or_default();
                state.queue.push_back(Waiter {
                    request,
                    requested_at,
                    waker: cx.waker().clone(),
                });
                state.stats.peak_queue_len = state.stats.peak_queue_len.max(state.queue.len());
                trace!(request = request.0, queued = state.queue.len(), "Request queued");
                Poll::Pending
            }
            Some(request) => {
                if state.granted.remove(&request) {
                    drop(state);
                    return Poll::Ready(this.permit(request));
                }
                if let Some(waiter) = state.queue.iter_mut().find(|w| w.request == request) {
                    if !waiter.waker.will_wake(cx.waker()) {
                        waiter.waker = cx.waker().clone();
                    }
                }
                Poll::Pending
            }
        }
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let Some(request) = self.request else {
            return;
        };

        let waker = {
            let mut state = self.pool.state.borrow_mut();
            if state.granted.remove(&request) {
                // Granted but never observed: pass the slot on.
                state.release_locked()
            } else {
                if let Some(pos) = state.queue.iter().position(|w| w.request == request) {
                    state.queue.remove(pos);
                }
                None
            }
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Exclusive use of one server slot. The slot is returned on
/// [`release`](ServerPermit::release) or drop.
pub struct ServerPermit {
    pool: ResourcePool,
    request: RequestId,
    released: bool,
}

impl ServerPermit {
    /// The request this permit was granted for.
    #[must_use]
    pub fn request(&self) -> RequestId {
        self.request
    }

    /// Give the slot back to the pool.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.pool.release(self.request);
        }
    }
}

impl fmt::Debug for ServerPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerPermit")
            .field("request", &self.request)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for ServerPermit {
    fn drop(&mut self) {
        self.release_inner();
    }
}
