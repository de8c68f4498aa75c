//! Customer flow through the stations.
//!
//! A [`CustomerFlow`] is a long-running simulation process. It walks the
//! stations in order, and at each one it waits for a server, holds it for
//! the service time and hands it back. Several flows may share one
//! [`FlowState`]; the run ends as soon as the shared served count reaches
//! its target.

use crate::station::Station;
use des_core::async_runtime::current_sim_time;
use des_core::{SimTime, SimulationMetrics};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// Counter of completed services, labelled per station
pub const SERVICES_COMPLETED: &str = "station_services_completed";

/// Histogram of queueing time before service, in seconds, labelled per station
pub const WAIT_SECONDS: &str = "station_wait_seconds";

/// What counts as one served customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMode {
    /// Every completed station service counts
    #[default]
    PerStationVisit,
    /// Only a full pass through all stations counts
    PerTraversal,
}

#[derive(Debug)]
struct FlowCounters {
    served: Cell<u64>,
    target: u64,
    completed_at: Cell<Option<SimTime>>,
}

/// Served-customer count shared by every flow of a run
#[derive(Debug, Clone)]
pub struct FlowState {
    inner: Rc<FlowCounters>,
}

impl FlowState {
    pub fn new(target: u64) -> Self {
        Self {
            inner: Rc::new(FlowCounters {
                served: Cell::new(0),
                target,
                completed_at: Cell::new(None),
            }),
        }
    }

    pub fn served(&self) -> u64 {
        self.inner.served.get()
    }

    pub fn target(&self) -> u64 {
        self.inner.target
    }

    /// True once the served count has reached the target
    pub fn is_done(&self) -> bool {
        self.served() >= self.target()
    }

    /// Simulated time at which the target was reached
    pub fn completed_at(&self) -> Option<SimTime> {
        self.inner.completed_at.get()
    }

    /// Count one served customer and report whether the target is reached.
    ///
    /// The count never goes past the target.
    pub fn record_served(&self) -> bool {
        if self.is_done() {
            return true;
        }

        let served = self.served() + 1;
        self.inner.served.set(served);
        if served >= self.target() {
            self.inner.completed_at.set(current_sim_time());
            true
        } else {
            false
        }
    }
}

/// One customer-flow process
pub struct CustomerFlow {
    id: usize,
    stations: Rc<[Station]>,
    state: FlowState,
    counting: CountingMode,
    metrics: Option<Rc<RefCell<SimulationMetrics>>>,
}

impl CustomerFlow {
    pub fn new(stations: Rc<[Station]>, state: FlowState, counting: CountingMode) -> Self {
        Self {
            id: 0,
            stations,
            state,
            counting,
            metrics: None,
        }
    }

    /// Identifier used in log output
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    /// Record per-station service counts and wait times into `metrics`
    pub fn with_metrics(mut self, metrics: Rc<RefCell<SimulationMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Walk the stations until the shared target is reached.
    ///
    /// Spawn the returned future on a `Simulation`. If the horizon cuts the
    /// run short the process is simply never resumed.
    #[instrument(skip(self), fields(flow = self.id))]
    pub async fn run(self) {
        if self.stations.is_empty() {
            return;
        }

        let mut traversals = 0_u64;
        'flow: while !self.state.is_done() {
            for station in self.stations.iter() {
                // Another flow may have reached the target while we waited
                if self.state.is_done() {
                    break 'flow;
                }

                let requested_at = now();
                let permit = station.pool().acquire().await;
                if self.state.is_done() {
                    permit.release();
                    break 'flow;
                }
                let granted_at = now();
                station.serve().await;
                permit.release();

                trace!(
                    station = station.index(),
                    waited_secs = (granted_at - requested_at).as_secs_f64(),
                    "Service completed"
                );
                self.record_service(station, requested_at, granted_at);

                if self.counting == CountingMode::PerStationVisit && self.state.record_served() {
                    break 'flow;
                }
            }

            traversals += 1;
            if self.counting == CountingMode::PerTraversal && self.state.record_served() {
                break;
            }
        }

        debug!(
            served = self.state.served(),
            traversals,
            at = %now(),
            "Customer flow finished"
        );
    }

    fn record_service(&self, station: &Station, requested_at: SimTime, granted_at: SimTime) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        let mut metrics = metrics.borrow_mut();
        let name = station.name();
        let finished_at = now();
        metrics.increment_counter(SERVICES_COMPLETED, name.as_str(), finished_at);
        metrics.record_duration(WAIT_SECONDS, name, granted_at - requested_at, finished_at);
    }
}

fn now() -> SimTime {
    current_sim_time().unwrap_or_default()
}
