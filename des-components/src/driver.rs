//! Run driver: configuration in, report out.

use crate::allocation::allocate_servers;
use crate::builder::{validate_sim_seconds, Validate};
use crate::config::ServiceConfig;
use crate::error::ComponentError;
use crate::flow::{CustomerFlow, FlowState, SERVICES_COMPLETED};
use crate::station::Station;
use des_core::logging::{events, simulation_span};
use des_core::{Execute, Executor, Simulation, SimulationMetrics};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, instrument};

const RUN_NAME: &str = "service_flow";

/// One line of the allocation table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// 1-based station number
    pub station: usize,
    pub service_time_secs: f64,
    pub servers: usize,
}

/// What happened at one station during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStats {
    pub station: usize,
    pub grants: u64,
    pub services_completed: u64,
    pub peak_queue_len: usize,
    pub mean_wait_secs: f64,
    /// When the station last finished a service, if it ever did
    pub last_service_at_secs: Option<f64>,
}

/// Outcome of [`run_service_simulation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub rows: Vec<ResultRow>,
    pub stations: Vec<StationStats>,
    pub served_count: u64,
    pub target_count: u64,
    pub target_reached: bool,
    /// Simulated seconds at which the target was reached
    pub completed_at_secs: Option<f64>,
    /// Clock at the end of the run, i.e. the time of the last delivered event
    pub final_time_secs: f64,
    pub horizon_secs: f64,
    pub events_processed: u64,
}

impl RunReport {
    /// The allocation table, one row per station in visiting order
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Sum of allocated servers. May differ from the configured budget.
    pub fn allocated_servers(&self) -> usize {
        self.rows.iter().map(|row| row.servers).sum()
    }
}

/// Allocate servers, run the customer flow(s) until the target or the
/// horizon, and report the allocation together with run statistics.
///
/// # Errors
///
/// Returns a configuration error before any simulated time advances if
/// `config` is invalid.
#[instrument(
    skip(config),
    fields(stations = config.durations.len(), target = config.target_count)
)]
pub fn run_service_simulation(config: &ServiceConfig) -> Result<RunReport, ComponentError> {
    config.validate()?;
    let horizon = validate_sim_seconds("horizon_secs", config.horizon_secs)?;

    let allocation = allocate_servers(&config.durations, config.total_servers);
    let stations: Rc<[Station]> = config
        .durations
        .iter()
        .zip(&allocation)
        .enumerate()
        .map(|(i, (&secs, &servers))| Station::new(i + 1, secs, servers))
        .collect::<Result<Vec<_>, _>>()?
        .into();
    info!(
        allocated = allocation.iter().sum::<usize>(),
        budget = config.total_servers,
        "Servers allocated"
    );

    let state = FlowState::new(config.target_count);
    let metrics = Rc::new(RefCell::new(SimulationMetrics::new()));
    let mut sim = Simulation::default();
    for id in 0..config.customer_processes {
        let flow = CustomerFlow::new(stations.clone(), state.clone(), config.counting)
            .with_id(id)
            .with_metrics(metrics.clone());
        sim.spawn(flow.run());
    }

    {
        let _span = simulation_span(RUN_NAME).entered();
        events::simulation_started(RUN_NAME, Some(horizon));
        let done = state.clone();
        Executor::timed(horizon)
            .stop_when(move |_| done.is_done())
            .execute(&mut sim);
        events::simulation_completed(RUN_NAME, sim.time(), sim.events_processed());
    }

    // Read the pools before `sim` drops the suspended flows, which hands
    // their servers back.
    let metrics = metrics.borrow();
    let station_stats = stations
        .iter()
        .map(|station| {
            let pool = station.pool().stats();
            let name = station.name();
            StationStats {
                station: station.index(),
                grants: pool.grants,
                services_completed: metrics.counter_total(SERVICES_COMPLETED, &name),
                peak_queue_len: pool.peak_queue_len,
                mean_wait_secs: pool.mean_wait().as_secs_f64(),
                last_service_at_secs: metrics
                    .counter(SERVICES_COMPLETED, &name)
                    .map(|s| s.last_incremented.as_secs_f64()),
            }
        })
        .collect();

    Ok(RunReport {
        rows: result_rows(&stations),
        stations: station_stats,
        served_count: state.served(),
        target_count: state.target(),
        target_reached: state.is_done(),
        completed_at_secs: state.completed_at().map(|t| t.as_secs_f64()),
        final_time_secs: sim.time().as_secs_f64(),
        horizon_secs: config.horizon_secs,
        events_processed: sim.events_processed(),
    })
}

/// The allocation table for a set of stations
pub fn result_rows(stations: &[Station]) -> Vec<ResultRow> {
    stations
        .iter()
        .map(|station| ResultRow {
            station: station.index(),
            service_time_secs: station.service_secs(),
            servers: station.servers(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::flow::CountingMode;

    #[test]
    fn test_single_station_finishes_at_thirty_seconds() {
        let config = ServiceConfig::builder()
            .durations([10.0])
            .total_servers(1)
            .target_count(3)
            .build()
            .unwrap();
        let report = run_service_simulation(&config).unwrap();

        assert_eq!(
            report.rows(),
            &[ResultRow {
                station: 1,
                service_time_secs: 10.0,
                servers: 1
            }]
        );
        assert!(report.target_reached);
        assert_eq!(report.served_count, 3);
        assert_eq!(report.completed_at_secs, Some(30.0));
        assert_eq!(report.final_time_secs, 30.0);
        assert_eq!(report.stations[0].services_completed, 3);
        assert_eq!(report.stations[0].grants, 3);
        assert_eq!(report.stations[0].mean_wait_secs, 0.0);
        assert_eq!(report.stations[0].last_service_at_secs, Some(30.0));
    }

    #[test]
    fn test_rows_keep_configured_durations() {
        let durations = [1.0 / 3.0, 25.000_000_000_4];
        let config = ServiceConfig::builder()
            .durations(durations)
            .total_servers(2)
            .target_count(4)
            .build()
            .unwrap();
        let report = run_service_simulation(&config).unwrap();

        let secs: Vec<f64> = report.rows().iter().map(|row| row.service_time_secs).collect();
        assert_eq!(secs, durations);
    }

    #[test]
    fn test_idle_station_has_no_last_service() {
        let config = ServiceConfig::builder()
            .durations([10.0, 5.0])
            .total_servers(2)
            .target_count(1)
            .build()
            .unwrap();
        let report = run_service_simulation(&config).unwrap();

        assert_eq!(report.stations[0].last_service_at_secs, Some(10.0));
        assert_eq!(report.stations[1].services_completed, 0);
        assert_eq!(report.stations[1].last_service_at_secs, None);
    }

    #[test]
    fn test_run_stops_at_target_with_contention() {
        let config = ServiceConfig::builder()
            .durations([10.0])
            .total_servers(1)
            .target_count(4)
            .customer_processes(2)
            .build()
            .unwrap();
        let report = run_service_simulation(&config).unwrap();

        assert_eq!(report.completed_at_secs, Some(40.0));
        assert_eq!(report.final_time_secs, 40.0);
        assert_eq!(report.stations[0].services_completed, 4);
        assert_eq!(report.stations[0].peak_queue_len, 1);
        assert!(report.stations[0].mean_wait_secs > 0.0);
    }

    #[test]
    fn test_per_traversal_report() {
        let config = ServiceConfig::builder()
            .durations([10.0, 5.0])
            .total_servers(3)
            .target_count(2)
            .counting(CountingMode::PerTraversal)
            .build()
            .unwrap();
        let report = run_service_simulation(&config).unwrap();

        assert_eq!(report.served_count, 2);
        assert_eq!(report.completed_at_secs, Some(30.0));
        assert_eq!(report.stations[1].services_completed, 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ServiceConfig {
            total_servers: 0,
            ..ServiceConfig::default()
        };
        let err = run_service_simulation(&config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unrepresentable_horizon() {
        let config = ServiceConfig {
            horizon_secs: 1e30,
            ..ServiceConfig::default()
        };
        let err = run_service_simulation(&config).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            ComponentError::Config(ConfigError::ConstraintViolation { ref field, .. })
                if field == "horizon_secs"
        ));
    }

    #[test]
    fn test_unrepresentable_duration() {
        let config = ServiceConfig {
            durations: vec![10.0, 1e11],
            ..ServiceConfig::default()
        };
        let err = run_service_simulation(&config).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::Config(ConfigError::ConstraintViolation { ref field, .. })
                if field == "durations[1]"
        ));
    }
}
