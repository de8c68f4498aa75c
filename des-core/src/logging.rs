//! Structured logging for discrete event simulation debugging
//!
//! # How to Control Terminal Logging Output
//!
//! ## 1. `init_simulation_logging_with_level()` for specific levels
//! ```rust
//! use des_core::init_simulation_logging_with_level;
//! init_simulation_logging_with_level("debug");  // DEBUG and above
//! ```
//!
//! ## 2. Environment variables (most flexible)
//! ```bash
//! RUST_LOG=debug station-sim
//! RUST_LOG=des_core::resource=trace,des_components=debug station-sim
//! ```
//!
//! ## 3. Log level guidelines
//! - **TRACE**: every scheduled/delivered event, every grant and queueing decision
//! - **DEBUG**: process spawn/completion, server releases, station service
//! - **INFO**: run start and completion
//! - **WARN**: processes stranded with no pending events
//!
//! Initialization is idempotent: if a global subscriber is already installed
//! the call does nothing.

use crate::SimTime;
use tracing::{info, Span};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the simulation with sensible defaults (`info`).
///
/// Output goes to stderr so stdout stays free for reports.
pub fn init_simulation_logging() {
    init_simulation_logging_with_level("info");
}

/// Initialize logging with a specific level
///
/// # Arguments
/// * `level` - Log level: "trace", "debug", "info", "warn", or "error"
///
/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init_simulation_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{level},des_core::scheduler=warn,des_core::async_runtime=warn").into()
    });

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Simulation logging initialized at level: {}", level);
    }
}

/// Initialize logging with custom configuration for advanced debugging
pub fn init_detailed_simulation_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trace,des_core=trace,des_components=trace".into());

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .pretty(),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Detailed simulation logging initialized");
    }
}

/// Create a span for tracking simulation execution
pub fn simulation_span(name: &str) -> Span {
    tracing::info_span!("simulation", name = name)
}

/// Logging utilities for common simulation events
pub mod events {
    use super::*;

    /// Log simulation start
    pub fn simulation_started(name: &str, end_time: Option<SimTime>) {
        match end_time {
            Some(end) => info!(simulation = name, end_time = %end, "Simulation started"),
            None => info!(simulation = name, "Simulation started (unbounded)"),
        }
    }

    /// Log simulation completion
    pub fn simulation_completed(name: &str, final_time: SimTime, events_processed: u64) {
        info!(
            simulation = name,
            final_time = %final_time,
            events_processed = events_processed,
            "Simulation completed"
        );
    }
}

/// Logging utilities for unusual conditions
pub mod diagnostics {
    use super::*;
    use tracing::warn;

    /// Log processes left suspended with nothing scheduled to resume them
    pub fn tasks_stranded(time: SimTime, live_tasks: usize) {
        warn!(
            time = %time,
            live_tasks = live_tasks,
            "Processes suspended with no pending events"
        );
    }
}
