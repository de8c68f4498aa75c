//! Station contention scenarios
//!
//! Runs the reference station line with an increasing number of concurrent
//! customer flows and reports where queues build up.
//!
//! Scenarios:
//! 1. one flow, per-station-visit counting (no contention)
//! 2. several flows sharing the FIFO pools
//! 3. several flows, counting full traversals only
//!
//! Run with: cargo run --package des-components --example station_contention

use des_components::{
    run_service_simulation, ComponentError, CountingMode, RunReport, ServiceConfig,
};

fn print_report(title: &str, config: &ServiceConfig, report: &RunReport) {
    println!("\n=== {title} ===");
    println!("Configuration:");
    println!("  Stations: {}", config.durations.len());
    println!(
        "  Server budget: {} (allocated {})",
        config.total_servers,
        report.allocated_servers()
    );
    println!("  Customer flows: {}", config.customer_processes);
    println!("  Counting: {:?}", config.counting);

    println!("\nOutcome:");
    println!("  Served: {} / {}", report.served_count, report.target_count);
    match report.completed_at_secs {
        Some(at) => println!("  Target reached at {at:.0}s"),
        None => println!("  Horizon of {:.0}s reached first", report.horizon_secs),
    }
    println!("  Events processed: {}", report.events_processed);

    println!("\nBusiest stations:");
    let mut stations = report.stations.clone();
    stations.sort_by(|a, b| b.mean_wait_secs.total_cmp(&a.mean_wait_secs));
    for station in stations.iter().take(3) {
        println!(
            "  station {:>2}: mean wait {:>7.1}s, peak queue {}",
            station.station, station.mean_wait_secs, station.peak_queue_len
        );
    }
}

fn main() -> Result<(), ComponentError> {
    let scenarios = [
        ("Single flow", 1, CountingMode::PerStationVisit),
        ("Four flows", 4, CountingMode::PerStationVisit),
        ("Four flows, full traversals", 4, CountingMode::PerTraversal),
    ];

    for (title, processes, counting) in scenarios {
        let config = ServiceConfig::builder()
            .customer_processes(processes)
            .counting(counting)
            .target_count(if counting == CountingMode::PerTraversal { 60 } else { 600 })
            .build()?;
        let report = run_service_simulation(&config)?;
        print_report(title, &config, &report);
    }

    Ok(())
}
