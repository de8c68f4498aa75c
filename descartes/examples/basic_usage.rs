//! Basic usage of the descartes facade: run the reference configuration
//! with a few concurrent flows and print the allocation and station stats.
//!
//! ```bash
//! cargo run -p descartes --example basic_usage
//! ```

use descartes::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    descartes::core::init_simulation_logging_with_level("info");

    let config = ServiceConfig::builder()
        .customer_processes(4)
        .target_count(500)
        .build()?;
    let report = run_service_simulation(&config)?;

    print!("{}", descartes::table::render(report.rows()));
    println!();
    println!(
        "served {} of {} (target reached: {}) at t = {:.0}s, {} events",
        report.served_count,
        report.target_count,
        report.target_reached,
        report.final_time_secs,
        report.events_processed,
    );
    for station in &report.stations {
        println!(
            "station {:>2}: {:>4} services, peak queue {:>2}, mean wait {:>7.1}s",
            station.station,
            station.services_completed,
            station.peak_queue_len,
            station.mean_wait_secs,
        );
    }

    Ok(())
}
