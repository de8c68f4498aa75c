//! Demonstration of logging capabilities in des-core
//!
//! A small server pool with a handful of clients, run with detailed logging
//! so every spawn, poll, grant and release shows up.
//!
//! ```bash
//! cargo run -p des-core --example logging_demo
//! RUST_LOG=des_core::resource=debug cargo run -p des-core --example logging_demo
//! ```

use des_core::async_runtime::{current_sim_time, sim_sleep};
use des_core::{
    init_detailed_simulation_logging, simulation_span, ResourcePool, SimError, SimTime, Simulation,
};
use std::time::Duration;
use tracing::{debug, info};

fn main() -> Result<(), SimError> {
    init_detailed_simulation_logging();
    let _span = simulation_span("logging_demo").entered();

    let mut sim = Simulation::default();
    let servers = ResourcePool::new(2)?;

    for client in 0..5_u64 {
        let servers = servers.clone();
        sim.spawn(async move {
            sim_sleep(Duration::from_millis(100 * client)).await;
            info!(client, "Requesting a server");

            let permit = servers.acquire().await;
            debug!(client, request = ?permit.request(), at = ?current_sim_time(), "Server granted");

            sim_sleep(Duration::from_millis(250)).await;
            permit.release();
            info!(client, "Request completed");
        });
    }

    sim.run_until(SimTime::from_secs(10));

    let stats = servers.stats();
    info!(
        final_time = %sim.time(),
        grants = stats.grants,
        peak_queue = stats.peak_queue_len,
        mean_wait = ?stats.mean_wait(),
        "Demo finished"
    );
    Ok(())
}
