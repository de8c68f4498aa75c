//! # DesCartes - multi-station service simulation
//!
//! Facade over the workspace crates:
//!
//! - [`core`] (`des-core`): clock, scheduler, async processes and FIFO
//!   resource pools
//! - [`components`] (`des-components`): stations, customer flow, server
//!   allocation and the run driver
//!
//! The `station-sim` binary runs a configuration and prints the allocation
//! table built by [`table::render`].
//!
//! ```rust
//! use descartes::prelude::*;
//!
//! let config = ServiceConfig::builder()
//!     .durations([10.0, 5.0])
//!     .total_servers(3)
//!     .target_count(4)
//!     .build()
//!     .unwrap();
//! let report = run_service_simulation(&config).unwrap();
//! print!("{}", descartes::table::render(report.rows()));
//! ```

pub use des_components as components;
pub use des_core as core;

pub mod table;

// Convenience re-exports of commonly used items
pub mod prelude {
    //! Commonly used types and traits

    pub use des_core::{
        sim_sleep, Execute, Executor, ResourcePool, SimError, SimTime, Simulation,
        SimulationMetrics,
    };

    pub use des_components::{
        allocate_servers, run_service_simulation, ComponentError, ConfigError, CountingMode,
        ResultRow, RunReport, ServiceConfig, Station,
    };
}
