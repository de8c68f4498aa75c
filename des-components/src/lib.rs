//! Service-station components for the multi-station simulation
//!
//! This crate builds on `des-core` to model a line of service stations that
//! customers visit in order:
//!
//! - [`Station`]: a fixed service time and a FIFO pool of identical servers
//! - [`CustomerFlow`]: the process that walks the stations
//! - [`allocate_servers`]: proportional split of a server budget
//! - [`run_service_simulation`]: validates a [`ServiceConfig`], runs it and
//!   returns a [`RunReport`]
//!
//! ```rust
//! use des_components::{run_service_simulation, ServiceConfig};
//!
//! let config = ServiceConfig::builder()
//!     .durations([10.0])
//!     .total_servers(1)
//!     .target_count(3)
//!     .build()
//!     .unwrap();
//! let report = run_service_simulation(&config).unwrap();
//! assert_eq!(report.completed_at_secs, Some(30.0));
//! ```

pub mod allocation;
pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod flow;
pub mod station;

pub use allocation::allocate_servers;
pub use builder::{
    validate_finite_positive, validate_non_empty, validate_positive, validate_sim_seconds,
    Validate, ValidationResult,
};
pub use config::{
    ServiceConfig, ServiceConfigBuilder, DEFAULT_DURATIONS, DEFAULT_HORIZON_SECS,
    DEFAULT_TARGET_COUNT, DEFAULT_TOTAL_SERVERS,
};
pub use driver::{result_rows, run_service_simulation, ResultRow, RunReport, StationStats};
pub use error::{ComponentError, ConfigError};
pub use flow::{CountingMode, CustomerFlow, FlowState, SERVICES_COMPLETED, WAIT_SECONDS};
pub use station::Station;
