//! Service stations.
//!
//! A station is a fixed service time plus a pool of identical servers. The
//! pool capacity is set once from the allocation and never changes.

use crate::builder::validate_sim_seconds;
use crate::error::ComponentError;
use des_core::{sim_sleep, ResourcePool, SimSleep, SimTime};

/// One service station
#[derive(Debug, Clone)]
pub struct Station {
    index: usize,
    service_secs: f64,
    service_time: SimTime,
    pool: ResourcePool,
}

impl Station {
    /// Create station number `index` (1-based) with `servers` servers.
    ///
    /// # Errors
    ///
    /// Fails if the service time is not a positive finite number of seconds,
    /// is out of range for [`SimTime`], rounds down to zero, or if `servers`
    /// is zero.
    pub fn new(index: usize, service_secs: f64, servers: usize) -> Result<Self, ComponentError> {
        let field = format!("durations[{}]", index.saturating_sub(1));
        let service_time = validate_sim_seconds(&field, service_secs)?;

        Ok(Self {
            index,
            service_secs,
            service_time,
            pool: ResourcePool::new(servers)?,
        })
    }

    /// 1-based station number
    pub fn index(&self) -> usize {
        self.index
    }

    /// Label used for logs and metric series
    pub fn name(&self) -> String {
        format!("station-{}", self.index)
    }

    pub fn service_time(&self) -> SimTime {
        self.service_time
    }

    /// Service time in seconds, exactly as configured
    pub fn service_secs(&self) -> f64 {
        self.service_secs
    }

    /// Number of servers at this station
    pub fn servers(&self) -> usize {
        self.pool.capacity()
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Hold the current customer for the station's service time.
    ///
    /// The caller must already hold one of the station's servers.
    pub fn serve(&self) -> SimSleep {
        sim_sleep(self.service_time.as_duration())
    }
}
