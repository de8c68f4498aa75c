//! Simulation time management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

use crate::error::SimError;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Simulation time with nanosecond precision
///
/// SimTime represents a point in simulation time, stored as nanoseconds since
/// the simulation start. It supports arithmetic operations and conversions
/// to/from standard Duration types and fractional seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// Create a new SimTime at the simulation start (time zero)
    pub const fn zero() -> Self {
        SimTime(0)
    }

    /// Create a SimTime from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        SimTime(nanos)
    }

    /// Create a SimTime from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis * 1_000_000)
    }

    /// Create a SimTime from seconds
    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs * 1_000_000_000)
    }

    /// Create a SimTime from a Duration
    pub fn from_duration(duration: Duration) -> Self {
        SimTime(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    /// Create a SimTime from fractional seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTime`] if `secs` is negative, NaN, infinite,
    /// or too large to be represented in nanoseconds.
    ///
    /// # Examples
    /// ```
    /// # use des_core::SimTime;
    /// let time = SimTime::try_from_secs_f64(1.5).unwrap();
    /// assert_eq!(time.as_nanos(), 1_500_000_000);
    /// ```
    pub fn try_from_secs_f64(secs: f64) -> Result<Self, SimError> {
        if !secs.is_finite() {
            return Err(SimError::InvalidTime(format!(
                "cannot create time from non-finite value: {secs}"
            )));
        }
        if secs < 0.0 {
            return Err(SimError::InvalidTime(format!(
                "time cannot be negative: {secs}"
            )));
        }

        const MAX_SECS: f64 = (u64::MAX as f64) / NANOS_PER_SEC;
        if secs >= MAX_SECS {
            return Err(SimError::InvalidTime(format!(
                "time value too large: {secs} seconds (max: {MAX_SECS} seconds)"
            )));
        }

        Ok(SimTime((secs * NANOS_PER_SEC).round() as u64))
    }

    /// Convert SimTime to a Duration
    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.0)
    }

    /// Get the raw nanosecond value
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Time as fractional seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    /// Calculate the duration since another SimTime, saturating at zero
    pub fn duration_since(&self, earlier: SimTime) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Add a duration to this SimTime
    pub fn add_duration(&self, duration: Duration) -> Self {
        self.saturating_add(SimTime::from_duration(duration))
    }

    fn saturating_add(self, other: SimTime) -> Self {
        SimTime(self.0.saturating_add(other.0))
    }
}

impl Add<SimTime> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> Self::Output {
        self.add_duration(rhs)
    }
}

impl Sub<SimTime> for SimTime {
    type Output = Duration;

    fn sub(self, rhs: SimTime) -> Self::Output {
        self.duration_since(rhs)
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::zero()
    }
}

impl TryFrom<f64> for SimTime {
    type Error = SimError;

    /// Convert from seconds (as f64) to SimTime
    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        SimTime::try_from_secs_f64(secs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self.as_duration();
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();
        let micros = duration.subsec_micros() % 1000;
        let nanos = duration.subsec_nanos() % 1000;

        if secs > 0 {
            write!(f, "{secs}.{millis:03}s")
        } else if millis > 0 {
            write!(f, "{millis}.{micros:03}ms")
        } else if micros > 0 {
            write!(f, "{micros}.{nanos:03}µs")
        } else {
            write!(f, "{nanos}ns")
        }
    }
}
