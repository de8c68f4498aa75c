//! Metrics collection for discrete event simulation
//!
//! [`SimulationMetrics`] keeps per-component totals for counters and
//! histograms so a run can report them afterwards, and forwards every record
//! to the `metrics` crate facade. Without an installed recorder the facade
//! calls are no-ops.

use crate::SimTime;
use ::metrics::{counter, histogram};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

type MetricKey = (String, String);

/// Running total of one counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSummary {
    pub total: u64,
    /// Simulation time of the most recent increment
    pub last_incremented: SimTime,
}

/// Aggregate of all values recorded into one histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    /// Simulation time of the most recent record
    pub last_recorded: SimTime,
}

impl HistogramSummary {
    fn record(&mut self, value: f64, timestamp: SimTime) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.last_recorded = timestamp;
    }

    /// Arithmetic mean, or 0 when nothing was recorded.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Simulation-specific metrics recorder that tracks values for analysis
#[derive(Debug, Default)]
pub struct SimulationMetrics {
    counters: BTreeMap<MetricKey, CounterSummary>,
    histograms: BTreeMap<MetricKey, HistogramSummary>,
}

impl SimulationMetrics {
    /// Create a new simulation metrics recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a counter increment
    pub fn increment_counter(
        &mut self,
        name: impl Into<String>,
        component: impl Into<String>,
        timestamp: SimTime,
    ) {
        self.increment_counter_by(name, component, 1, timestamp);
    }

    /// Record a counter increment with a specific value
    pub fn increment_counter_by(
        &mut self,
        name: impl Into<String>,
        component: impl Into<String>,
        value: u64,
        timestamp: SimTime,
    ) {
        let name_str = name.into();
        let component_str = component.into();

        counter!(name_str.clone(), "component" => component_str.clone()).increment(value);

        let summary = self.counters.entry((name_str, component_str)).or_default();
        summary.total += value;
        summary.last_incremented = timestamp;
    }

    /// Record a histogram value (typically for latencies, processing times, etc.)
    pub fn record_histogram(
        &mut self,
        name: impl Into<String>,
        component: impl Into<String>,
        value: f64,
        timestamp: SimTime,
    ) {
        let name_str = name.into();
        let component_str = component.into();

        histogram!(name_str.clone(), "component" => component_str.clone()).record(value);

        self.histograms
            .entry((name_str, component_str))
            .or_default()
            .record(value, timestamp);
    }

    /// Record a duration as a histogram, in seconds
    pub fn record_duration(
        &mut self,
        name: impl Into<String>,
        component: impl Into<String>,
        duration: Duration,
        timestamp: SimTime,
    ) {
        self.record_histogram(name, component, duration.as_secs_f64(), timestamp);
    }

    /// Total of a counter for one component (0 if never incremented)
    #[must_use]
    pub fn counter_total(&self, name: &str, component: &str) -> u64 {
        self.counter(name, component).map_or(0, |summary| summary.total)
    }

    /// Summary of a counter for one component
    #[must_use]
    pub fn counter(&self, name: &str, component: &str) -> Option<&CounterSummary> {
        self.counters.get(&(name.to_string(), component.to_string()))
    }

    /// Summary of a histogram for one component
    #[must_use]
    pub fn histogram(&self, name: &str, component: &str) -> Option<&HistogramSummary> {
        self.histograms.get(&(name.to_string(), component.to_string()))
    }
}
